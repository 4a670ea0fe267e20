//! Initialize the map database.
//!
//! Creates the database (schema is applied on open), a `config.json` with
//! default settings next to it, and clears any saved UI state.

use crate::config::{Settings, is_test_mode, resolve_db_path, settings_path, ui_state_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    config: PathBuf,
    test_mode: bool,
}

/// Remove a database file and its WAL side files.
fn remove_database(db_path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = db_path.as_os_str().to_owned();
        name.push(suffix);
        let path = PathBuf::from(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `Error::AlreadyInitialized` if the database exists and `force` is
/// not set, or an error if the files cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine the geocaching data directory".to_string())
    })?;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path: db_path });
        }
        remove_database(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Opening applies the schema
    SqliteStorage::open(&db_path)?;

    let config_path = settings_path(&db_path);
    if !config_path.exists() || force {
        let defaults = serde_json::to_string_pretty(&Settings::default())?;
        fs::write(&config_path, format!("{defaults}\n"))?;
    }

    let state_path = ui_state_path(&db_path);
    if state_path.exists() {
        fs::remove_file(&state_path)?;
    }

    if json {
        let output = InitOutput {
            database: db_path,
            config: config_path,
            test_mode: is_test_mode(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized geocaching map");
        println!("  Database: {}", db_path.display());
        println!("  Settings: {}", config_path.display());
        println!();
        println!("Next: click the map with 'geo click <lat> <lon>' and add a person.");
    }

    Ok(())
}
