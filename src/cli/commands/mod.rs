//! Command implementations.

pub mod completions;
pub mod file;
pub mod geocache;
pub mod history;
pub mod init;
pub mod map;
pub mod person;
pub mod status;
pub mod version;

use crate::config::{Settings, UiState, default_actor, resolve_db_path, ui_state_path};
use crate::error::{Error, Result};
use crate::map::MapSession;
use crate::storage::SqliteStorage;
use std::path::PathBuf;

/// A map session opened for one command, plus where its state lives.
pub struct MapContext {
    pub db_path: PathBuf,
    pub session: MapSession<SqliteStorage>,
}

impl MapContext {
    /// Persist the selection and latest click for the next command.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn save_state(&self) -> Result<()> {
        self.session.state().write(&ui_state_path(&self.db_path))
    }
}

/// Resolve the database path and require that it exists.
///
/// # Errors
///
/// Returns `Error::NotInitialized` if there is no database yet.
pub fn existing_db_path(db_path: Option<&PathBuf>) -> Result<PathBuf> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }
    Ok(db_path)
}

/// Open the database, settings and saved UI state as a map session.
///
/// # Errors
///
/// Returns an error if the database is missing or cannot be opened, or the
/// settings are invalid.
pub fn open_map(db_path: Option<&PathBuf>, actor: Option<&str>) -> Result<MapContext> {
    let db_path = existing_db_path(db_path)?;
    let actor = actor.map(ToString::to_string).unwrap_or_else(default_actor);

    let storage = SqliteStorage::open(&db_path)?.with_actor(&actor);
    let settings = Settings::load(&db_path)?;
    let state = UiState::read(&ui_state_path(&db_path));

    let session = MapSession::with_state(storage, settings, state)?;
    Ok(MapContext { db_path, session })
}

/// Format a coordinate pair for display.
pub(crate) fn coords(location: &crate::model::Location) -> String {
    format!("{}, {}", location.latitude, location.longitude)
}

/// Print a JSON payload on one line.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
