//! Load and save command implementations.

use super::{open_map, print_json};
use crate::codec::{DEFAULT_FILE_NAME, ExportStats, ImportStats};
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct LoadOutput<'a> {
    file: &'a Path,
    #[serde(flatten)]
    stats: ImportStats,
}

#[derive(Serialize)]
struct SaveOutput<'a> {
    file: &'a Path,
    #[serde(flatten)]
    stats: ExportStats,
}

/// Replace the map with the contents of `file`.
///
/// # Errors
///
/// Returns a format, referential, IO or store error.
pub fn execute_load(
    file: &Path,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut ctx = open_map(db_path, actor)?;
    let result = ctx.session.load_file(file);
    // Loading clears the selection even when it fails
    ctx.save_state()?;
    let stats = result?;

    if json {
        return print_json(&LoadOutput { file, stats });
    }

    println!("Loaded {}", file.display());
    println!("  Persons:   {}", stats.persons);
    println!("  Geocaches: {}", stats.geocaches);
    println!("  Found:     {}", stats.found);
    Ok(())
}

/// Write the map to `file` (default `Geocaches.txt`).
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn execute_save(
    file: Option<&PathBuf>,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let ctx = open_map(db_path, None)?;
    let file = file.map_or_else(|| PathBuf::from(DEFAULT_FILE_NAME), Clone::clone);
    let stats = ctx.session.save_file(&file)?;

    if json {
        return print_json(&SaveOutput { file: &file, stats });
    }

    println!("Saved {}", file.display());
    println!("  Persons:   {}", stats.persons);
    println!("  Geocaches: {}", stats.geocaches);
    println!("  Found:     {}", stats.found);
    if stats.unowned_skipped > 0 {
        println!(
            "  Skipped {} geocache(s) without an owner",
            stats.unowned_skipped
        );
    }
    if stats.found_skipped > 0 {
        println!(
            "  Skipped {} found id(s) of those geocaches",
            stats.found_skipped
        );
    }
    Ok(())
}
