//! Status command implementation.

use super::{coords, open_map, print_json};
use crate::error::Result;
use crate::model::Location;
use crate::selection::Selection;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    database: PathBuf,
    selection: Selection,
    active_person: Option<String>,
    latest_click: Option<Location>,
    persons: usize,
    geocaches: usize,
    found: usize,
    markers: usize,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let ctx = open_map(db_path, None)?;
    let map = &ctx.session;
    let snapshot = map.snapshot();

    let active_person = map
        .selection()
        .active()
        .and_then(|id| snapshot.person(id))
        .map(crate::model::Person::full_name);

    // Reconciliation may have dropped a stale selection
    ctx.save_state()?;

    if json {
        let output = StatusOutput {
            database: ctx.db_path.clone(),
            selection: map.selection(),
            active_person,
            latest_click: map.latest_click(),
            persons: snapshot.persons().len(),
            geocaches: snapshot.geocaches().len(),
            found: snapshot.found().len(),
            markers: map.markers().len(),
        };
        return print_json(&output);
    }

    println!("{}", "Geocaching Map Status".bold());
    println!("=====================");
    println!();
    println!("Database: {}", ctx.db_path.display());
    println!();

    match (map.selection().active(), active_person) {
        (Some(id), Some(name)) => println!("Active person: {} (#{id})", name.cyan().bold()),
        _ => println!("Active person: {}", "none".dimmed()),
    }
    match map.latest_click() {
        Some(location) => println!("Latest click:  {}", coords(&location)),
        None => println!("Latest click:  {}", "none".dimmed()),
    }
    println!();
    println!("Persons:   {}", snapshot.persons().len());
    println!("Geocaches: {}", snapshot.geocaches().len());
    println!("Found:     {}", snapshot.found().len());

    if snapshot.is_empty() {
        println!();
        println!("The map is empty. Start with: geo click <lat> <lon> && geo person add ...");
    }

    Ok(())
}
