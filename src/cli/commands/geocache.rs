//! Geocache command implementations.

use super::{coords, open_map, print_json};
use crate::cli::GeocacheCommands;
use crate::error::Result;
use crate::model::{Geocache, GeocacheForm, GeocacheId};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct GeocacheListOutput<'a> {
    geocaches: Vec<GeocacheItem<'a>>,
    count: usize,
}

#[derive(Serialize)]
struct GeocacheItem<'a> {
    #[serde(flatten)]
    geocache: &'a Geocache,
    owner_name: Option<String>,
    found_by: usize,
}

/// Execute geocache commands.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn execute(
    command: &GeocacheCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        GeocacheCommands::Add { message, contents } => {
            add(message, contents, db_path, actor, json)
        }
        GeocacheCommands::List => list(db_path, json),
        GeocacheCommands::Remove { id } => remove(GeocacheId(*id), db_path, actor, json),
    }
}

fn add(
    message: &str,
    contents: &str,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let form = GeocacheForm {
        contents: contents.trim().to_string(),
        message: message.trim().to_string(),
    };

    let mut ctx = open_map(db_path, actor)?;
    let geocache = ctx.session.add_geocache(&form)?;
    ctx.save_state()?;

    if json {
        return print_json(&geocache);
    }

    println!(
        "Added geocache #{} at {}",
        geocache.id,
        coords(&geocache.location)
    );
    Ok(())
}

fn list(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let ctx = open_map(db_path, None)?;
    let snapshot = ctx.session.snapshot();

    let owner_name = |geocache: &Geocache| {
        geocache
            .owner
            .and_then(|id| snapshot.person(id))
            .map(crate::model::Person::full_name)
    };
    let found_by = |geocache: &Geocache| {
        snapshot
            .found()
            .iter()
            .filter(|f| f.geocache_id == geocache.id)
            .count()
    };

    if json {
        let geocaches: Vec<GeocacheItem<'_>> = snapshot
            .geocaches()
            .iter()
            .map(|geocache| GeocacheItem {
                geocache,
                owner_name: owner_name(geocache),
                found_by: found_by(geocache),
            })
            .collect();
        let output = GeocacheListOutput {
            count: geocaches.len(),
            geocaches,
        };
        return print_json(&output);
    }

    if snapshot.geocaches().is_empty() {
        println!("No geocaches on the map.");
        return Ok(());
    }

    println!("Geocaches ({} found):", snapshot.geocaches().len());
    println!();
    for geocache in snapshot.geocaches() {
        let owner = owner_name(geocache).unwrap_or_else(|| "no owner".to_string());
        println!("#{} {} [{}]", geocache.id, geocache.message, owner);
        if !geocache.contents.is_empty() {
            println!("  contents: {}", geocache.contents);
        }
        println!(
            "  {}  found by {}",
            coords(&geocache.location),
            found_by(geocache)
        );
    }

    Ok(())
}

fn remove(
    id: GeocacheId,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut ctx = open_map(db_path, actor)?;
    ctx.session.remove_geocache(id)?;
    ctx.save_state()?;

    if json {
        let output = serde_json::json!({
            "id": id,
            "removed": true
        });
        println!("{output}");
    } else {
        println!("Removed geocache #{id}");
    }

    Ok(())
}
