//! Person command implementations.

use super::{coords, open_map, print_json};
use crate::cli::{PersonAddArgs, PersonCommands};
use crate::error::Result;
use crate::model::{Person, PersonForm, PersonId};
use crate::validate::parse_street_number;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct PersonListOutput<'a> {
    persons: Vec<PersonItem<'a>>,
    count: usize,
}

#[derive(Serialize)]
struct PersonItem<'a> {
    #[serde(flatten)]
    person: &'a Person,
    owned: usize,
    found: usize,
    active: bool,
}

/// Execute person commands.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn execute(
    command: &PersonCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        PersonCommands::Add(args) => add(args, db_path, actor, json),
        PersonCommands::List => list(db_path, json),
        PersonCommands::Select { id } => select(PersonId(*id), db_path, json),
        PersonCommands::Remove { id } => remove(PersonId(*id), db_path, actor, json),
    }
}

fn add(args: &PersonAddArgs, db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    let form = PersonForm {
        first_name: args.first_name.trim().to_string(),
        last_name: args.last_name.trim().to_string(),
        country: args.country.trim().to_string(),
        city: args.city.trim().to_string(),
        street_name: args.street.trim().to_string(),
        street_number: parse_street_number(&args.number)?,
    };

    let mut ctx = open_map(db_path, actor)?;
    let person = ctx.session.add_person(&form)?;
    ctx.save_state()?;

    if json {
        return print_json(&person);
    }

    println!(
        "Added person {} (#{}) at {}",
        person.full_name().bold(),
        person.id,
        coords(&person.location)
    );
    Ok(())
}

fn list(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let ctx = open_map(db_path, None)?;
    let map = &ctx.session;
    let snapshot = map.snapshot();
    let active = map.selection().active();

    if json {
        let persons: Vec<PersonItem<'_>> = snapshot
            .persons()
            .iter()
            .map(|person| PersonItem {
                person,
                owned: snapshot.owned_by(person.id).count(),
                found: snapshot.found_by(person.id).count(),
                active: active == Some(person.id),
            })
            .collect();
        let output = PersonListOutput {
            count: persons.len(),
            persons,
        };
        return print_json(&output);
    }

    if snapshot.persons().is_empty() {
        println!("No persons on the map.");
        return Ok(());
    }

    println!("Persons ({} found):", snapshot.persons().len());
    println!();
    for person in snapshot.persons() {
        let marker = if active == Some(person.id) { "●" } else { "○" };
        println!(
            "{marker} #{} {} - {} {}, {}, {}",
            person.id,
            person.full_name().bold(),
            person.street_name,
            person.street_number,
            person.city,
            person.country
        );
        println!(
            "  {}  owns {}  found {}",
            coords(&person.location),
            snapshot.owned_by(person.id).count(),
            snapshot.found_by(person.id).count()
        );
    }

    Ok(())
}

fn select(id: PersonId, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut ctx = open_map(db_path, None)?;
    ctx.session.select_person(id)?;
    ctx.save_state()?;

    if json {
        return print_json(&ctx.session.selection());
    }

    println!("Selected person #{id}");
    Ok(())
}

fn remove(id: PersonId, db_path: Option<&PathBuf>, actor: Option<&str>, json: bool) -> Result<()> {
    let mut ctx = open_map(db_path, actor)?;
    ctx.session.remove_person(id)?;
    ctx.save_state()?;

    if json {
        let output = serde_json::json!({
            "id": id,
            "removed": true
        });
        println!("{output}");
    } else {
        println!("Removed person #{id}");
    }

    Ok(())
}
