//! History command implementation.

use super::{existing_db_path, print_json};
use crate::error::Result;
use crate::storage::SqliteStorage;
use crate::storage::events::Event;
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct HistoryOutput {
    events: Vec<Event>,
    count: usize,
}

fn format_time(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| millis.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Show the most recent audit events.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn execute(limit: u32, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let db_path = existing_db_path(db_path)?;
    let storage = SqliteStorage::open(&db_path)?;
    let events = storage.list_events(Some(limit))?;

    if json {
        let output = HistoryOutput {
            count: events.len(),
            events,
        };
        return print_json(&output);
    }

    if events.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    for event in &events {
        let comment = event
            .comment
            .as_deref()
            .map(|c| format!(" - {c}"))
            .unwrap_or_default();
        println!(
            "{}  {:<16} {} {}{}  ({})",
            format_time(event.created_at),
            event.event_type.as_str(),
            event.entity_type,
            event.entity_id,
            comment,
            event.actor
        );
    }

    Ok(())
}
