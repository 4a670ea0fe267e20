//! Audit event storage and retrieval.
//!
//! Events track all mutations in the database for debugging and history.

use rusqlite::{Connection, Result};
use serde::Serialize;

/// Event types for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PersonCreated,
    PersonRemoved,
    GeocacheCreated,
    GeocacheRemoved,
    FoundAdded,
    FoundRemoved,
    StoreCleared,
}

impl EventType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PersonCreated => "person_created",
            Self::PersonRemoved => "person_removed",
            Self::GeocacheCreated => "geocache_created",
            Self::GeocacheRemoved => "geocache_removed",
            Self::FoundAdded => "found_added",
            Self::FoundRemoved => "found_removed",
            Self::StoreCleared => "store_cleared",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "person_created" => Some(Self::PersonCreated),
            "person_removed" => Some(Self::PersonRemoved),
            "geocache_created" => Some(Self::GeocacheCreated),
            "geocache_removed" => Some(Self::GeocacheRemoved),
            "found_added" => Some(Self::FoundAdded),
            "found_removed" => Some(Self::FoundRemoved),
            "store_cleared" => Some(Self::StoreCleared),
            _ => None,
        }
    }
}

/// An audit event record.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: String,
    pub event_type: EventType,
    pub actor: String,
    pub comment: Option<String>,
    pub created_at: i64,
}

impl Event {
    /// Create a new event (id will be assigned by database).
    #[must_use]
    pub fn new(entity_type: &str, entity_id: &str, event_type: EventType, actor: &str) -> Self {
        Self {
            id: 0,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            event_type,
            actor: actor.to_string(),
            comment: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Add a comment to the event.
    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// Insert an event into the database.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &Connection, event: &Event) -> Result<i64> {
    conn.execute(
        "INSERT INTO events (entity_type, entity_id, event_type, actor, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            event.entity_type,
            event.entity_id,
            event.event_type.as_str(),
            event.actor,
            event.comment,
            event.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get the most recent events, newest first.
///
/// Rows with an unknown event type (written by a newer version) are skipped.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_events(conn: &Connection, limit: Option<u32>) -> Result<Vec<Event>> {
    let limit = limit.unwrap_or(50);
    let mut stmt = conn.prepare(
        "SELECT id, entity_type, entity_id, event_type, actor, comment, created_at
         FROM events
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], |row| {
        let Some(event_type) = EventType::parse(row.get::<_, String>(3)?.as_str()) else {
            return Ok(None);
        };
        Ok(Some(Event {
            id: row.get(0)?,
            entity_type: row.get(1)?,
            entity_id: row.get(2)?,
            event_type,
            actor: row.get(4)?,
            comment: row.get(5)?,
            created_at: row.get(6)?,
        }))
    })?;

    let mut events = Vec::new();
    for row in rows {
        if let Some(event) = row? {
            events.push(event);
        }
    }
    Ok(events)
}
