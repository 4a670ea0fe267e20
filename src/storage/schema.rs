//! Database schema definitions.
//!
//! This module contains the complete SQLite schema for the geocaching store.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the geocaching database.
///
/// Note: Person ids use AUTOINCREMENT so they are never reused, even after the
/// store is cleared by a file load. Geocache ids are assigned by the client.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Persons: people placed on the map
CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL CHECK (length(first_name) BETWEEN 1 AND 50),
    last_name TEXT NOT NULL CHECK (length(last_name) BETWEEN 1 AND 50),
    country TEXT NOT NULL CHECK (length(country) BETWEEN 1 AND 50),
    city TEXT NOT NULL CHECK (length(city) BETWEEN 1 AND 50),
    street_name TEXT NOT NULL CHECK (length(street_name) BETWEEN 1 AND 50),
    street_number INTEGER NOT NULL CHECK (street_number BETWEEN 0 AND 255),
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
);

-- Geocaches: client-assigned ids, optional owner
CREATE TABLE IF NOT EXISTS geocaches (
    id INTEGER PRIMARY KEY,
    person_id INTEGER,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    contents TEXT NOT NULL CHECK (length(contents) <= 255),
    message TEXT NOT NULL CHECK (length(message) BETWEEN 1 AND 255),
    FOREIGN KEY (person_id) REFERENCES persons(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_geocaches_person ON geocaches(person_id);

-- Found geocaches: one row per (person, geocache) pair
CREATE TABLE IF NOT EXISTS found_geocaches (
    person_id INTEGER NOT NULL,
    geocache_id INTEGER NOT NULL,
    PRIMARY KEY (person_id, geocache_id),
    FOREIGN KEY (person_id) REFERENCES persons(id) ON DELETE CASCADE,
    FOREIGN KEY (geocache_id) REFERENCES geocaches(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_found_geocaches_geocache ON found_geocaches(geocache_id);

-- ====================
-- Audit Events
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
";

/// Apply pragmas and the schema to a connection.
///
/// Safe to call on every open: all statements are idempotent.
///
/// # Errors
///
/// Returns an error if a pragma or DDL statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // Set pragmas before schema creation
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"persons".to_string()));
        assert!(tables.contains(&"geocaches".to_string()));
        assert!(tables.contains(&"found_geocaches".to_string()));
        assert!(tables.contains(&"events".to_string()));
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn test_street_number_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let insert = |number: i64| {
            conn.execute(
                "INSERT INTO persons (first_name, last_name, country, city, street_name, street_number, latitude, longitude)
                 VALUES ('A', 'B', 'SE', 'Gbg', 'Main', ?1, 0, 0)",
                [number],
            )
        };

        assert!(insert(255).is_ok());
        assert!(insert(256).is_err());
    }

    #[test]
    fn test_found_cascade_on_geocache_delete() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO persons (id, first_name, last_name, country, city, street_name, street_number, latitude, longitude)
             VALUES (1, 'A', 'B', 'SE', 'Gbg', 'Main', 1, 0, 0);
             INSERT INTO geocaches (id, person_id, latitude, longitude, contents, message)
             VALUES (2, NULL, 0, 0, '', 'hi');
             INSERT INTO found_geocaches (person_id, geocache_id) VALUES (1, 2);
             DELETE FROM geocaches WHERE id = 2;",
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM found_geocaches", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
