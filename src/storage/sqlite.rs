//! SQLite storage implementation.
//!
//! This module provides the main storage backend using SQLite.
//! It follows the MutationContext pattern for transaction discipline and audit logging.

use crate::error::{Error, Result};
use crate::model::{
    FoundRelation, Geocache, GeocacheId, Location, Person, PersonForm, PersonId,
};
use crate::storage::Store;
use crate::storage::events::{Event, EventType, insert_event, recent_events};
use crate::storage::schema::apply_schema;
use crate::validate::{validate_geocache, validate_person};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const PERSON_COLUMNS: &str =
    "id, first_name, last_name, country, city, street_name, street_number, latitude, longitude";

const GEOCACHE_COLUMNS: &str = "id, person_id, latitude, longitude, contents, message";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    actor: String,
}

/// Context for a mutation operation, tracking side effects.
///
/// Passed to mutation closures so they can record audit events, which are
/// written in the same savepoint as the mutation itself.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the savepoint.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events
            .push(Event::new(entity_type, entity_id, event_type, &self.actor));
    }

    /// Record an event with a free-text comment.
    pub fn record_comment(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        comment: &str,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor).with_comment(comment),
        );
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: PersonId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        country: row.get(3)?,
        city: row.get(4)?,
        street_name: row.get(5)?,
        street_number: row.get(6)?,
        location: Location::new(row.get(7)?, row.get(8)?),
    })
}

fn geocache_from_row(row: &Row<'_>) -> rusqlite::Result<Geocache> {
    Ok(Geocache {
        id: GeocacheId(row.get(0)?),
        owner: row.get::<_, Option<i64>>(1)?.map(PersonId),
        location: Location::new(row.get(2)?, row.get(3)?),
        contents: row.get(4)?,
        message: row.get(5)?,
    })
}

fn person_exists(conn: &Connection, id: PersonId) -> rusqlite::Result<bool> {
    conn.prepare_cached("SELECT 1 FROM persons WHERE id = ?1")?
        .exists([id.0])
}

fn geocache_exists(conn: &Connection, id: GeocacheId) -> rusqlite::Result<bool> {
    conn.prepare_cached("SELECT 1 FROM geocaches WHERE id = ?1")?
        .exists([id.0])
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened geocaching database");
        Ok(Self {
            conn,
            actor: "unknown".to_string(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: "test".to_string(),
        })
    }

    /// Set the actor recorded on audit events.
    #[must_use]
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Opens a savepoint (nests inside an explicit transaction)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Releases the savepoint (or rolls it back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The savepoint is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Connection, &mut MutationContext) -> Result<R>,
    {
        let sp = self.conn.savepoint()?;
        let mut ctx = MutationContext::new(op, &self.actor);

        let result = f(&*sp, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&sp, event)?;
        }

        sp.commit()?;
        debug!(op, events = ctx.events.len(), "Mutation committed");

        Ok(result)
    }

    /// Most recent audit events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_events(&self, limit: Option<u32>) -> Result<Vec<Event>> {
        Ok(recent_events(&self.conn, limit)?)
    }

    /// Whether an explicit transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

impl Store for SqliteStorage {
    fn list_persons(&self) -> Result<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY id"))?;
        let rows = stmt.query_map([], person_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_geocaches(&self) -> Result<Vec<Geocache>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {GEOCACHE_COLUMNS} FROM geocaches ORDER BY id"))?;
        let rows = stmt.query_map([], geocache_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_found(&self) -> Result<Vec<FoundRelation>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_id, geocache_id FROM found_geocaches ORDER BY person_id, geocache_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FoundRelation::new(
                PersonId(row.get(0)?),
                GeocacheId(row.get(1)?),
            ))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
        let person = self
            .conn
            .query_row(
                &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
                [id.0],
                person_from_row,
            )
            .optional()?;
        Ok(person)
    }

    fn get_geocache(&self, id: GeocacheId) -> Result<Option<Geocache>> {
        let geocache = self
            .conn
            .query_row(
                &format!("SELECT {GEOCACHE_COLUMNS} FROM geocaches WHERE id = ?1"),
                [id.0],
                geocache_from_row,
            )
            .optional()?;
        Ok(geocache)
    }

    fn add_person(&mut self, form: &PersonForm, location: Location) -> Result<Person> {
        validate_person(form, &location)?;

        let person = self.mutate("add_person", |tx, ctx| {
            tx.execute(
                "INSERT INTO persons (first_name, last_name, country, city, street_name, street_number, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    form.first_name,
                    form.last_name,
                    form.country,
                    form.city,
                    form.street_name,
                    form.street_number,
                    location.latitude,
                    location.longitude,
                ],
            )?;

            let person = Person {
                id: PersonId(tx.last_insert_rowid()),
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                country: form.country.clone(),
                city: form.city.clone(),
                street_name: form.street_name.clone(),
                street_number: form.street_number,
                location,
            };

            ctx.record_comment(
                "person",
                &person.id.to_string(),
                EventType::PersonCreated,
                &person.full_name(),
            );
            Ok(person)
        })?;

        info!(id = %person.id, name = %person.full_name(), "Person added");
        Ok(person)
    }

    fn add_geocache(&mut self, geocache: &Geocache) -> Result<()> {
        validate_geocache(geocache)?;

        self.mutate("add_geocache", |tx, ctx| {
            if geocache_exists(tx, geocache.id)? {
                return Err(Error::Validation {
                    field: "id",
                    message: format!("geocache {} already exists", geocache.id),
                });
            }
            if let Some(owner) = geocache.owner {
                if !person_exists(tx, owner)? {
                    return Err(Error::PersonNotFound { id: owner });
                }
            }

            tx.execute(
                "INSERT INTO geocaches (id, person_id, latitude, longitude, contents, message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    geocache.id.0,
                    geocache.owner.map(|p| p.0),
                    geocache.location.latitude,
                    geocache.location.longitude,
                    geocache.contents,
                    geocache.message,
                ],
            )?;

            ctx.record_event("geocache", &geocache.id.to_string(), EventType::GeocacheCreated);
            Ok(())
        })?;

        info!(id = %geocache.id, owner = ?geocache.owner, "Geocache added");
        Ok(())
    }

    fn add_found(&mut self, relation: FoundRelation) -> Result<()> {
        self.mutate("add_found", |tx, ctx| {
            if !person_exists(tx, relation.person_id)? {
                return Err(Error::PersonNotFound {
                    id: relation.person_id,
                });
            }
            if !geocache_exists(tx, relation.geocache_id)? {
                return Err(Error::GeocacheNotFound {
                    id: relation.geocache_id,
                });
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO found_geocaches (person_id, geocache_id) VALUES (?1, ?2)",
                rusqlite::params![relation.person_id.0, relation.geocache_id.0],
            )?;
            if inserted == 0 {
                return Err(Error::AlreadyFound {
                    person_id: relation.person_id,
                    geocache_id: relation.geocache_id,
                });
            }

            ctx.record_comment(
                "geocache",
                &relation.geocache_id.to_string(),
                EventType::FoundAdded,
                &format!("found by person {}", relation.person_id),
            );
            Ok(())
        })?;

        info!(person = %relation.person_id, geocache = %relation.geocache_id, "Geocache found");
        Ok(())
    }

    fn remove_found(&mut self, relation: FoundRelation) -> Result<bool> {
        self.mutate("remove_found", |tx, ctx| {
            let removed = tx.execute(
                "DELETE FROM found_geocaches WHERE person_id = ?1 AND geocache_id = ?2",
                rusqlite::params![relation.person_id.0, relation.geocache_id.0],
            )?;

            if removed > 0 {
                ctx.record_comment(
                    "geocache",
                    &relation.geocache_id.to_string(),
                    EventType::FoundRemoved,
                    &format!("un-found by person {}", relation.person_id),
                );
            }
            Ok(removed > 0)
        })
    }

    fn remove_person(&mut self, id: PersonId) -> Result<bool> {
        self.mutate("remove_person", |tx, ctx| {
            let removed = tx.execute("DELETE FROM persons WHERE id = ?1", [id.0])?;
            if removed > 0 {
                ctx.record_event("person", &id.to_string(), EventType::PersonRemoved);
            }
            Ok(removed > 0)
        })
    }

    fn remove_geocache(&mut self, id: GeocacheId) -> Result<bool> {
        self.mutate("remove_geocache", |tx, ctx| {
            let removed = tx.execute("DELETE FROM geocaches WHERE id = ?1", [id.0])?;
            if removed > 0 {
                ctx.record_event("geocache", &id.to_string(), EventType::GeocacheRemoved);
            }
            Ok(removed > 0)
        })
    }

    fn clear_all(&mut self) -> Result<()> {
        self.mutate("clear_all", |tx, ctx| {
            tx.execute_batch(
                "DELETE FROM found_geocaches;
                 DELETE FROM geocaches;
                 DELETE FROM persons;",
            )?;
            ctx.record_event("store", "*", EventType::StoreCleared);
            Ok(())
        })?;

        info!("Store cleared");
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(Error::Other("A transaction is already open".to_string()));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PersonForm {
        PersonForm {
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            country: "SE".to_string(),
            city: "Gothenburg".to_string(),
            street_name: "MainSt".to_string(),
            street_number: 5,
        }
    }

    fn cache(id: i64, owner: Option<PersonId>) -> Geocache {
        Geocache {
            id: GeocacheId(id),
            owner,
            location: Location::new(57.71, 11.98),
            contents: "key".to_string(),
            message: "hi".to_string(),
        }
    }

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_person_crud() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let person = storage
            .add_person(&alice(), Location::new(57.70, 11.97))
            .unwrap();
        assert_eq!(person.first_name, "Alice");

        let fetched = storage.get_person(person.id).unwrap().unwrap();
        assert_eq!(fetched, person);
        assert_eq!(storage.list_persons().unwrap().len(), 1);

        assert!(storage.remove_person(person.id).unwrap());
        assert!(!storage.remove_person(person.id).unwrap());
        assert!(storage.get_person(person.id).unwrap().is_none());
    }

    #[test]
    fn test_add_person_rejects_invalid_fields() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut form = alice();
        form.first_name = String::new();

        let err = storage
            .add_person(&form, Location::new(57.70, 11.97))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "first_name", .. }));
        assert!(storage.list_persons().unwrap().is_empty());
    }

    #[test]
    fn test_person_ids_not_reused_after_clear() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let first = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();
        storage.clear_all().unwrap();
        let second = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_geocache_owner_and_duplicate_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let owner = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();

        storage.add_geocache(&cache(2, Some(owner.id))).unwrap();
        storage.add_geocache(&cache(3, None)).unwrap();

        let err = storage.add_geocache(&cache(2, None)).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "id", .. }));

        let err = storage.add_geocache(&cache(4, Some(PersonId(99)))).unwrap_err();
        assert!(matches!(err, Error::PersonNotFound { .. }));

        let caches = storage.list_geocaches().unwrap();
        assert_eq!(caches.len(), 2);
        assert_eq!(caches[0].owner, Some(owner.id));
        assert_eq!(caches[1].owner, None);
    }

    #[test]
    fn test_found_relation_unique() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let finder = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();
        storage.add_geocache(&cache(2, None)).unwrap();

        let relation = FoundRelation::new(finder.id, GeocacheId(2));
        storage.add_found(relation).unwrap();

        let err = storage.add_found(relation).unwrap_err();
        assert!(matches!(err, Error::AlreadyFound { .. }));
        assert_eq!(storage.list_found().unwrap(), vec![relation]);

        assert!(storage.remove_found(relation).unwrap());
        assert!(!storage.remove_found(relation).unwrap());
    }

    #[test]
    fn test_remove_person_cascades() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let owner = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();
        let finder = storage.add_person(&alice(), Location::new(1.0, 1.0)).unwrap();
        storage.add_geocache(&cache(2, Some(owner.id))).unwrap();
        storage
            .add_found(FoundRelation::new(finder.id, GeocacheId(2)))
            .unwrap();

        storage.remove_person(owner.id).unwrap();
        let geocache = storage.get_geocache(GeocacheId(2)).unwrap().unwrap();
        assert_eq!(geocache.owner, None);
        assert_eq!(storage.list_found().unwrap().len(), 1);

        storage.remove_person(finder.id).unwrap();
        assert!(storage.list_found().unwrap().is_empty());
    }

    #[test]
    fn test_remove_geocache_cascades() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let finder = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();
        storage.add_geocache(&cache(2, None)).unwrap();
        storage
            .add_found(FoundRelation::new(finder.id, GeocacheId(2)))
            .unwrap();

        assert!(storage.remove_geocache(GeocacheId(2)).unwrap());
        assert!(storage.list_found().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_transaction_rollback() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();

        storage.begin().unwrap();
        assert!(storage.in_transaction());
        assert!(storage.begin().is_err());
        storage.clear_all().unwrap();
        storage.add_geocache(&cache(2, None)).unwrap();
        storage.rollback().unwrap();

        assert_eq!(storage.list_persons().unwrap().len(), 1);
        assert!(storage.list_geocaches().unwrap().is_empty());
    }

    #[test]
    fn test_failed_mutation_inside_transaction_keeps_earlier_work() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        storage.begin().unwrap();
        storage.add_geocache(&cache(2, None)).unwrap();
        assert!(storage.add_geocache(&cache(2, None)).is_err());
        storage.commit().unwrap();

        assert_eq!(storage.list_geocaches().unwrap().len(), 1);
    }

    #[test]
    fn test_mutations_record_events() {
        let mut storage = SqliteStorage::open_memory().unwrap().with_actor("tester");
        let person = storage.add_person(&alice(), Location::new(0.0, 0.0)).unwrap();
        storage.add_geocache(&cache(2, None)).unwrap();
        storage
            .add_found(FoundRelation::new(person.id, GeocacheId(2)))
            .unwrap();

        let events = storage.list_events(None).unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                EventType::FoundAdded,
                EventType::GeocacheCreated,
                EventType::PersonCreated
            ]
        );
        assert!(events.iter().all(|e| e.actor == "tester"));
    }
}
