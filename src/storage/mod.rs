//! Storage layer for the geocaching map.
//!
//! The engine reaches persistence only through the [`Store`] trait. The
//! shipped implementation is [`SqliteStorage`], which adds:
//! - Transaction discipline for atomic writes
//! - Cascading deletes for found relations
//! - Audit events for history
//!
//! # Submodules
//!
//! - [`events`] - Audit event storage
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main SQLite storage implementation

pub mod events;
pub mod schema;
pub mod sqlite;

pub use sqlite::{MutationContext, SqliteStorage};

use crate::error::Result;
use crate::model::{
    FoundRelation, Geocache, GeocacheId, Location, Person, PersonForm, PersonId,
};

/// Record access for persons, geocaches and found relations.
///
/// Every mutation validates its input and commits on its own, unless the
/// caller has opened an explicit transaction with [`Store::begin`]; then
/// nothing is durable until [`Store::commit`].
pub trait Store {
    /// All persons in store order (ascending id).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_persons(&self) -> Result<Vec<Person>>;

    /// All geocaches in store order (ascending id).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_geocaches(&self) -> Result<Vec<Geocache>>;

    /// All found relations ordered by person, then geocache.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_found(&self) -> Result<Vec<FoundRelation>>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_person(&self, id: PersonId) -> Result<Option<Person>>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_geocache(&self, id: GeocacheId) -> Result<Option<Geocache>>;

    /// Create a person at `location`; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for bad fields, or a database error.
    fn add_person(&mut self, form: &PersonForm, location: Location) -> Result<Person>;

    /// Insert a geocache with its caller-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for bad fields or a taken id,
    /// `Error::PersonNotFound` for an unknown owner, or a database error.
    fn add_geocache(&mut self, geocache: &Geocache) -> Result<()>;

    /// Record that a person found a geocache.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyFound` for a duplicate pair, a not-found error
    /// for unknown ids, or a database error.
    fn add_found(&mut self, relation: FoundRelation) -> Result<()>;

    /// Remove a found relation. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn remove_found(&mut self, relation: FoundRelation) -> Result<bool>;

    /// Remove a person and their found relations; their geocaches lose the
    /// owner. Returns `false` if the person did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn remove_person(&mut self, id: PersonId) -> Result<bool>;

    /// Remove a geocache and its found relations. Returns `false` if the
    /// geocache did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn remove_geocache(&mut self, id: GeocacheId) -> Result<bool>;

    /// Remove every person, geocache and found relation.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn clear_all(&mut self) -> Result<()>;

    /// Open a transaction spanning several mutations.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is already open.
    fn begin(&mut self) -> Result<()>;

    /// Make everything since [`Store::begin`] durable.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open or the commit fails.
    fn commit(&mut self) -> Result<()>;

    /// Discard everything since [`Store::begin`].
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open.
    fn rollback(&mut self) -> Result<()>;
}
