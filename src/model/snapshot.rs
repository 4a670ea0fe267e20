//! In-memory relational model for one render pass.
//!
//! A [`Snapshot`] holds every person, geocache and found relation read from
//! the store, plus the lookups the renderer and the codec need. It is rebuilt
//! from the store after every mutation and never edited in place.

use serde::{Deserialize, Serialize};

use super::{FoundRelation, Geocache, GeocacheId, Person, PersonId};
use crate::error::Result;
use crate::storage::Store;

/// How new geocache ids are numbered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// `max(ids) + 1`, or 1 when there are none.
    #[default]
    Sequential,
    /// `max(ids, 1) + 1`: numbering starts at 2 on an empty map.
    Legacy,
}

impl std::str::FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("Unknown id scheme: {other} (expected sequential or legacy)")),
        }
    }
}

/// All records in the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    persons: Vec<Person>,
    geocaches: Vec<Geocache>,
    found: Vec<FoundRelation>,
}

impl Snapshot {
    #[must_use]
    pub fn new(persons: Vec<Person>, geocaches: Vec<Geocache>, found: Vec<FoundRelation>) -> Self {
        Self {
            persons,
            geocaches,
            found,
        }
    }

    /// Read all three collections from the store, in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the store queries fail.
    pub fn load<S: Store + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self {
            persons: store.list_persons()?,
            geocaches: store.list_geocaches()?,
            found: store.list_found()?,
        })
    }

    #[must_use]
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    #[must_use]
    pub fn geocaches(&self) -> &[Geocache] {
        &self.geocaches
    }

    #[must_use]
    pub fn found(&self) -> &[FoundRelation] {
        &self.found
    }

    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn geocache(&self, id: GeocacheId) -> Option<&Geocache> {
        self.geocaches.iter().find(|g| g.id == id)
    }

    /// Geocaches placed by `person`, in store order.
    pub fn owned_by(&self, person: PersonId) -> impl Iterator<Item = &Geocache> {
        self.geocaches
            .iter()
            .filter(move |g| g.owner == Some(person))
    }

    /// Found relations of `person`, in store order.
    pub fn found_by(&self, person: PersonId) -> impl Iterator<Item = &FoundRelation> {
        self.found.iter().filter(move |f| f.person_id == person)
    }

    #[must_use]
    pub fn is_found(&self, person: PersonId, geocache: GeocacheId) -> bool {
        self.found
            .iter()
            .any(|f| f.person_id == person && f.geocache_id == geocache)
    }

    /// Geocaches without an owner. They cannot be written to the text format.
    pub fn unowned(&self) -> impl Iterator<Item = &Geocache> {
        self.geocaches.iter().filter(|g| g.owner.is_none())
    }

    /// Id for the next geocache added on the map.
    #[must_use]
    pub fn next_geocache_id(&self, scheme: IdScheme) -> GeocacheId {
        let max = self.geocaches.iter().map(|g| g.id.0).max();
        let next = match scheme {
            IdScheme::Sequential => max.unwrap_or(0) + 1,
            IdScheme::Legacy => max.unwrap_or(1).max(1) + 1,
        };
        GeocacheId(next)
    }

    /// Tooltip for a geocache pin, naming the owner when there is one.
    #[must_use]
    pub fn geocache_tooltip(&self, geocache: &Geocache) -> String {
        let owner = geocache
            .owner
            .and_then(|id| self.person(id))
            .map(Person::full_name);
        geocache.tooltip(owner.as_deref())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.geocaches.is_empty() && self.found.is_empty()
    }
}
