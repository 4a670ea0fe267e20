//! Found relations between people and geocaches.

use serde::{Deserialize, Serialize};

use super::{GeocacheId, PersonId};

/// A record asserting that a person has found a geocache.
///
/// The pair is the identity: a person finds a given geocache at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoundRelation {
    pub person_id: PersonId,
    pub geocache_id: GeocacheId,
}

impl FoundRelation {
    #[must_use]
    pub const fn new(person_id: PersonId, geocache_id: GeocacheId) -> Self {
        Self {
            person_id,
            geocache_id,
        }
    }
}
