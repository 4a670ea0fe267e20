//! Geocache model.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Location, PersonId};

/// Caller-assigned geocache identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocacheId(pub i64);

impl fmt::Display for GeocacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A geocache hidden somewhere on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geocache {
    /// Identifier chosen by the client, not generated by the store
    pub id: GeocacheId,

    /// Person who placed the geocache, if any
    pub owner: Option<PersonId>,

    pub location: Location,

    /// What is inside the cache (may be empty)
    pub contents: String,

    /// Message left for finders
    pub message: String,
}

impl Geocache {
    /// Tooltip text shown on the geocache's pin.
    ///
    /// `owner_name` is appended on its own line when the cache has an owner.
    #[must_use]
    pub fn tooltip(&self, owner_name: Option<&str>) -> String {
        let mut tooltip = format!(
            "Latitude: {} \nLongitude: {}\n\n{}\n{}",
            self.location.latitude, self.location.longitude, self.message, self.contents
        );
        if let Some(name) = owner_name {
            tooltip.push('\n');
            tooltip.push_str(name);
        }
        tooltip
    }
}

/// Field values collected by the "add geocache" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocacheForm {
    pub contents: String,
    pub message: String,
}
