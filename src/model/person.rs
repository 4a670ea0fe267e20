//! Person model.
//!
//! People are the acting parties on the map: they own geocaches and mark
//! other people's geocaches as found.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Location;

/// Store-assigned person identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier, assigned by the store and never reused
    pub id: PersonId,

    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub city: String,
    pub street_name: String,
    pub street_number: u8,

    /// Where the person's pin sits
    pub location: Location,
}

impl Person {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Tooltip text shown on the person's pin.
    #[must_use]
    pub fn tooltip(&self) -> String {
        format!(
            "{} {}\n{} {}\n{}\n{}",
            self.first_name,
            self.last_name,
            self.street_name,
            self.street_number,
            self.city,
            self.country
        )
    }
}

/// Field values collected by the "add person" form.
///
/// Combined with the latest map click to create a [`Person`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonForm {
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub city: String,
    pub street_name: String,
    pub street_number: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooltip() {
        let person = Person {
            id: PersonId(1),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            country: "SE".to_string(),
            city: "Gothenburg".to_string(),
            street_name: "MainSt".to_string(),
            street_number: 5,
            location: Location::new(57.70, 11.97),
        };

        assert_eq!(person.tooltip(), "Alice Smith\nMainSt 5\nGothenburg\nSE");
        assert_eq!(person.full_name(), "Alice Smith");
    }
}
