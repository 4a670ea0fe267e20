//! Map markers and their click effects.

use serde::Serialize;
use std::fmt;

use crate::model::{FoundRelation, GeocacheId, Location, PersonId};
use crate::selection::{GeocacheMarkerKind, PersonMarkerKind};

/// Pin color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Blue,
    Gray,
    Red,
    Black,
    Green,
}

impl Color {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Gray => "gray",
            Self::Red => "red",
            Self::Black => "black",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a marker stands for, classified for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerKind {
    Person {
        id: PersonId,
        kind: PersonMarkerKind,
    },
    Geocache {
        id: GeocacheId,
        kind: GeocacheMarkerKind,
    },
    /// A geocache the active person has found
    Found { relation: FoundRelation },
}

/// What happens when a marker is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Make this person active
    Select { person: PersonId },
    /// Record a found relation
    MarkFound { relation: FoundRelation },
    /// Delete a found relation
    Unfind { relation: FoundRelation },
    /// Consume the click and do nothing
    Absorb,
}

/// A pin on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub location: Location,
    pub tooltip: String,
}

impl Marker {
    #[must_use]
    pub fn color(&self) -> Color {
        match self.kind {
            MarkerKind::Person { .. } => Color::Blue,
            MarkerKind::Geocache { kind, .. } => match kind {
                GeocacheMarkerKind::Unavailable => Color::Gray,
                GeocacheMarkerKind::Claimable { .. } => Color::Red,
                GeocacheMarkerKind::Owned => Color::Black,
            },
            MarkerKind::Found { .. } => Color::Green,
        }
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        match self.kind {
            MarkerKind::Person { kind, .. } => kind.opacity(),
            MarkerKind::Geocache { .. } | MarkerKind::Found { .. } => 1.0,
        }
    }

    #[must_use]
    pub fn effect(&self) -> Effect {
        match self.kind {
            MarkerKind::Person { id, .. } => Effect::Select { person: id },
            MarkerKind::Geocache {
                id,
                kind: GeocacheMarkerKind::Claimable { finder },
            } => Effect::MarkFound {
                relation: FoundRelation::new(finder, id),
            },
            MarkerKind::Geocache { .. } => Effect::Absorb,
            MarkerKind::Found { relation } => Effect::Unfind { relation },
        }
    }

    /// Short label for listings ("person 1", "geocache 2", "found 2").
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            MarkerKind::Person { id, .. } => format!("person {id}"),
            MarkerKind::Geocache { id, .. } => format!("geocache {id}"),
            MarkerKind::Found { relation } => format!("found {}", relation.geocache_id),
        }
    }
}
