//! Selection state machine.
//!
//! Tracks which person is active and classifies every person and geocache
//! for the current selection. The classification variants are shared by the
//! renderer (color and opacity) and the click dispatcher, so the two can
//! never disagree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Geocache, PersonId, Snapshot};

/// Which person, if any, is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "person", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    Unselected,
    Selected(PersonId),
}

/// How a person pin is drawn for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonMarkerKind {
    /// Nobody is selected
    Neutral,
    /// This person is the active one
    Active,
    /// Someone else is active
    Inactive,
}

/// How a geocache pin is drawn for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeocacheMarkerKind {
    /// Nobody is selected
    Unavailable,
    /// The active person can mark this geocache as found
    Claimable { finder: PersonId },
    /// The active person placed this geocache
    Owned,
}

impl PersonMarkerKind {
    #[must_use]
    pub const fn opacity(self) -> f64 {
        match self {
            Self::Neutral | Self::Active => 1.0,
            Self::Inactive => 0.5,
        }
    }
}

impl Selection {
    /// The active person, if any.
    #[must_use]
    pub const fn active(&self) -> Option<PersonId> {
        match self {
            Self::Unselected => None,
            Self::Selected(id) => Some(*id),
        }
    }

    #[must_use]
    pub const fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    /// Make `person` active. Valid from either state.
    pub fn select(&mut self, person: PersonId) {
        debug!(%person, "Person selected");
        *self = Self::Selected(person);
    }

    /// Background click: drop back to [`Selection::Unselected`].
    pub fn reset(&mut self) {
        if self.is_selected() {
            debug!("Selection cleared");
        }
        *self = Self::Unselected;
    }

    /// Drop the selection if the active person is no longer in `snapshot`.
    ///
    /// Returns `true` if the selection changed.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> bool {
        match self.active() {
            Some(id) if snapshot.person(id).is_none() => {
                debug!(person = %id, "Active person no longer exists");
                *self = Self::Unselected;
                true
            }
            _ => false,
        }
    }

    /// Classify a person pin.
    #[must_use]
    pub fn classify_person(&self, person: PersonId) -> PersonMarkerKind {
        match self {
            Self::Unselected => PersonMarkerKind::Neutral,
            Self::Selected(active) if *active == person => PersonMarkerKind::Active,
            Self::Selected(_) => PersonMarkerKind::Inactive,
        }
    }

    /// Classify a geocache pin.
    ///
    /// Found state does not matter here: a geocache the active person has
    /// found stays claimable beneath its found marker.
    #[must_use]
    pub fn classify_geocache(&self, geocache: &Geocache) -> GeocacheMarkerKind {
        match self {
            Self::Unselected => GeocacheMarkerKind::Unavailable,
            Self::Selected(active) if geocache.owner == Some(*active) => GeocacheMarkerKind::Owned,
            Self::Selected(active) => GeocacheMarkerKind::Claimable { finder: *active },
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unselected => write!(f, "unselected"),
            Self::Selected(id) => write!(f, "selected({id})"),
        }
    }
}
