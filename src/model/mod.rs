//! Data models for the geocaching map.
//!
//! This module contains the relational model:
//! - Person
//! - Geocache
//! - FoundRelation
//! - Location
//! - Snapshot (all three collections loaded for one render pass)

pub mod found;
pub mod geocache;
pub mod location;
pub mod person;
pub mod snapshot;

pub use found::FoundRelation;
pub use geocache::{Geocache, GeocacheForm, GeocacheId};
pub use location::Location;
pub use person::{Person, PersonForm, PersonId};
pub use snapshot::{IdScheme, Snapshot};
