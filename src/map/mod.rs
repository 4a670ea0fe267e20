//! Map synchronization engine.
//!
//! - [`marker`] - Marker kinds, colors and click effects
//! - [`render`] - Pure rendering and the clear-and-rebuild marker layer
//! - [`session`] - Pointer dispatch and menu actions over an injected store

pub mod marker;
pub mod render;
pub mod session;

pub use marker::{Color, Effect, Marker, MarkerKind};
pub use render::{MarkerLayer, render};
pub use session::{MapSession, MouseButton, PointerEvent, PointerOutcome};
