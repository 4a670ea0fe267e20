//! Geocaching map engine.
//!
//! This crate provides the core functionality for the `geo` CLI tool:
//! people and geocaches placed on a map, which person found which geocache,
//! and a pipe-delimited text format to save and load it all.
//!
//! # Architecture
//!
//! - [`storage`] - `Store` trait and the SQLite implementation
//! - [`model`] - Data types (Person, Geocache, FoundRelation, Snapshot)
//! - [`selection`] - Active-person state machine and marker classification
//! - [`map`] - Marker rendering and the interactive map session
//! - [`codec`] - Text format encode/decode and load/save
//! - [`config`] - Paths, settings and persisted UI state
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod map;
pub mod model;
pub mod selection;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};
