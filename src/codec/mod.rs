//! Pipe-delimited text format.
//!
//! One block per person:
//!
//! ```text
//! first|last|country|city|street_name|street_number|latitude|longitude
//! id|latitude|longitude|contents|message      (one per owned geocache)
//! Found:2,7                                   (found geocache ids)
//!
//! ```
//!
//! This module provides:
//! - [`encode`] - Snapshot to text
//! - [`Decoder`] - Line-by-line parser that writes through a [`Store`]
//! - [`import`] - Destructive load, optionally inside one transaction
//! - [`file`] - Atomic file write and read helpers

pub mod decode;
pub mod encode;
pub mod file;

pub use decode::{Decoder, decode};
pub use encode::encode;
pub use file::{atomic_write, read_text};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::Store;

/// Default file name for saving the map.
pub const DEFAULT_FILE_NAME: &str = "Geocaches.txt";

/// Statistics for an export operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Number of persons written.
    pub persons: usize,
    /// Number of geocaches written.
    pub geocaches: usize,
    /// Number of found ids written.
    pub found: usize,
    /// Geocaches left out because they have no owner.
    pub unowned_skipped: usize,
    /// Found ids left out because their geocache was left out.
    pub found_skipped: usize,
}

impl ExportStats {
    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons == 0
    }
}

/// Statistics for an import operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Number of persons created.
    pub persons: usize,
    /// Number of geocaches created.
    pub geocaches: usize,
    /// Number of found relations created.
    pub found: usize,
}

impl ImportStats {
    /// Total number of records created.
    #[must_use]
    pub fn total(&self) -> usize {
        self.persons + self.geocaches + self.found
    }
}

/// Replace everything in `store` with the contents of `text`.
///
/// With `atomic` set, the clear and every write happen in one transaction
/// that is rolled back on failure. Without it, records written before the
/// failing line stay in the store.
///
/// # Errors
///
/// Returns `Error::Format` or `Error::Referential` for bad input, or a store
/// error.
pub fn import<S: Store + ?Sized>(store: &mut S, text: &str, atomic: bool) -> Result<ImportStats> {
    if !atomic {
        let result = clear_and_decode(store, text);
        if let Err(e) = &result {
            warn!(error = %e, "Import failed; records before the error were kept");
        }
        return result;
    }

    store.begin()?;
    match clear_and_decode(store, text) {
        Ok(stats) => {
            store.commit()?;
            Ok(stats)
        }
        Err(e) => {
            warn!(error = %e, "Import failed; rolling back");
            if let Err(rollback) = store.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

fn clear_and_decode<S: Store + ?Sized>(store: &mut S, text: &str) -> Result<ImportStats> {
    store.clear_all()?;
    let stats = decode(store, text)?;
    info!(
        persons = stats.persons,
        geocaches = stats.geocaches,
        found = stats.found,
        "Import complete"
    );
    Ok(stats)
}
