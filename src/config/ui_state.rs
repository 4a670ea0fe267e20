//! Persisted map interaction state.
//!
//! The CLI runs one action per process, so the selection and the latest map
//! click are written to `ui-state.json` next to the database after every
//! command and restored at the start of the next one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::model::Location;
use crate::selection::Selection;

/// Selection and latest background click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub selection: Selection,
    pub latest_click: Option<Location>,
}

/// Path of the UI state file for a database.
#[must_use]
pub fn ui_state_path(db_path: &Path) -> PathBuf {
    db_path.with_file_name("ui-state.json")
}

impl UiState {
    /// Read the state file.
    ///
    /// A missing or corrupted file yields the default (nothing selected, no
    /// click yet).
    #[must_use]
    pub fn read(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupted UI state");
                Self::default()
            }
        }
    }

    /// Write the state file: temp file, then atomic rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        {
            let mut opts = fs::OpenOptions::new();
            opts.write(true).create(true).truncate(true);
            #[cfg(unix)]
            opts.mode(0o600);
            let mut file = opts.open(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
