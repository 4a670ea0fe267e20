//! Configuration management.
//!
//! This module provides functions for locating the geocaching data
//! directory, resolving the database path and loading configuration.
//!
//! # Layout
//!
//! Everything lives next to the database file:
//! - **Database**: `~/.geocaching/data/geocaching.db` by default
//! - **Settings**: `config.json` in the same directory
//! - **UI state**: `ui-state.json` in the same directory (selection and last click)

mod settings;
mod ui_state;

pub use settings::{Settings, settings_path};
pub use ui_state::{UiState, ui_state_path};

use std::path::{Path, PathBuf};

/// Get the global geocaching directory location (`~/.geocaching/`).
#[must_use]
pub fn global_data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".geocaching"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `GEOCACHE_TEST_DB=1` (or any non-empty value).
/// This redirects all database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("GEOCACHE_TEST_DB")
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && value.to_lowercase() != "false"
}

/// Get the test database path (`~/.geocaching/test/geocaching.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_data_dir().map(|dir| dir.join("test").join("geocaching.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `GEOCACHE_TEST_DB` environment variable → uses test database
/// 3. `GEOCACHE_DB` environment variable
/// 4. Global location: `~/.geocaching/data/geocaching.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Explicit path from CLI flag
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Test mode - use isolated test database
    if is_test_mode() {
        return test_db_path();
    }

    // Priority 3: GEOCACHE_DB environment variable
    if let Ok(db_path) = std::env::var("GEOCACHE_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    // Priority 4: Global database location
    global_data_dir().map(|dir| dir.join("data").join("geocaching.db"))
}

/// Get the default actor name for audit events.
///
/// Priority:
/// 1. `GEOCACHE_ACTOR` environment variable
/// 2. Git user name
/// 3. System username
/// 4. "unknown"
#[must_use]
pub fn default_actor() -> String {
    if let Ok(actor) = std::env::var("GEOCACHE_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    if let Ok(user) = std::env::var("USER") {
        return user;
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_actor() {
        let actor = default_actor();
        assert!(!actor.is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/map.db");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_data_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.to_string_lossy().contains("test"));
        assert!(test.ends_with("geocaching.db"));
        assert_ne!(global.join("data").join("geocaching.db"), test);
    }

    #[test]
    fn test_truthy_values() {
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }
}
