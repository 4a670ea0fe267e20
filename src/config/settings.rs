//! Map settings.
//!
//! Read from `config.json` next to the database. Every field is optional;
//! a missing file means defaults. `GEOCACHE_ID_SCHEME` and
//! `GEOCACHE_ATOMIC_IMPORT` override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{IdScheme, Location};
use crate::validate::validate_location;

/// Default map center (Gothenburg).
pub const DEFAULT_HOME: Location = Location::new(57.719_021, 11.991_202);

/// Default hit-test radius in degrees.
pub const DEFAULT_PIN_RADIUS: f64 = 0.0005;

/// Tunable behavior of the map engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How new geocache ids are numbered
    pub id_scheme: IdScheme,

    /// Roll back a failed file load instead of keeping partial records
    pub atomic_import: bool,

    /// Degrees around a pin that count as a hit when only a coordinate is known
    pub pin_radius: f64,

    /// Map center
    pub home: Location,

    pub zoom: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id_scheme: IdScheme::default(),
            atomic_import: true,
            pin_radius: DEFAULT_PIN_RADIUS,
            home: DEFAULT_HOME,
            zoom: 12,
        }
    }
}

/// Path of the settings file for a database.
#[must_use]
pub fn settings_path(db_path: &Path) -> PathBuf {
    db_path.with_file_name("config.json")
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name}: expected true or false, got '{other}'"))),
    }
}

impl Settings {
    /// Load settings for the database at `db_path`, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file or an override is invalid.
    pub fn load(db_path: &Path) -> Result<Self> {
        Self::load_from(&settings_path(db_path))?.with_overrides(
            std::env::var("GEOCACHE_ID_SCHEME").ok().as_deref(),
            std::env::var("GEOCACHE_ATOMIC_IMPORT").ok().as_deref(),
        )
    }

    /// Load settings from a file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be parsed or is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        settings.check()?;

        debug!(path = %path.display(), ?settings, "Loaded settings");
        Ok(settings)
    }

    /// Apply override values (as read from the environment).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a value cannot be parsed.
    pub fn with_overrides(
        mut self,
        id_scheme: Option<&str>,
        atomic_import: Option<&str>,
    ) -> Result<Self> {
        if let Some(value) = id_scheme.filter(|v| !v.trim().is_empty()) {
            self.id_scheme = value
                .parse()
                .map_err(|e: String| Error::Config(format!("GEOCACHE_ID_SCHEME: {e}")))?;
        }
        if let Some(value) = atomic_import.filter(|v| !v.trim().is_empty()) {
            self.atomic_import = parse_bool("GEOCACHE_ATOMIC_IMPORT", value)?;
        }
        Ok(self)
    }

    fn check(&self) -> Result<()> {
        if !self.pin_radius.is_finite() || self.pin_radius <= 0.0 {
            return Err(Error::Config(format!(
                "pin_radius must be a positive number of degrees, got {}",
                self.pin_radius
            )));
        }
        validate_location(&self.home).map_err(|e| Error::Config(format!("home: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.atomic_import);
        assert_eq!(settings.id_scheme, IdScheme::Sequential);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"id_scheme": "legacy", "zoom": 9}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.id_scheme, IdScheme::Legacy);
        assert_eq!(settings.zoom, 9);
        assert!(settings.atomic_import);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{"id_scheme": "random"}"#).unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));

        fs::write(&path, r#"{"pin_radius": -1}"#).unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_overrides(Some("legacy"), Some("false"))
            .unwrap();
        assert_eq!(settings.id_scheme, IdScheme::Legacy);
        assert!(!settings.atomic_import);

        let unchanged = Settings::default().with_overrides(Some(""), None).unwrap();
        assert_eq!(unchanged, Settings::default());

        assert!(Settings::default().with_overrides(None, Some("maybe")).is_err());
    }

    #[test]
    fn test_settings_path_next_to_db() {
        let path = settings_path(Path::new("/data/map/geocaching.db"));
        assert_eq!(path, PathBuf::from("/data/map/config.json"));
    }
}
