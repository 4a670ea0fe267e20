//! Error types for the geocaching engine and CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{GeocacheId, PersonId};

/// Result type alias for geocaching operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    PersonNotFound,
    GeocacheNotFound,
    MarkerNotFound,

    // Validation (exit 4)
    ValidationError,
    AlreadyFound,
    InvalidArgument,

    // Precondition (exit 5)
    NoActivePerson,
    NoClickLocation,

    // Format (exit 6)
    FormatError,
    ReferentialError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::PersonNotFound => "PERSON_NOT_FOUND",
            Self::GeocacheNotFound => "GEOCACHE_NOT_FOUND",
            Self::MarkerNotFound => "MARKER_NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::AlreadyFound => "ALREADY_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NoActivePerson => "NO_ACTIVE_PERSON",
            Self::NoClickLocation => "NO_CLICK_LOCATION",
            Self::FormatError => "FORMAT_ERROR",
            Self::ReferentialError => "REFERENTIAL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::PersonNotFound | Self::GeocacheNotFound | Self::MarkerNotFound => 3,
            Self::ValidationError | Self::AlreadyFound | Self::InvalidArgument => 4,
            Self::NoActivePerson | Self::NoClickLocation => 5,
            Self::FormatError | Self::ReferentialError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the caller can succeed by retrying with corrected input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationError
                | Self::InvalidArgument
                | Self::NoActivePerson
                | Self::NoClickLocation
                | Self::MarkerNotFound
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in geocaching operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `geo init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Person not found: {id}")]
    PersonNotFound { id: PersonId },

    #[error("Geocache not found: {id}")]
    GeocacheNotFound { id: GeocacheId },

    #[error("No marker at index {index} ({count} markers on the map)")]
    MarkerNotFound { index: usize, count: usize },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Person {person_id} has already found geocache {geocache_id}")]
    AlreadyFound {
        person_id: PersonId,
        geocache_id: GeocacheId,
    },

    #[error("Please select a person before adding a geocache")]
    NoActivePerson,

    #[error("No map location: click on the map first")]
    NoClickLocation,

    #[error("The text file is not properly formatted (line {line}: {message})")]
    Format { line: usize, message: String },

    #[error(
        "The text file is not properly formatted: geocache {geocache_id} found by {person} does not exist"
    )]
    Referential {
        geocache_id: GeocacheId,
        person: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::PersonNotFound { .. } => ErrorCode::PersonNotFound,
            Self::GeocacheNotFound { .. } => ErrorCode::GeocacheNotFound,
            Self::MarkerNotFound { .. } => ErrorCode::MarkerNotFound,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::AlreadyFound { .. } => ErrorCode::AlreadyFound,
            Self::NoActivePerson => ErrorCode::NoActivePerson,
            Self::NoClickLocation => ErrorCode::NoClickLocation,
            Self::Format { .. } => ErrorCode::FormatError,
            Self::Referential { .. } => ErrorCode::ReferentialError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `geo init` to create the geocaching database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::PersonNotFound { id } => Some(format!(
                "No person with ID {id}. Use `geo person list` to see everyone on the map."
            )),

            Self::GeocacheNotFound { id } => Some(format!(
                "No geocache with ID {id}. Use `geo geocache list` to see all geocaches."
            )),

            Self::MarkerNotFound { .. } => {
                Some("Use `geo map` to list the markers currently shown.".to_string())
            }

            Self::NoActivePerson => Some(
                "Select a person first: click their pin (`geo pin <index>`) \
                 or `geo person select <id>`"
                    .to_string(),
            ),

            Self::NoClickLocation => Some(
                "Right-click the spot on the map first: `geo click <lat> <lon> --right`"
                    .to_string(),
            ),

            Self::AlreadyFound { .. } => Some(
                "Click the green pin of a found geocache to un-find it instead.".to_string(),
            ),

            Self::Format { .. } | Self::Referential { .. } => Some(
                "Expected person lines (8 fields), geocache lines (5 fields) and \
                 `Found:` lines, separated by blank lines"
                    .to_string(),
            ),

            Self::Validation { field, .. } => match *field {
                "street_number" => Some("Street numbers range from 0 to 255".to_string()),
                "latitude" | "longitude" => Some(
                    "Latitude must be within [-90, 90] and longitude within [-180, 180]"
                        .to_string(),
                ),
                _ => None,
            },

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
