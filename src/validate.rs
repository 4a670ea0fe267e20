//! Field validation at the store boundary.
//!
//! Every record passes through here before it is written. The rules are the
//! column limits of the store plus what the text format cannot hold: no `|`
//! or line breaks inside a field, no padding around it (fields are trimmed on
//! load) and no first name that reads as a `Found:` line.

use crate::codec::decode::FOUND_PREFIX;
use crate::error::{Error, Result};
use crate::model::{Geocache, Location, PersonForm};

/// Maximum length of person name and address fields, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Maximum length of geocache contents and message, in characters.
pub const MAX_TEXT_LEN: usize = 255;

// ── Field rules ──────────────────────────────────────────────

fn check_text(field: &'static str, value: &str, max: usize, required: bool) -> Result<()> {
    if required && value.trim().is_empty() {
        return Err(Error::Validation {
            field,
            message: "is required".to_string(),
        });
    }

    let len = value.chars().count();
    if len > max {
        return Err(Error::Validation {
            field,
            message: format!("is {len} characters long (max {max})"),
        });
    }

    if value.contains(['|', '\n', '\r']) {
        return Err(Error::Validation {
            field,
            message: "must not contain '|' or line breaks".to_string(),
        });
    }

    if value.trim() != value {
        return Err(Error::Validation {
            field,
            message: "must not start or end with whitespace".to_string(),
        });
    }

    Ok(())
}

fn check_coordinate(field: &'static str, value: f64, limit: f64) -> Result<()> {
    if !value.is_finite() || value.abs() > limit {
        return Err(Error::Validation {
            field,
            message: format!("{value} is outside [-{limit}, {limit}]"),
        });
    }
    Ok(())
}

/// Validate a map location.
///
/// # Errors
///
/// Returns `Error::Validation` if a coordinate is not finite or out of range.
pub fn validate_location(location: &Location) -> Result<()> {
    check_coordinate("latitude", location.latitude, 90.0)?;
    check_coordinate("longitude", location.longitude, 180.0)
}

/// Validate the fields of a new person.
///
/// # Errors
///
/// Returns `Error::Validation` naming the first offending field.
pub fn validate_person(form: &PersonForm, location: &Location) -> Result<()> {
    check_text("first_name", &form.first_name, MAX_NAME_LEN, true)?;
    if form.first_name.starts_with(FOUND_PREFIX) {
        return Err(Error::Validation {
            field: "first_name",
            message: format!("must not start with '{FOUND_PREFIX}'"),
        });
    }
    check_text("last_name", &form.last_name, MAX_NAME_LEN, true)?;
    check_text("country", &form.country, MAX_NAME_LEN, true)?;
    check_text("city", &form.city, MAX_NAME_LEN, true)?;
    check_text("street_name", &form.street_name, MAX_NAME_LEN, true)?;
    validate_location(location)
}

/// Validate the fields of a geocache.
///
/// # Errors
///
/// Returns `Error::Validation` naming the first offending field.
pub fn validate_geocache(geocache: &Geocache) -> Result<()> {
    check_text("contents", &geocache.contents, MAX_TEXT_LEN, false)?;
    check_text("message", &geocache.message, MAX_TEXT_LEN, true)?;
    validate_location(&geocache.location)
}

/// Parse a street number (0-255).
///
/// # Errors
///
/// Returns `Error::Validation` if the input is not an integer in range.
pub fn parse_street_number(input: &str) -> Result<u8> {
    input.trim().parse::<u8>().map_err(|_| Error::Validation {
        field: "street_number",
        message: format!("'{input}' is not a number between 0 and 255"),
    })
}

/// Parse a coordinate in degrees using `.` as the decimal point.
///
/// # Errors
///
/// Returns `Error::Validation` if the input is not a number.
pub fn parse_degrees(field: &'static str, input: &str) -> Result<f64> {
    input.trim().parse::<f64>().map_err(|_| Error::Validation {
        field,
        message: format!("'{input}' is not a number"),
    })
}
