//! Post-processing: interpret the text the service put in `number`.
//!
//! The service answers `200 {"number": ...}` whether or not it found a
//! plate. When it finds nothing it writes one of two fixed sentences into
//! the same field. [`PlateReading::classify`] tells those apart from a real
//! reading so front ends can colour them or report them in JSON.
//!
//! Classification is informational. The form always displays the `number`
//! field exactly as received.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Sentence the service returns when no plate-shaped region was found.
pub const NOT_DETECTED: &str = "License plate not detected.";

/// Sentence the service returns when a region was found but OCR read nothing.
pub const UNRECOGNIZED: &str = "Could not recognize the license plate.";

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());

static PLATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,12}$").unwrap());

/// What a `number` value means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum PlateReading {
    /// Uppercase alphanumerics, as the service emits for a recognised plate.
    Plate(String),
    NotDetected,
    Unrecognized,
    /// The field was missing or empty.
    Empty,
    /// Anything else; shown as-is.
    Other(String),
}

impl PlateReading {
    pub fn classify(number: &str) -> Self {
        let trimmed = number.trim();
        if trimmed.is_empty() {
            return PlateReading::Empty;
        }
        if trimmed == NOT_DETECTED {
            return PlateReading::NotDetected;
        }
        if trimmed == UNRECOGNIZED {
            return PlateReading::Unrecognized;
        }
        if PLATE_SHAPE.is_match(trimmed) && normalize_plate(trimmed) == trimmed {
            return PlateReading::Plate(trimmed.to_string());
        }
        PlateReading::Other(number.to_string())
    }

    pub fn is_plate(&self) -> bool {
        matches!(self, PlateReading::Plate(_))
    }
}

/// Drop every non-alphanumeric character and uppercase the rest.
///
/// Matches the cleaning the service applies to raw OCR text.
pub fn normalize_plate(text: &str) -> String {
    NON_ALNUM.replace_all(text, "").to_uppercase()
}
