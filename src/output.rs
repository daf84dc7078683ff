//! Result types: what the form holds and what it renders.

use crate::pipeline::postprocess::PlateReading;
use crate::pipeline::preview::ImagePreview;
use serde::Serialize;
use std::fmt;

/// The latest result shown below the form.
///
/// One value instead of two strings, so an error and an extracted number
/// can never be displayed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    None,
    /// The service answered; holds its `number` field verbatim.
    Success(String),
    /// A user-facing error message.
    Failure(String),
}

impl Outcome {
    /// The extracted number, or `""` when there is none.
    pub fn extracted_number(&self) -> &str {
        match self {
            Outcome::Success(n) => n,
            _ => "",
        }
    }

    /// The error message, or `""` when there is none.
    pub fn error_message(&self) -> &str {
        match self {
            Outcome::Failure(m) => m,
            _ => "",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

/// A rendering snapshot of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub title: &'static str,
    /// Present whenever a file is chosen, regardless of request state.
    pub preview: Option<ImagePreview>,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub loading: bool,
    pub outcome: Outcome,
}

impl FormView {
    pub fn extracted_number(&self) -> &str {
        self.outcome.extracted_number()
    }

    pub fn error_message(&self) -> &str {
        self.outcome.error_message()
    }
}

impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        match &self.preview {
            Some(p) => writeln!(f, "  Image:  {p}")?,
            None => writeln!(f, "  Image:  (none selected)")?,
        }
        let state = if self.submit_enabled { "" } else { " (disabled)" };
        writeln!(f, "  [ {} ]{}", self.submit_label, state)?;

        let error = self.error_message();
        if !error.is_empty() {
            writeln!(f)?;
            writeln!(f, "  {error}")?;
        }
        let number = self.extracted_number();
        if !number.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Extracted Number:")?;
            writeln!(f, "  {number}")?;
        }
        Ok(())
    }
}

/// Result of a one-shot [`crate::extract::extract`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// The service's `number` field, verbatim.
    pub number: String,
    pub reading: PlateReading,
    pub file_name: String,
    pub endpoint: String,
    pub duration_ms: u64,
}

impl Extraction {
    /// Wrap a successful `number`, classifying it on the way.
    pub fn new(
        number: impl Into<String>,
        file_name: impl Into<String>,
        endpoint: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        let number = number.into();
        Self {
            reading: PlateReading::classify(&number),
            number,
            file_name: file_name.into(),
            endpoint: endpoint.into(),
            duration_ms,
        }
    }
}
