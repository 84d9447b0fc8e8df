use std::path::PathBuf;
use thiserror::Error;

/// Malformed or missing input in a schedule payload.
///
/// Every variant names the slot, entry or field that failed so the caller can
/// surface it verbatim as a client-facing message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The payload contained no schedule slots at all.
    #[error("Schedule is empty")]
    EmptySchedule,

    /// A slot timestamp was missing or could not be parsed.
    #[error("Invalid timestamp in slot {index}: {value:?}")]
    InvalidTimestamp { index: usize, value: String },

    /// A `data` entry lacks a required field.
    #[error("Slot {slot}, data entry {entry}: missing field `{field}`")]
    MissingField {
        slot: usize,
        entry: usize,
        field: &'static str,
    },

    /// A sample value is not a finite number.
    #[error("Slot {slot}, data entry {entry} ({name}): invalid power value {value}")]
    InvalidValue {
        slot: usize,
        entry: usize,
        name: String,
        value: String,
    },

    /// A slot field has the wrong JSON type.
    #[error("Slot {slot}: field `{field}` must be {expected}")]
    InvalidShape {
        slot: usize,
        field: &'static str,
        expected: &'static str,
    },

    /// A cost figure is present but not a finite number.
    #[error("Cost analysis: field `{field}` must be a finite number, got {value}")]
    InvalidCost { field: &'static str, value: String },
}

/// All errors produced by the report engine.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The input payload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An engine configuration value is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ReportError {
    /// Whether the error stems from the caller's input rather than the engine.
    ///
    /// The surrounding service maps these to a 4xx response. A payload that is
    /// not valid JSON counts as caller input too.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::JsonParse(_))
    }
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
