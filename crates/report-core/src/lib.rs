//! Shared building blocks for the HEMS schedule report engine.
//!
//! Holds the error taxonomy, the report data model, engine and CLI
//! configuration, display formatting, timestamp handling and the markdown
//! sanitizer applied before speech synthesis.

pub mod error;
pub mod formatting;
pub mod models;
pub mod sanitize;
pub mod settings;
pub mod time_utils;

pub use error::{ReportError, Result, ValidationError};
