//! Error types for biokg-core.
//!
//! [`DecodeFault`] is attributable to exactly one record. Callers collect
//! faults and keep going; a fault never aborts a batch. [`ConfigError`] is
//! returned by configuration loading and validation.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What went wrong while decoding a single record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeFaultKind {
    /// A required column is absent or blank.
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    /// A vector parsed to the wrong number of components.
    #[error("vector length {actual} (expected {expected})")]
    VectorLength { expected: usize, actual: usize },
    /// A component of a vector or a numeric column is not a finite number.
    #[error("invalid number '{value}'")]
    InvalidNumber { value: String },
    /// A ground-truth label outside {0, 1}.
    #[error("invalid label '{value}' (expected 0 or 1)")]
    InvalidLabel { value: String },
    /// The record repeats an id already seen in this run.
    #[error("duplicate id")]
    DuplicateId,
}

fn id_suffix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" (id '{}')", id),
        None => String::new(),
    }
}

/// A malformed record.
///
/// `position` is the 1-based line of the record in its source file and `id`
/// carries the record's identifier when one could be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record at line {position}{}: {kind}", id_suffix(.id))]
pub struct DecodeFault {
    pub position: u64,
    pub id: Option<String>,
    pub kind: DecodeFaultKind,
}

impl DecodeFault {
    pub fn missing_field(position: u64, id: Option<&str>, field: &str) -> Self {
        Self {
            position,
            id: id.map(str::to_string),
            kind: DecodeFaultKind::MissingField {
                field: field.to_string(),
            },
        }
    }

    pub fn duplicate_id(position: u64, id: &str) -> Self {
        Self {
            position,
            id: Some(id.to_string()),
            kind: DecodeFaultKind::DuplicateId,
        }
    }

    /// Attach the position and id of the row a value-level fault came from.
    pub fn at(mut self, position: u64, id: Option<&str>) -> Self {
        self.position = position;
        if id.is_some() {
            self.id = id.map(str::to_string);
        }
        self
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    /// The TOML document is malformed.
    #[error("Failed to parse TOML: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("Invalid configuration [{section}] {field}: {message}")]
    Invalid {
        section: &'static str,
        field: &'static str,
        message: String,
    },
}
