//! Error types for feature construction and evaluation.

use std::fmt;

use thiserror::Error;

/// Result type alias for training operations.
pub type TrainResult<T> = Result<T, TrainError>;

/// Where a score was being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStage {
    /// 1-based cross-validation fold.
    Fold(usize),
    Validation,
}

impl fmt::Display for ScoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fold(i) => write!(f, "fold {}", i),
            Self::Validation => write!(f, "validation"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TrainError {
    /// A scored subset lacks one label class; AUC is undefined.
    #[error("{stage} has {positives} positive and {negatives} negative rows; AUC needs both classes")]
    ClassBalance {
        stage: ScoreStage,
        positives: usize,
        negatives: usize,
    },

    /// Too few rows for the requested split.
    #[error("Not enough rows: {details}")]
    InsufficientRows { details: String },

    /// Arrays of incompatible sizes.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// The model library rejected the training data.
    #[error("Model error: {0}")]
    Model(String),

    /// Predicting with an unfitted model.
    #[error("Classifier has not been fitted")]
    NotFitted,

    /// The input file does not have the expected layout.
    #[error("Malformed input '{path}': {details}")]
    Format { path: String, details: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TrainError {
    fn from(e: serde_json::Error) -> Self {
        TrainError::Serialization(e.to_string())
    }
}
