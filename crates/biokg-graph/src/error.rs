//! Error types for graph store and ingestion operations.
//!
//! Every variant here is a StoreFault or a precondition failure: fatal to the
//! current stage. Per-record problems (decode faults, missing endpoints) are
//! not errors; they are collected in [`LoadReport`](crate::ingest::LoadReport).
//!
//! No partial state is rolled back. After a failed load the caller must run
//! the clear stage again before retrying.

use thiserror::Error;

use crate::store::StoreOperation;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Error type for graph store and ingestion operations.
#[derive(Error, Debug)]
pub enum GraphError {
    // ========== Store Errors ==========
    /// The store could not be reached.
    #[error("Connection to graph store at {uri} failed: {message}")]
    Connection { uri: String, message: String },

    /// The store rejected a query.
    #[error("{operation} failed: {code}: {message}")]
    QueryFailed {
        operation: StoreOperation,
        code: String,
        message: String,
    },

    /// The store answered with rows of an unexpected shape.
    #[error("{operation} returned an unexpected response: {details}")]
    UnexpectedResponse {
        operation: StoreOperation,
        details: String,
    },

    /// Generic store failure (used by in-process stores).
    #[error("{operation} failed: {message}")]
    Store {
        operation: StoreOperation,
        message: String,
    },

    // ========== Precondition Errors ==========
    /// Clearing a non-empty store requires explicit confirmation.
    #[error(
        "Store holds {nodes} nodes and {relationships} relationships; refusing to wipe without confirmation"
    )]
    WipeNotConfirmed { nodes: u64, relationships: u64 },

    /// A projection with this name already exists.
    #[error("Projection '{0}' already exists; drop it first")]
    ProjectionExists(String),

    /// No projection with this name exists.
    #[error("Projection '{0}' not found")]
    ProjectionNotFound(String),

    // ========== I/O Errors ==========
    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    /// The store operation that failed, if this error came from the store.
    pub fn operation(&self) -> Option<StoreOperation> {
        match self {
            Self::QueryFailed { operation, .. }
            | Self::UnexpectedResponse { operation, .. }
            | Self::Store { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Serialization(e.to_string())
    }
}
