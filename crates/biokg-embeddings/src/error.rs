//! Error types for the embedding stages.

use std::fmt;

use biokg_graph::GraphError;
use thiserror::Error;

/// Result type alias for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Named stages of an embedding run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EmbeddingStage {
    Drop,
    Project,
    Estimate,
    Compute,
    Export,
}

impl fmt::Display for EmbeddingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drop => "drop",
            Self::Project => "project",
            Self::Estimate => "estimate",
            Self::Compute => "compute",
            Self::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The store failed or refused a precondition.
    #[error("{stage} stage failed: {source}")]
    Graph {
        stage: EmbeddingStage,
        #[source]
        source: GraphError,
    },

    /// A stage ran before the stage it depends on.
    #[error("{stage} stage requires {requires} to run first")]
    StageOrder {
        stage: EmbeddingStage,
        requires: EmbeddingStage,
    },

    /// Stored vectors cannot form a consistent export.
    #[error("Inconsistent export for '{id}': {details}")]
    InconsistentExport { id: String, details: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbeddingError {
    /// The stage this error aborted.
    pub fn stage(&self) -> Option<EmbeddingStage> {
        match self {
            Self::Graph { stage, .. } | Self::StageOrder { stage, .. } => Some(*stage),
            Self::InconsistentExport { .. } | Self::Csv(_) | Self::Io(_) => {
                Some(EmbeddingStage::Export)
            }
        }
    }
}

/// Attach a stage to store errors.
pub(crate) trait AtStage<T> {
    fn at_stage(self, stage: EmbeddingStage) -> EmbeddingResult<T>;
}

impl<T> AtStage<T> for Result<T, GraphError> {
    fn at_stage(self, stage: EmbeddingStage) -> EmbeddingResult<T> {
        self.map_err(|source| EmbeddingError::Graph { stage, source })
    }
}
