//! Embedding Orchestrator and embeddings export.
//!
//! [`EmbeddingOrchestrator`] turns the stored graph into one fixed-length
//! vector per entity: it projects the graph, estimates memory, computes
//! embeddings inside the store and writes them to a flat file readable by
//! `biokg-train`.

pub mod error;
pub mod export;
pub mod orchestrator;

pub use error::{EmbeddingError, EmbeddingResult, EmbeddingStage};
pub use export::{partial_path, EmbeddingWriter, ExportSummary};
pub use orchestrator::{EmbeddingOrchestrator, EmbeddingRunReport};
