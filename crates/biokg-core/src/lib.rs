//! Core types for the biokg knowledge-graph pipeline.
//!
//! This crate holds everything that does not talk to the graph store:
//!
//! - **types**: Entity, Relation and ground-truth drafts
//! - **decode**: Record Decoder turning raw CSV rows into typed drafts
//! - **multi_value**: codec for fields joined with the reserved separator
//! - **source**: CSV files read into positioned raw records
//! - **vector_text**: rendering and parsing of `[v1, v2, ...]` vectors
//! - **config**: `PipelineConfig` loaded from TOML with env overrides
//! - **error**: `DecodeFault` and `ConfigError`
//!
//! Decoding is pure: it performs no I/O and never touches shared state, so
//! every decoder can be tested without a store.
//!
//! # Example
//!
//! ```
//! use biokg_core::decode::{decode_entity, RawRecord};
//!
//! let record = RawRecord::from_pairs(2, [("id", "CHEBI:15365"), ("all_names", "aspirinǂASA")]);
//! let entity = decode_entity(&record).unwrap();
//! assert_eq!(entity.id, "CHEBI:15365");
//! assert_eq!(entity.all_names, vec!["aspirin", "ASA"]);
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod multi_value;
pub mod source;
pub mod types;
pub mod vector_text;

pub use config::{
    ClassifierConfig, EmbeddingConfig, IngestConfig, PipelineConfig, StoreConfig, TrainingConfig,
};
pub use decode::{decode_entity, decode_ground_truth, decode_relation, RawRecord};
pub use error::{ConfigError, ConfigResult, DecodeFault, DecodeFaultKind};
pub use multi_value::{join_multi, split_multi, MULTI_VALUE_SEPARATOR};
pub use source::{parse_records, read_records};
pub use types::{EntityDraft, GroundTruthPair, RelationDraft};
pub use vector_text::{format_vector, parse_vector};

/// Embedding dimension of the reference configuration.
pub const DEFAULT_EMBEDDING_DIM: usize = 128;
