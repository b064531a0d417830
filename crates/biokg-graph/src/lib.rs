//! Graph store capability and Graph Ingestor.
//!
//! # Architecture
//!
//! - **store**: the [`GraphStore`] trait, its parameterized-Cypher binding
//!   ([`CypherGraphStore`] over [`HttpCypherClient`]) and an in-memory store
//!   for tests
//! - **ingest**: [`GraphIngestor`] with the clear, entity load and relation
//!   load stages
//! - **error**: [`GraphError`] for store failures and precondition checks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use biokg_core::{IngestConfig, RawRecord};
//! use biokg_graph::{GraphIngestor, InMemoryGraphStore};
//!
//! # tokio_test_block(async {
//! let store = Arc::new(InMemoryGraphStore::new());
//! let ingestor = GraphIngestor::new(store, IngestConfig::default());
//! let report = ingestor
//!     .load_entities(&[RawRecord::from_pairs(2, [("id", "A")])])
//!     .await
//!     .unwrap();
//! assert_eq!(report.created, 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod ingest;
pub mod store;

pub use error::{GraphError, GraphResult};
pub use ingest::{
    ClearReport, EndpointRole, GraphIngestor, IngestFault, LoadReport, LoadStage,
    MissingEndpoint, ReloadReport, WipeConfirmation,
};
pub use store::{
    ComputeSummary, CypherExecutor, CypherGraphStore, EdgeWrite, EmbeddingParams, GraphStatus,
    GraphStore, HttpCypherClient, InMemoryGraphStore, MemoryEstimate, NodeEmbedding, NodeWrite,
    ProjectionSummary, StoreOperation,
};
