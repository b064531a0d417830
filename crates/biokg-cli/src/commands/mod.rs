//! CLI command handlers
//!
//! - `graph`: clear, load and inspect the stored graph
//! - `embed`: projection, embedding and export stages
//! - `train`: feature construction and cross-validated evaluation

pub mod embed;
pub mod graph;
pub mod train;
