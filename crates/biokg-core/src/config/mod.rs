//! Root configuration for the pipeline.
//!
//! # TOML Structure
//!
//! ```toml
//! [store]
//! uri = "http://localhost:7474"
//! database = "neo4j"
//! user = "neo4j"
//! password = "secret"
//!
//! [ingest]
//! batch_size = 100
//! label_all_categories = false
//!
//! [embedding]
//! projection_name = "projection"
//! dimension = 128
//! write_property = "fastrp_vector"
//! export_page_size = 10000
//!
//! [training]
//! validation_fraction = 0.2
//! folds = 5
//! seed = 42
//! sample_size = 10000
//!
//! [training.classifier]
//! l2 = 1.0
//! max_iterations = 100
//! ```
//!
//! Every section is optional and falls back to its defaults. Invalid values
//! are rejected by [`PipelineConfig::validate`], never silently corrected.

mod embedding;
mod ingest;
mod store;
mod training;


pub use embedding::EmbeddingConfig;
pub use ingest::IngestConfig;
pub use store::StoreConfig;
pub use training::{ClassifierConfig, TrainingConfig};

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Configuration of every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Loaded config file {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> ConfigResult<Self> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate every section, returning the first error.
    pub fn validate(&self) -> ConfigResult<()> {
        self.store.validate()?;
        self.ingest.validate()?;
        self.embedding.validate()?;
        self.training.validate()
    }

    /// Apply `BIOKG_*` environment variables on top of the current values.
    ///
    /// | Variable | Config Path |
    /// |----------|-------------|
    /// | `BIOKG_NEO4J_URI` | `store.uri` |
    /// | `BIOKG_NEO4J_DATABASE` | `store.database` |
    /// | `BIOKG_NEO4J_USER` | `store.user` |
    /// | `BIOKG_NEO4J_PASSWORD` | `store.password` |
    /// | `BIOKG_BATCH_SIZE` | `ingest.batch_size` |
    /// | `BIOKG_PROJECTION_NAME` | `embedding.projection_name` |
    /// | `BIOKG_EMBEDDING_DIM` | `embedding.dimension` |
    /// | `BIOKG_WRITE_PROPERTY` | `embedding.write_property` |
    /// | `BIOKG_FOLDS` | `training.folds` |
    /// | `BIOKG_SEED` | `training.seed` |
    ///
    /// Unparseable numeric values are ignored and leave the field unchanged.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Same as [`with_env_overrides`](Self::with_env_overrides) with an
    /// arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BIOKG_NEO4J_URI") {
            self.store.uri = val;
        }
        if let Some(val) = lookup("BIOKG_NEO4J_DATABASE") {
            self.store.database = val;
        }
        if let Some(val) = lookup("BIOKG_NEO4J_USER") {
            self.store.user = Some(val);
        }
        if let Some(val) = lookup("BIOKG_NEO4J_PASSWORD") {
            self.store.password = Some(val);
        }
        if let Some(n) = lookup("BIOKG_BATCH_SIZE").and_then(|v| v.parse().ok()) {
            self.ingest.batch_size = n;
        }
        if let Some(val) = lookup("BIOKG_PROJECTION_NAME") {
            self.embedding.projection_name = val;
        }
        if let Some(n) = lookup("BIOKG_EMBEDDING_DIM").and_then(|v| v.parse().ok()) {
            self.embedding.dimension = n;
        }
        if let Some(val) = lookup("BIOKG_WRITE_PROPERTY") {
            self.embedding.write_property = val;
        }
        if let Some(n) = lookup("BIOKG_FOLDS").and_then(|v| v.parse().ok()) {
            self.training.folds = n;
        }
        if let Some(n) = lookup("BIOKG_SEED").and_then(|v| v.parse().ok()) {
            self.training.seed = Some(n);
        }
        self
    }
}
