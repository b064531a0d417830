//! Embedding run settings.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::DEFAULT_EMBEDDING_DIM;

fn default_projection_name() -> String {
    "projection".to_string()
}

fn default_dimension() -> usize {
    DEFAULT_EMBEDDING_DIM
}

fn default_write_property() -> String {
    "fastrp_vector".to_string()
}

fn default_export_page_size() -> usize {
    10_000
}

/// Projection, FastRP and export parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Name of the ephemeral projection. Must be unique per concurrent run.
    #[serde(default = "default_projection_name")]
    pub projection_name: String,

    /// Embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Node property receiving the vector; also the export's second column.
    #[serde(default = "default_write_property")]
    pub write_property: String,

    /// Seed for the embedding algorithm. Unseeded runs are not reproducible.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Rows fetched from the store per export request.
    #[serde(default = "default_export_page_size")]
    pub export_page_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            projection_name: default_projection_name(),
            dimension: default_dimension(),
            write_property: default_write_property(),
            random_seed: None,
            export_page_size: default_export_page_size(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.projection_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                section: "embedding",
                field: "projection_name",
                message: "must not be empty".to_string(),
            });
        }
        if self.dimension == 0 {
            return Err(ConfigError::Invalid {
                section: "embedding",
                field: "dimension",
                message: "must be > 0".to_string(),
            });
        }
        if self.export_page_size == 0 {
            return Err(ConfigError::Invalid {
                section: "embedding",
                field: "export_page_size",
                message: "must be > 0".to_string(),
            });
        }
        let valid_property = !self.write_property.is_empty()
            && self
                .write_property
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_property {
            return Err(ConfigError::Invalid {
                section: "embedding",
                field: "write_property",
                message: format!(
                    "'{}' must be non-empty and contain only [A-Za-z0-9_]",
                    self.write_property
                ),
            });
        }
        Ok(())
    }
}
