//! Ingestion settings.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn default_batch_size() -> usize {
    100
}

fn default_fault_preview() -> usize {
    5
}

/// Controls how decoded drafts are written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records per store transaction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of offending ids listed in fault summaries.
    #[serde(default = "default_fault_preview")]
    pub fault_preview: usize,

    /// Also label nodes with every entry of `all_categories`.
    #[serde(default)]
    pub label_all_categories: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            fault_preview: default_fault_preview(),
            label_all_categories: false,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                section: "ingest",
                field: "batch_size",
                message: "must be > 0".to_string(),
            });
        }
        if self.batch_size > 10_000 {
            return Err(ConfigError::Invalid {
                section: "ingest",
                field: "batch_size",
                message: format!("{} exceeds the 10000 records per transaction cap", self.batch_size),
            });
        }
        Ok(())
    }
}
