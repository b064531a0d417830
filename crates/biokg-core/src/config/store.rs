//! Graph store connection settings.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn default_uri() -> String {
    "http://localhost:7474".to_string()
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

/// Connection to the graph store's HTTP transactional endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URI of the store, e.g. `http://localhost:7474`.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database name used in `/db/{database}/tx/commit`.
    #[serde(default = "default_database")]
    pub database: String,

    /// Basic-auth user. No authentication when unset.
    #[serde(default)]
    pub user: Option<String>,

    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout. Embedding computation runs inside one request,
    /// so this bounds the longest stage.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            user: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.uri.starts_with("http://") || self.uri.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                section: "store",
                field: "uri",
                message: format!("'{}' must be an http:// or https:// URI", self.uri),
            });
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid {
                section: "store",
                field: "database",
                message: "must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                section: "store",
                field: "timeout_secs",
                message: "must be > 0".to_string(),
            });
        }
        if self.password.is_some() && self.user.is_none() {
            return Err(ConfigError::Invalid {
                section: "store",
                field: "user",
                message: "password given without user".to_string(),
            });
        }
        Ok(())
    }
}
