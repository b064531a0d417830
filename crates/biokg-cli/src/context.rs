//! Configuration resolution and store construction for commands.
//!
//! Precedence, lowest first: defaults, `--config` TOML file, `BIOKG_*`
//! environment, command-line flags.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::debug;

use biokg_core::PipelineConfig;
use biokg_graph::{CypherGraphStore, GraphStore, HttpCypherClient};

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, global = true, env = "BIOKG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Graph store URI (http or https)
    #[arg(long, global = true, env = "BIOKG_NEO4J_URI")]
    pub uri: Option<String>,

    /// Graph store user
    #[arg(long, global = true, env = "BIOKG_NEO4J_USER")]
    pub user: Option<String>,

    /// Graph store password
    #[arg(long, global = true, env = "BIOKG_NEO4J_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Graph store database name
    #[arg(long, global = true, env = "BIOKG_NEO4J_DATABASE")]
    pub database: Option<String>,
}

/// Resolved configuration for one command invocation.
pub struct CommandContext {
    pub config: PipelineConfig,
}

impl CommandContext {
    pub fn resolve(args: &GlobalArgs) -> Result<Self> {
        let config = match &args.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        let mut config = config.with_env_overrides();

        if let Some(uri) = &args.uri {
            config.store.uri = uri.clone();
        }
        if let Some(user) = &args.user {
            config.store.user = Some(user.clone());
        }
        if let Some(password) = &args.password {
            config.store.password = Some(password.clone());
        }
        if let Some(database) = &args.database {
            config.store.database = database.clone();
        }

        config.validate().context("invalid configuration")?;
        debug!(uri = %config.store.uri, database = %config.store.database, "configuration resolved");
        Ok(Self { config })
    }

    /// Cypher-over-HTTP store for the configured endpoint.
    pub fn store(&self) -> Result<Arc<dyn GraphStore>> {
        let client = HttpCypherClient::new(&self.config.store)
            .context("building graph store client")?;
        Ok(Arc::new(CypherGraphStore::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nuri = \"http://file-host:7474\"\ndatabase = \"from_file\"\n\n[ingest]\nbatch_size = 42"
        )
        .unwrap();
        let args = GlobalArgs {
            config: Some(file.path().to_path_buf()),
            database: Some("from_flag".into()),
            ..GlobalArgs::default()
        };
        let ctx = CommandContext::resolve(&args).unwrap();
        assert_eq!(ctx.config.store.database, "from_flag");
        assert_eq!(ctx.config.ingest.batch_size, 42);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let args = GlobalArgs {
            uri: Some("bolt://localhost:7687".into()),
            ..GlobalArgs::default()
        };
        assert!(CommandContext::resolve(&args).is_err());
    }
}
