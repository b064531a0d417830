//! biokg CLI
//!
//! Operator entry point for the knowledge-graph pipeline.
//!
//! # Commands
//!
//! - `graph clear|load-nodes|load-edges|status|reload`: Graph Ingestor stages
//! - `embed drop-projection|project|estimate|compute|export|run`: embedding stages
//! - `train`: link-prediction training and evaluation from files
//!
//! Exit codes: 0 success, 1 completed with collected faults, 2 fatal.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod context;
mod error;

use context::{CommandContext, GlobalArgs};
use error::{report_fatal, CliExitCode};

/// Knowledge-graph ingestion and link-prediction pipeline
#[derive(Parser)]
#[command(name = "biokg")]
#[command(version)]
#[command(about = "Load a biomedical knowledge graph, embed it and evaluate link prediction")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Graph store loading and inspection
    Graph {
        #[command(subcommand)]
        action: commands::graph::GraphCommands,
    },
    /// Projection and embedding stages
    Embed {
        #[command(subcommand)]
        action: commands::embed::EmbedCommands,
    },
    /// Train and evaluate the link classifier
    Train(commands::train::TrainArgs),
}

async fn dispatch(cli: Cli) -> anyhow::Result<CliExitCode> {
    let ctx = CommandContext::resolve(&cli.global)?;
    match cli.command {
        Commands::Graph { action } => commands::graph::handle_graph_command(action, &ctx).await,
        Commands::Embed { action } => commands::embed::handle_embed_command(action, &ctx).await,
        Commands::Train(args) => commands::train::handle_train_command(args, &ctx),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => report_fatal(&err),
    };
    code.into()
}
