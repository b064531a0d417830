//! `biokg graph` commands: clear, load and inspect the stored graph.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use biokg_graph::{GraphIngestor, LoadReport, WipeConfirmation};

use crate::context::CommandContext;
use crate::error::CliExitCode;

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Remove every node and relationship
    Clear {
        /// Wipe a non-empty store
        #[arg(long)]
        force: bool,
    },
    /// Load entities from a node CSV
    LoadNodes {
        path: PathBuf,
    },
    /// Load relations from an edge CSV
    LoadEdges {
        path: PathBuf,
    },
    /// Print node and relationship counts
    Status,
    /// Clear, then load nodes and edges
    Reload {
        nodes: PathBuf,
        edges: PathBuf,
        /// Wipe a non-empty store
        #[arg(long)]
        force: bool,
    },
}

fn print_report(report: &LoadReport, preview: usize) {
    println!("{}", report.summary(preview));
    for fault in report.faults.iter().take(preview) {
        println!("  {}", fault);
    }
}

pub async fn handle_graph_command(cmd: GraphCommands, ctx: &CommandContext) -> Result<CliExitCode> {
    let ingestor = GraphIngestor::new(ctx.store()?, ctx.config.ingest.clone());
    let preview = ctx.config.ingest.fault_preview;

    match cmd {
        GraphCommands::Clear { force } => {
            let report = ingestor
                .clear(WipeConfirmation::from(force))
                .await
                .context("graph clear failed")?;
            println!(
                "Removed {} nodes and {} relationships",
                report.nodes_removed, report.relationships_removed
            );
            Ok(CliExitCode::Success)
        }
        GraphCommands::LoadNodes { path } => {
            let report = ingestor
                .load_entities_from_path(&path)
                .await
                .context("entity load failed")?;
            print_report(&report, preview);
            Ok(CliExitCode::from_fault_count(report.fault_count()))
        }
        GraphCommands::LoadEdges { path } => {
            let report = ingestor
                .load_relations_from_path(&path)
                .await
                .context("relation load failed")?;
            print_report(&report, preview);
            Ok(CliExitCode::from_fault_count(report.fault_count()))
        }
        GraphCommands::Status => {
            let status = ingestor.status().await.context("graph status failed")?;
            println!("{}", status);
            Ok(CliExitCode::Success)
        }
        GraphCommands::Reload {
            nodes,
            edges,
            force,
        } => {
            let report = ingestor
                .reload(&nodes, &edges, WipeConfirmation::from(force))
                .await
                .context("graph reload failed")?;
            info!(run_id = %report.run_id, started_at = %report.started_at, "reload complete");
            println!(
                "Removed {} nodes and {} relationships",
                report.cleared.nodes_removed, report.cleared.relationships_removed
            );
            print_report(&report.entities, preview);
            print_report(&report.relations, preview);
            println!("{}", report.status);
            Ok(CliExitCode::from_fault_count(
                report.entities.fault_count() + report.relations.fault_count(),
            ))
        }
    }
}
