//! `biokg embed` commands: the embedding stages, singly or as one run.
//!
//! Each invocation builds a fresh orchestrator, so `compute` runs the
//! estimate itself before computing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use biokg_embeddings::EmbeddingOrchestrator;

use crate::context::CommandContext;
use crate::error::CliExitCode;

#[derive(Subcommand, Debug)]
pub enum EmbedCommands {
    /// Drop the configured projection if it exists
    DropProjection,
    /// Project the stored graph
    Project,
    /// Estimate embedding memory
    Estimate,
    /// Estimate, then compute and write embeddings
    Compute,
    /// Export embeddings to a CSV
    Export { path: PathBuf },
    /// Drop, project, estimate, compute and export
    Run { path: PathBuf },
}

pub async fn handle_embed_command(cmd: EmbedCommands, ctx: &CommandContext) -> Result<CliExitCode> {
    let mut orchestrator = EmbeddingOrchestrator::new(ctx.store()?, ctx.config.embedding.clone());

    match cmd {
        EmbedCommands::DropProjection => {
            let dropped = orchestrator.drop_projection().await?;
            let name = &orchestrator.config().projection_name;
            if dropped {
                println!("Dropped projection '{}'", name);
            } else {
                println!("No projection '{}'", name);
            }
        }
        EmbedCommands::Project => {
            let summary = orchestrator.project().await?;
            println!(
                "Projected '{}': {} nodes, {} relationships",
                summary.name, summary.node_count, summary.relationship_count
            );
        }
        EmbedCommands::Estimate => {
            let estimate = orchestrator.estimate().await?;
            println!("Required memory: {}", estimate.required_memory);
        }
        EmbedCommands::Compute => {
            let estimate = orchestrator.estimate().await?;
            println!("Required memory: {}", estimate.required_memory);
            let summary = orchestrator.compute().await?;
            println!(
                "Wrote embeddings on {} nodes in {} ms",
                summary.node_properties_written, summary.compute_millis
            );
        }
        EmbedCommands::Export { path } => {
            let summary = orchestrator
                .export(&path)
                .await
                .with_context(|| format!("exporting embeddings to {}", path.display()))?;
            println!("Exported {} embeddings to {}", summary.rows, summary.path.display());
        }
        EmbedCommands::Run { path } => {
            let report = orchestrator.run(&path).await.context("embedding run failed")?;
            println!(
                "Projected {} nodes, {} relationships",
                report.projection.node_count, report.projection.relationship_count
            );
            println!("Required memory: {}", report.estimate.required_memory);
            println!(
                "Exported {} embeddings to {}",
                report.export.rows,
                report.export.path.display()
            );
        }
    }
    Ok(CliExitCode::Success)
}
