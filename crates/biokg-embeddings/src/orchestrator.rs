//! Embedding Orchestrator.
//!
//! Stages run strictly in order: drop → project → estimate → compute →
//! export. Export pages through the store; every other stage is one store
//! call. A store failure aborts the run.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use biokg_core::EmbeddingConfig;
use biokg_graph::{
    ComputeSummary, EmbeddingParams, GraphError, GraphStore, MemoryEstimate, ProjectionSummary,
};

use crate::error::{AtStage, EmbeddingError, EmbeddingResult, EmbeddingStage};
use crate::export::{partial_path, EmbeddingWriter, ExportSummary};

/// Outcome of a full embedding run.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Whether a stale projection was dropped first.
    pub dropped_stale: bool,
    pub projection: ProjectionSummary,
    pub estimate: MemoryEstimate,
    pub compute: ComputeSummary,
    pub export: ExportSummary,
}

/// Drives projection, embedding and export against one store.
pub struct EmbeddingOrchestrator {
    store: Arc<dyn GraphStore>,
    config: EmbeddingConfig,
    estimate: Option<MemoryEstimate>,
}

impl EmbeddingOrchestrator {
    pub fn new(store: Arc<dyn GraphStore>, config: EmbeddingConfig) -> Self {
        Self {
            store,
            config,
            estimate: None,
        }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// The estimate recorded by the last [`estimate`](Self::estimate) call.
    pub fn last_estimate(&self) -> Option<&MemoryEstimate> {
        self.estimate.as_ref()
    }

    fn params(&self) -> EmbeddingParams {
        EmbeddingParams {
            dimension: self.config.dimension,
            write_property: self.config.write_property.clone(),
            random_seed: self.config.random_seed,
        }
    }

    /// Drop the configured projection if it exists.
    pub async fn drop_projection(&self) -> EmbeddingResult<bool> {
        let name = &self.config.projection_name;
        let dropped = self
            .store
            .drop_projection(name)
            .await
            .at_stage(EmbeddingStage::Drop)?;
        if dropped {
            info!("Dropped stale projection '{}'", name);
        } else {
            info!("No projection '{}' to drop", name);
        }
        Ok(dropped)
    }

    /// Project every stored node and relationship under the configured name.
    pub async fn project(&self) -> EmbeddingResult<ProjectionSummary> {
        let name = &self.config.projection_name;
        let exists = self
            .store
            .projection_exists(name)
            .await
            .at_stage(EmbeddingStage::Project)?;
        if exists {
            return Err(EmbeddingError::Graph {
                stage: EmbeddingStage::Project,
                source: GraphError::ProjectionExists(name.clone()),
            });
        }
        let summary = self
            .store
            .project(name)
            .await
            .at_stage(EmbeddingStage::Project)?;
        info!(
            "Projected '{}': {} nodes, {} relationships",
            summary.name, summary.node_count, summary.relationship_count
        );
        Ok(summary)
    }

    /// Estimate memory for the configured dimension. Advisory only.
    pub async fn estimate(&mut self) -> EmbeddingResult<MemoryEstimate> {
        let estimate = self
            .store
            .estimate_embedding_memory(&self.config.projection_name, &self.params())
            .await
            .at_stage(EmbeddingStage::Estimate)?;
        info!(
            "Estimated memory for {}-dimensional embeddings: {} ({}..{} bytes)",
            self.config.dimension, estimate.required_memory, estimate.bytes_min, estimate.bytes_max
        );
        self.estimate = Some(estimate.clone());
        Ok(estimate)
    }

    /// Compute embeddings and write them to the configured property.
    pub async fn compute(&mut self) -> EmbeddingResult<ComputeSummary> {
        if self.estimate.is_none() {
            return Err(EmbeddingError::StageOrder {
                stage: EmbeddingStage::Compute,
                requires: EmbeddingStage::Estimate,
            });
        }
        let summary = self
            .store
            .compute_embeddings(&self.config.projection_name, &self.params())
            .await
            .at_stage(EmbeddingStage::Compute)?;
        info!(
            "Wrote '{}' on {} nodes in {} ms",
            self.config.write_property, summary.node_properties_written, summary.compute_millis
        );
        Ok(summary)
    }

    /// Export every node carrying the embedding property to `path`.
    ///
    /// Rows are written page by page into a staging file that replaces
    /// `path` only when the whole export succeeded.
    pub async fn export(&self, path: impl AsRef<Path>) -> EmbeddingResult<ExportSummary> {
        let path = path.as_ref();
        let staging = partial_path(path);
        let rows = match self.write_pages(&staging).await {
            Ok(rows) => rows,
            Err(e) => {
                if let Err(remove) = std::fs::remove_file(&staging) {
                    warn!("Could not remove {}: {}", staging.display(), remove);
                }
                return Err(e);
            }
        };
        std::fs::rename(&staging, path)?;

        if rows == 0 {
            warn!(
                "No node carries '{}'; exported an empty file",
                self.config.write_property
            );
        }
        info!("Exported {} embeddings to {}", rows, path.display());
        Ok(ExportSummary {
            path: path.to_path_buf(),
            rows,
            dimension: self.config.dimension,
        })
    }

    async fn write_pages(&self, staging: &Path) -> EmbeddingResult<usize> {
        let property = &self.config.write_property;
        let page_size = self.config.export_page_size;
        let file = File::create(staging)?;
        let mut writer = EmbeddingWriter::new(BufWriter::new(file), property, self.config.dimension)?;

        let mut skip = 0u64;
        loop {
            let page = self
                .store
                .embeddings_page(property, skip, page_size)
                .await
                .at_stage(EmbeddingStage::Export)?;
            for embedding in &page {
                writer.write(embedding)?;
            }
            debug!(skip, rows = page.len(), "export page written");
            if page.len() < page_size {
                break;
            }
            skip += page.len() as u64;
        }
        writer.finish()
    }

    /// Run every stage in order.
    pub async fn run(&mut self, path: impl AsRef<Path>) -> EmbeddingResult<EmbeddingRunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting embedding run");

        let dropped_stale = self.drop_projection().await?;
        let projection = self.project().await?;
        let estimate = self.estimate().await?;
        let compute = self.compute().await?;
        let export = self.export(path).await?;

        let finished_at = Utc::now();
        info!(%run_id, "Embedding run finished");
        Ok(EmbeddingRunReport {
            run_id,
            started_at,
            finished_at,
            dropped_stale,
            projection,
            estimate,
            compute,
            export,
        })
    }
}
