//! Link-Feature Builder.
//!
//! A feature row is the source embedding followed by the target embedding,
//! so a table of dimension `d` yields rows of length `2d`.

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{info, warn};

use biokg_core::GroundTruthPair;

use crate::table::EmbeddingTable;

/// A ground-truth pair left out because an endpoint has no embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedPair {
    pub pair: GroundTruthPair,
    /// The first id of the pair without an embedding.
    pub missing_id: String,
}

/// Feature matrix and labels for one training run.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// One row per kept pair, in input order.
    pub rows: Array2<f64>,
    pub labels: Array1<f64>,
    pub excluded: Vec<ExcludedPair>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&y| y > 0.5).count()
    }
}

/// Build one feature row per pair whose endpoints both have embeddings.
pub fn build_features(pairs: &[GroundTruthPair], table: &EmbeddingTable) -> FeatureSet {
    let dim = table.dimension();
    let mut kept: Vec<(&[f64], &[f64], u8)> = Vec::with_capacity(pairs.len());
    let mut excluded = Vec::new();

    for pair in pairs {
        match (table.get(&pair.source), table.get(&pair.target)) {
            (Some(source), Some(target)) => kept.push((source, target, pair.y)),
            (None, _) => excluded.push(ExcludedPair {
                pair: pair.clone(),
                missing_id: pair.source.clone(),
            }),
            (Some(_), None) => excluded.push(ExcludedPair {
                pair: pair.clone(),
                missing_id: pair.target.clone(),
            }),
        }
    }

    if !excluded.is_empty() {
        let preview: Vec<&str> = excluded
            .iter()
            .take(5)
            .map(|e| e.missing_id.as_str())
            .collect();
        warn!(
            "Excluded {} pairs without embeddings (first: {})",
            excluded.len(),
            preview.join(", ")
        );
    }
    info!("Built {} feature rows of width {}", kept.len(), dim * 2);

    let mut rows = Array2::zeros((kept.len(), dim * 2));
    for (mut row, (source, target, _)) in rows.rows_mut().into_iter().zip(&kept) {
        for (cell, value) in row.iter_mut().zip(source.iter().chain(target.iter())) {
            *cell = *value;
        }
    }
    let labels: Array1<f64> = kept.iter().map(|(_, _, y)| f64::from(*y)).collect();

    FeatureSet {
        rows,
        labels,
        excluded,
    }
}
