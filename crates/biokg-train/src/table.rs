//! Embeddings and ground truth read back from disk.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use csv::ReaderBuilder;
use rand::seq::index;
use tracing::{debug, info, warn};

use biokg_core::{decode_ground_truth, parse_vector, read_records, DecodeFault, GroundTruthPair};

use crate::error::{TrainError, TrainResult};
use crate::seeded_rng;

/// Entity id → embedding vector, all of one dimension.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    dimension: usize,
    vectors: HashMap<String, Vec<f64>>,
    /// Rows that could not be decoded, in file order.
    pub faults: Vec<DecodeFault>,
}

impl EmbeddingTable {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    /// Read an embeddings file: column 1 is the id, column 2 the vector.
    /// The second column may carry any property name.
    pub fn from_path(path: impl AsRef<Path>, dimension: usize) -> TrainResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, dimension).map_err(|e| match e {
            TrainError::Format { details, .. } => TrainError::Format {
                path: path.display().to_string(),
                details,
            },
            other => other,
        })?;
        info!(
            "Read {} embeddings from {} ({} faults)",
            table.len(),
            path.display(),
            table.faults.len()
        );
        Ok(table)
    }

    pub fn from_reader<R: io::Read>(input: R, dimension: usize) -> TrainResult<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
        if reader.headers()?.len() < 2 {
            return Err(TrainError::Format {
                path: "<input>".to_string(),
                details: "expected at least two columns: id and vector".to_string(),
            });
        }

        let mut table = Self::new(dimension);
        for result in reader.records() {
            let record = result?;
            let position = record.position().map(|p| p.line()).unwrap_or(0);
            let id = record.get(0).map(str::trim).unwrap_or_default();
            if id.is_empty() {
                table.faults.push(DecodeFault::missing_field(position, None, "id"));
                continue;
            }
            let vector = match record.get(1) {
                Some(text) => parse_vector(text, dimension),
                None => Err(DecodeFault::missing_field(position, Some(id), "vector")),
            };
            match vector {
                Ok(vector) => {
                    if table.vectors.contains_key(id) {
                        table.faults.push(DecodeFault::duplicate_id(position, id));
                    } else {
                        table.vectors.insert(id.to_string(), vector);
                    }
                }
                Err(fault) => table.faults.push(fault.at(position, Some(id))),
            }
        }
        if !table.faults.is_empty() {
            warn!("{} embedding rows could not be decoded", table.faults.len());
        }
        Ok(table)
    }

    /// Add or replace one vector.
    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f64>) -> TrainResult<()> {
        if vector.len() != self.dimension {
            return Err(TrainError::Shape(format!(
                "vector of length {} in a table of dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        self.vectors.insert(id.into(), vector);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Labelled pairs plus the rows that failed to decode.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    pub pairs: Vec<GroundTruthPair>,
    pub faults: Vec<DecodeFault>,
}

/// Read a `source,target,y` file.
pub fn read_ground_truth(path: impl AsRef<Path>) -> TrainResult<GroundTruth> {
    let path = path.as_ref();
    let mut truth = GroundTruth::default();
    for record in read_records(path)? {
        match decode_ground_truth(&record) {
            Ok(pair) => truth.pairs.push(pair),
            Err(fault) => truth.faults.push(fault),
        }
    }
    info!(
        "Read {} ground-truth pairs from {} ({} faults)",
        truth.pairs.len(),
        path.display(),
        truth.faults.len()
    );
    Ok(truth)
}

/// Random sample of `size` pairs, kept in file order.
///
/// Returns every pair when `size` is at least the number available.
pub fn sample_pairs(
    pairs: Vec<GroundTruthPair>,
    size: usize,
    seed: Option<u64>,
) -> Vec<GroundTruthPair> {
    if size >= pairs.len() {
        return pairs;
    }
    let mut rng = seeded_rng(seed);
    let mut chosen = index::sample(&mut rng, pairs.len(), size).into_vec();
    chosen.sort_unstable();
    debug!("Sampled {} of {} ground-truth pairs", size, pairs.len());

    let mut keep = chosen.into_iter().peekable();
    pairs
        .into_iter()
        .enumerate()
        .filter_map(|(i, pair)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(pair)
            } else {
                None
            }
        })
        .collect()
}
