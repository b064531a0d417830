//! Embeddings file writer.
//!
//! Layout: header `id,<property>`, then one row per embedded entity with the
//! vector rendered as `[v1, v2, ...]`. Rows arrive from the store in pages
//! ordered by id and are written as they arrive. The file is built under a
//! `.partial` name and only renamed into place once every row has passed the
//! consistency checks.

use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use biokg_core::format_vector;
use biokg_graph::NodeEmbedding;
use serde::Serialize;

use crate::error::{EmbeddingError, EmbeddingResult};

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub dimension: usize,
}

/// Row-at-a-time writer that rejects duplicated ids and vectors of the
/// wrong length.
pub struct EmbeddingWriter<W: io::Write> {
    csv: csv::Writer<W>,
    dimension: usize,
    seen: HashSet<String>,
}

impl<W: io::Write> EmbeddingWriter<W> {
    /// Write the header and return a writer for the rows.
    pub fn new(writer: W, property: &str, dimension: usize) -> EmbeddingResult<Self> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["id", property])?;
        Ok(Self {
            csv,
            dimension,
            seen: HashSet::new(),
        })
    }

    pub fn write(&mut self, embedding: &NodeEmbedding) -> EmbeddingResult<()> {
        if embedding.vector.len() != self.dimension {
            return Err(EmbeddingError::InconsistentExport {
                id: embedding.id.clone(),
                details: format!(
                    "vector has {} components, expected {}",
                    embedding.vector.len(),
                    self.dimension
                ),
            });
        }
        if !self.seen.insert(embedding.id.clone()) {
            return Err(EmbeddingError::InconsistentExport {
                id: embedding.id.clone(),
                details: "id appears on more than one node".to_string(),
            });
        }
        let vector = format_vector(&embedding.vector);
        self.csv.write_record([embedding.id.as_str(), vector.as_str()])?;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.seen.len()
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> EmbeddingResult<usize> {
        self.csv.flush()?;
        Ok(self.seen.len())
    }
}

/// Where an export to `path` is staged until it completes.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}
