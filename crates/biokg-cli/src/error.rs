//! Exit codes and fatal error reporting.
//!
//! Exit codes:
//! - 0: stage completed cleanly
//! - 1: stage completed, faults were collected and reported
//! - 2: stage aborted (store failure, failed precondition, class imbalance, bad config)

use std::process::ExitCode;

use biokg_embeddings::EmbeddingError;
use biokg_graph::GraphError;
use biokg_train::TrainError;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CliExitCode {
    Success = 0,
    /// Completed with collected faults.
    Faults = 1,
    /// Aborted.
    Fatal = 2,
}

impl CliExitCode {
    /// `Faults` when anything was collected, else `Success`.
    pub fn from_fault_count(faults: usize) -> Self {
        if faults == 0 {
            Self::Success
        } else {
            Self::Faults
        }
    }
}

impl From<CliExitCode> for ExitCode {
    fn from(code: CliExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// An operator hint for errors with a known remedy.
pub fn remedy_for(err: &anyhow::Error) -> Option<&'static str> {
    for cause in err.chain() {
        if let Some(graph) = cause.downcast_ref::<GraphError>() {
            match graph {
                GraphError::WipeNotConfirmed { .. } => {
                    return Some("rerun with --force to wipe the store")
                }
                GraphError::ProjectionExists(_) => {
                    return Some("run `biokg embed drop-projection` first")
                }
                GraphError::ProjectionNotFound(_) => {
                    return Some("run `biokg embed project` first")
                }
                GraphError::Connection { .. } => {
                    return Some("check --uri, --user and --password")
                }
                _ => {}
            }
        }
        if let Some(EmbeddingError::StageOrder { .. }) = cause.downcast_ref::<EmbeddingError>() {
            return Some("run the embedding stages in order: drop, project, estimate, compute, export");
        }
        if let Some(TrainError::ClassBalance { .. }) = cause.downcast_ref::<TrainError>() {
            return Some("the ground truth needs both labels in every fold; use a larger --sample or fewer --folds");
        }
    }
    None
}

/// Log and print a fatal error. Always returns [`CliExitCode::Fatal`].
pub fn report_fatal(err: &anyhow::Error) -> CliExitCode {
    error!("{:#}", err);
    eprintln!("Error: {:#}", err);
    if let Some(hint) = remedy_for(err) {
        eprintln!("Hint: {}", hint);
    }
    CliExitCode::Fatal
}
