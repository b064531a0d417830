//! `biokg train`: build link features and run the evaluation protocol.
//!
//! Works entirely on files; no store connection is made.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use biokg_train::{
    build_features, read_ground_truth, sample_pairs, EmbeddingTable, TrainingEvaluator,
};

use crate::context::CommandContext;
use crate::error::CliExitCode;

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Ground-truth CSV with source,target,y
    #[arg(long)]
    pub ground_truth: PathBuf,

    /// Embeddings CSV as written by `biokg embed export`
    #[arg(long)]
    pub embeddings: PathBuf,

    /// Use a random sample of this many ground-truth rows
    #[arg(long)]
    pub sample: Option<usize>,

    /// Seed for sampling, splitting and fold shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Embedding dimension (defaults to the configured dimension)
    #[arg(long)]
    pub dimension: Option<usize>,

    /// Write the final model as JSON
    #[arg(long)]
    pub model_out: Option<PathBuf>,
}

pub fn handle_train_command(args: TrainArgs, ctx: &CommandContext) -> Result<CliExitCode> {
    let mut training = ctx.config.training.clone();
    if let Some(sample) = args.sample {
        training.sample_size = Some(sample);
    }
    if let Some(seed) = args.seed {
        training.seed = Some(seed);
    }
    if let Some(folds) = args.folds {
        training.folds = folds;
    }
    training.validate().context("invalid training options")?;
    let dimension = args.dimension.unwrap_or(ctx.config.embedding.dimension);

    let table = EmbeddingTable::from_path(&args.embeddings, dimension)
        .with_context(|| format!("reading embeddings from {}", args.embeddings.display()))?;
    let truth = read_ground_truth(&args.ground_truth)
        .with_context(|| format!("reading ground truth from {}", args.ground_truth.display()))?;

    let preview = ctx.config.ingest.fault_preview;
    let fault_count = table.faults.len() + truth.faults.len();
    for fault in table.faults.iter().chain(&truth.faults).take(preview) {
        warn!("{}", fault);
        println!("  {}", fault);
    }
    if fault_count > 0 {
        println!("{} input rows could not be decoded", fault_count);
    }

    let pairs = match training.sample_size {
        Some(size) => sample_pairs(truth.pairs, size, training.seed),
        None => truth.pairs,
    };
    let features = build_features(&pairs, &table);

    let evaluation = TrainingEvaluator::new(training)
        .evaluate(&features)
        .context("training failed")?;
    println!("{}", evaluation.report);

    if let Some(path) = &args.model_out {
        evaluation
            .model
            .save(path)
            .with_context(|| format!("writing model to {}", path.display()))?;
        println!("Model written to {}", path.display());
    }

    Ok(CliExitCode::from_fault_count(fault_count))
}
