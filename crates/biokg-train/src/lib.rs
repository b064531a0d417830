//! Link-Feature Builder and Training Evaluator.
//!
//! - **table**: embeddings and ground truth read back from disk
//! - **features**: pairwise feature rows `embedding(source) ++ embedding(target)`
//! - **split**: seeded train/validation split and k-fold partitioning
//! - **metrics**: ROC-AUC
//! - **classifier**: the [`Classifier`] seam and the default `linfa` logistic regression
//! - **evaluator**: cross-validated training and final validation
//!
//! Every random choice goes through [`seeded_rng`], so a fixed seed gives a
//! reproducible run.

pub mod classifier;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod metrics;
pub mod split;
pub mod table;

pub use classifier::{Classifier, ClassifierFactory, LogisticRegression, LogisticRegressionFactory};
pub use error::{ScoreStage, TrainError, TrainResult};
pub use evaluator::{Evaluation, EvaluationReport, TrainingEvaluator};
pub use features::{build_features, ExcludedPair, FeatureSet};
pub use metrics::{class_counts, roc_auc};
pub use split::{train_validation_split, Fold, KFold, Split};
pub use table::{read_ground_truth, sample_pairs, EmbeddingTable, GroundTruth};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// RNG for sampling, splitting and shuffling. `None` seeds from entropy.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
