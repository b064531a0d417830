//! Training and evaluation settings.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn default_validation_fraction() -> f64 {
    0.2
}

fn default_folds() -> usize {
    5
}

fn default_seed() -> Option<u64> {
    Some(42)
}

/// Split, cross-validation and sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of labelled rows held out for the final validation score.
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,

    /// Number of cross-validation folds.
    #[serde(default = "default_folds")]
    pub folds: usize,

    /// Shuffle the training partition before cutting folds.
    #[serde(default)]
    pub shuffle_folds: bool,

    /// Seed for sampling, splitting and shuffling. `None` draws from entropy.
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,

    /// Random sample of ground-truth rows to use. `None` uses all rows.
    #[serde(default)]
    pub sample_size: Option<usize>,

    /// Default classifier hyper-parameters.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            validation_fraction: default_validation_fraction(),
            folds: default_folds(),
            shuffle_folds: false,
            seed: default_seed(),
            sample_size: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(ConfigError::Invalid {
                section: "training",
                field: "validation_fraction",
                message: format!("{} must be in (0, 1)", self.validation_fraction),
            });
        }
        if self.folds < 2 {
            return Err(ConfigError::Invalid {
                section: "training",
                field: "folds",
                message: format!("{} must be >= 2", self.folds),
            });
        }
        if self.sample_size == Some(0) {
            return Err(ConfigError::Invalid {
                section: "training",
                field: "sample_size",
                message: "must be > 0 when set".to_string(),
            });
        }
        self.classifier.validate()
    }
}

fn default_l2() -> f64 {
    1.0
}

fn default_max_iterations() -> u64 {
    100
}

fn default_gradient_tolerance() -> f64 {
    1e-4
}

/// Logistic-regression hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// L2 penalty on the weights (not the intercept).
    #[serde(default = "default_l2")]
    pub l2: f64,
    /// Solver iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Solver stops once the gradient norm falls below this.
    #[serde(default = "default_gradient_tolerance")]
    pub gradient_tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            l2: default_l2(),
            max_iterations: default_max_iterations(),
            gradient_tolerance: default_gradient_tolerance(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.l2 >= 0.0 && self.l2.is_finite()) {
            return Err(ConfigError::Invalid {
                section: "training.classifier",
                field: "l2",
                message: format!("{} must be >= 0", self.l2),
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                section: "training.classifier",
                field: "max_iterations",
                message: "must be > 0".to_string(),
            });
        }
        if !(self.gradient_tolerance > 0.0 && self.gradient_tolerance.is_finite()) {
            return Err(ConfigError::Invalid {
                section: "training.classifier",
                field: "gradient_tolerance",
                message: format!("{} must be a positive finite number", self.gradient_tolerance),
            });
        }
        Ok(())
    }
}
