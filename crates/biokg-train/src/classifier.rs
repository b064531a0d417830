//! Binary classifiers.
//!
//! [`Classifier`] is the seam for any model exposing `fit` and
//! `predict_proba`. [`LogisticRegression`] is the default: it wraps
//! `linfa-logistic`, an L2-regularised logistic regression solved with
//! L-BFGS from zero weights, so training is deterministic for a given input.

use std::path::Path;

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression as LogisticParams};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::Serialize;
use tracing::debug;

use biokg_core::ClassifierConfig;

use crate::error::{TrainError, TrainResult};

/// A trainable binary classifier.
pub trait Classifier: Send {
    /// Short model name for reports.
    fn name(&self) -> &str;

    /// Fit on rows `x` with labels `y` in {0, 1}.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> TrainResult<()>;

    /// Probability of the positive class for every row.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> TrainResult<Array1<f64>>;

    /// Serialized form of the fitted model.
    fn to_json(&self) -> TrainResult<String>;

    /// Write [`to_json`](Self::to_json) to `path`.
    fn save(&self, path: &Path) -> TrainResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Produces a fresh, unfitted model for every fold.
pub trait ClassifierFactory: Send + Sync {
    fn create(&self) -> Box<dyn Classifier>;
}

impl<F> ClassifierFactory for F
where
    F: Fn() -> Box<dyn Classifier> + Send + Sync,
{
    fn create(&self) -> Box<dyn Classifier> {
        self()
    }
}

/// Persisted form of a fitted [`LogisticRegression`].
#[derive(Debug, Serialize)]
struct SavedModel<'a> {
    model: &'a str,
    config: &'a ClassifierConfig,
    weights: Vec<f64>,
    intercept: f64,
}

/// Logistic regression with an L2 penalty on the weights.
pub struct LogisticRegression {
    config: ClassifierConfig,
    fitted: Option<FittedLogisticRegression<f64, usize>>,
}

impl LogisticRegression {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    fn fitted(&self) -> TrainResult<&FittedLogisticRegression<f64, usize>> {
        self.fitted.as_ref().ok_or(TrainError::NotFitted)
    }
}

/// Factory for the default model.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegressionFactory {
    pub config: ClassifierConfig,
}

impl ClassifierFactory for LogisticRegressionFactory {
    fn create(&self) -> Box<dyn Classifier> {
        Box::new(LogisticRegression::new(self.config.clone()))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> TrainResult<()> {
        if x.nrows() != y.len() {
            return Err(TrainError::Shape(format!(
                "{} rows for {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(TrainError::InsufficientRows {
                details: "cannot fit on zero rows".to_string(),
            });
        }

        let targets: Array1<usize> = y.mapv(|label| usize::from(label > 0.5));
        let dataset = Dataset::new(x.to_owned(), targets);
        let fitted = LogisticParams::default()
            .alpha(self.config.l2)
            .max_iterations(self.config.max_iterations)
            .gradient_tolerance(self.config.gradient_tolerance)
            .fit(&dataset)
            .map_err(|e| TrainError::Model(e.to_string()))?;

        debug!(
            rows = x.nrows(),
            features = x.ncols(),
            max_iterations = self.config.max_iterations,
            "logistic regression fitted"
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> TrainResult<Array1<f64>> {
        let fitted = self.fitted()?;
        let features = fitted.params().len();
        if x.ncols() != features {
            return Err(TrainError::Shape(format!(
                "{} features for a model of {}",
                x.ncols(),
                features
            )));
        }
        let proba = fitted.predict_probabilities(&x);
        // Probabilities are for whichever class the solver labelled positive.
        if fitted.labels().pos.class == 1 {
            Ok(proba)
        } else {
            Ok(proba.mapv(|p| 1.0 - p))
        }
    }

    fn to_json(&self) -> TrainResult<String> {
        let fitted = self.fitted()?;
        let saved = SavedModel {
            model: self.name(),
            config: &self.config,
            weights: fitted.params().to_vec(),
            intercept: fitted.intercept(),
        };
        Ok(serde_json::to_string_pretty(&saved)?)
    }
}
