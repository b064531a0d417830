//! Training Evaluator.
//!
//! Protocol: a seeded train/validation split, k-fold cross-validation inside
//! the training partition, then one final model fitted on the whole training
//! partition and scored once on the validation partition. Validation rows
//! never reach a fold.

use std::fmt;

use ndarray::Axis;
use serde::Serialize;
use tracing::info;

use biokg_core::TrainingConfig;

use crate::classifier::{Classifier, ClassifierFactory, LogisticRegressionFactory};
use crate::error::{ScoreStage, TrainResult};
use crate::features::FeatureSet;
use crate::metrics::{class_counts, roc_auc};
use crate::split::{train_validation_split, KFold};

/// Scores of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub model: String,
    pub train_size: usize,
    pub validation_size: usize,
    /// ROC-AUC of each fold, in fold order.
    pub fold_scores: Vec<f64>,
    pub mean_cv_auc: f64,
    pub validation_auc: f64,
    /// Ground-truth pairs dropped for lack of an embedding.
    pub excluded_pairs: usize,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.model)?;
        writeln!(
            f,
            "Rows: {} train, {} validation ({} pairs excluded)",
            self.train_size, self.validation_size, self.excluded_pairs
        )?;
        let folds: Vec<String> = self.fold_scores.iter().map(|s| format!("{:.4}", s)).collect();
        writeln!(f, "Fold AUC: [{}]", folds.join(", "))?;
        writeln!(f, "Mean CV AUC: {:.4}", self.mean_cv_auc)?;
        write!(f, "Validation AUC: {:.4}", self.validation_auc)
    }
}

/// The report plus the final model fitted on the training partition.
pub struct Evaluation {
    pub report: EvaluationReport,
    pub model: Box<dyn Classifier>,
}

impl std::fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluation")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

pub struct TrainingEvaluator {
    config: TrainingConfig,
    factory: Box<dyn ClassifierFactory>,
}

impl TrainingEvaluator {
    /// Evaluator using the default logistic regression.
    pub fn new(config: TrainingConfig) -> Self {
        let factory = LogisticRegressionFactory {
            config: config.classifier.clone(),
        };
        Self::with_factory(config, Box::new(factory))
    }

    pub fn with_factory(config: TrainingConfig, factory: Box<dyn ClassifierFactory>) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn fit_and_score(
        &self,
        features: &FeatureSet,
        train: &[usize],
        test: &[usize],
        stage: ScoreStage,
    ) -> TrainResult<(Box<dyn Classifier>, f64)> {
        let x_train = features.rows.select(Axis(0), train);
        let y_train = features.labels.select(Axis(0), train);
        let x_test = features.rows.select(Axis(0), test);
        let y_test = features.labels.select(Axis(0), test);

        // The model needs both classes to fit, and AUC needs both to score.
        class_counts(&y_train.to_vec(), stage)?;
        let mut model = self.factory.create();
        model.fit(x_train.view(), y_train.view())?;
        let scores = model.predict_proba(x_test.view())?;
        let auc = roc_auc(&y_test.to_vec(), &scores.to_vec(), stage)?;
        Ok((model, auc))
    }

    /// Run the full protocol over `features`.
    pub fn evaluate(&self, features: &FeatureSet) -> TrainResult<Evaluation> {
        let split = train_validation_split(
            features.len(),
            self.config.validation_fraction,
            self.config.seed,
        )?;
        info!(
            "Split {} rows into {} train and {} validation",
            features.len(),
            split.train.len(),
            split.validation.len()
        );

        let mut kfold = KFold::new(self.config.folds);
        if self.config.shuffle_folds {
            kfold = kfold.shuffled(self.config.seed);
        }

        let mut fold_scores = Vec::with_capacity(kfold.k());
        for (i, fold) in kfold.split(split.train.len())?.into_iter().enumerate() {
            // Fold positions index into the training partition.
            let train: Vec<usize> = fold.train.iter().map(|&p| split.train[p]).collect();
            let test: Vec<usize> = fold.test.iter().map(|&p| split.train[p]).collect();
            let (_, auc) = self.fit_and_score(features, &train, &test, ScoreStage::Fold(i + 1))?;
            info!("Fold {}/{}: AUC {:.4}", i + 1, kfold.k(), auc);
            fold_scores.push(auc);
        }
        let mean_cv_auc = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        info!("Mean CV AUC: {:.4}", mean_cv_auc);

        let (model, validation_auc) = self.fit_and_score(
            features,
            &split.train,
            &split.validation,
            ScoreStage::Validation,
        )?;
        info!("Validation AUC: {:.4}", validation_auc);

        Ok(Evaluation {
            report: EvaluationReport {
                model: model.name().to_string(),
                train_size: split.train.len(),
                validation_size: split.validation.len(),
                fold_scores,
                mean_cv_auc,
                validation_auc,
                excluded_pairs: features.excluded.len(),
            },
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2};
    use rand::Rng;

    use super::*;
    use crate::error::TrainError;
    use crate::seeded_rng;

    /// Two noisy clusters: positives around +1, negatives around -1.
    fn clusters(n: usize) -> FeatureSet {
        let mut rng = seeded_rng(Some(7));
        let mut rows = Array2::zeros((n, 4));
        let mut labels = Array1::zeros(n);
        for i in 0..n {
            let y = (i % 2) as f64;
            let center = if y > 0.5 { 1.0 } else { -1.0 };
            for j in 0..4 {
                rows[[i, j]] = center + rng.gen_range(-0.8..0.8);
            }
            labels[i] = y;
        }
        FeatureSet {
            rows,
            labels,
            excluded: vec![],
        }
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            seed: Some(11),
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_separable_data_scores_high() {
        let evaluation = TrainingEvaluator::new(config()).evaluate(&clusters(100)).unwrap();
        let report = evaluation.report;
        assert_eq!(report.train_size, 80);
        assert_eq!(report.validation_size, 20);
        assert_eq!(report.fold_scores.len(), 5);
        assert!(report.mean_cv_auc > 0.9);
        assert!(report.validation_auc > 0.9);
        assert!(report.fold_scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_single_class_fold_is_class_balance() {
        let mut features = clusters(20);
        features.labels.fill(0.0);
        let err = TrainingEvaluator::new(config())
            .evaluate(&features)
            .unwrap_err();
        assert!(matches!(
            err,
            TrainError::ClassBalance {
                stage: ScoreStage::Fold(1),
                positives: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_same_seed_same_report() {
        let a = TrainingEvaluator::new(config()).evaluate(&clusters(100)).unwrap();
        let b = TrainingEvaluator::new(config()).evaluate(&clusters(100)).unwrap();
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_custom_factory() {
        struct Constant;
        impl Classifier for Constant {
            fn name(&self) -> &str {
                "constant"
            }
            fn fit(
                &mut self,
                _x: ndarray::ArrayView2<'_, f64>,
                _y: ndarray::ArrayView1<'_, f64>,
            ) -> TrainResult<()> {
                Ok(())
            }
            fn predict_proba(&self, x: ndarray::ArrayView2<'_, f64>) -> TrainResult<Array1<f64>> {
                Ok(Array1::from_elem(x.nrows(), 0.5))
            }
            fn to_json(&self) -> TrainResult<String> {
                Ok("{}".to_string())
            }
        }

        let factory = || -> Box<dyn Classifier> { Box::new(Constant) };
        let evaluation = TrainingEvaluator::with_factory(config(), Box::new(factory))
            .evaluate(&clusters(200))
            .unwrap();
        assert_eq!(evaluation.report.model, "constant");
        assert!((evaluation.report.validation_auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_report_display() {
        let report = EvaluationReport {
            model: "logistic_regression".into(),
            train_size: 8,
            validation_size: 2,
            fold_scores: vec![0.5, 1.0],
            mean_cv_auc: 0.75,
            validation_auc: 1.0,
            excluded_pairs: 3,
        };
        let text = report.to_string();
        assert!(text.contains("Fold AUC: [0.5000, 1.0000]"));
        assert!(text.contains("3 pairs excluded"));
    }
}
