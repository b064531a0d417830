//! Area under the ROC curve.

use crate::error::{ScoreStage, TrainError, TrainResult};

/// Positive and negative counts of `labels`; both must be non-zero.
pub fn class_counts(labels: &[f64], stage: ScoreStage) -> TrainResult<(usize, usize)> {
    let positives = labels.iter().filter(|&&y| y > 0.5).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(TrainError::ClassBalance {
            stage,
            positives,
            negatives,
        });
    }
    Ok((positives, negatives))
}

/// ROC-AUC via the Mann-Whitney U statistic.
///
/// Tied scores share their average rank. A label `> 0.5` is positive.
/// A set without both classes is a [`TrainError::ClassBalance`].
pub fn roc_auc(labels: &[f64], scores: &[f64], stage: ScoreStage) -> TrainResult<f64> {
    if labels.len() != scores.len() {
        return Err(TrainError::Shape(format!(
            "{} labels for {} scores",
            labels.len(),
            scores.len()
        )));
    }
    let (positives, negatives) = class_counts(labels, stage)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; the tie group i..=j shares their mean.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] > 0.5 {
                positive_rank_sum += rank;
            }
        }
        i = j + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}
