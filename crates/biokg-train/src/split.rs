//! Train/validation split and k-fold partitioning.
//!
//! Both work on row indices so the caller decides how rows are stored.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::{TrainError, TrainResult};
use crate::seeded_rng;

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Shuffle `0..n` and hold out `ceil(fraction * n)` rows for validation.
pub fn train_validation_split(n: usize, fraction: f64, seed: Option<u64>) -> TrainResult<Split> {
    let validation_len = (fraction * n as f64).ceil() as usize;
    if validation_len == 0 || validation_len >= n {
        return Err(TrainError::InsufficientRows {
            details: format!(
                "{} rows cannot be split with validation fraction {}",
                n, fraction
            ),
        });
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut seeded_rng(seed));
    let train = order.split_off(validation_len);
    Ok(Split {
        train,
        validation: order,
    })
}

/// One cross-validation fold over positions `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// k contiguous folds. The first `n % k` folds hold one extra row.
#[derive(Debug, Clone)]
pub struct KFold {
    k: usize,
    shuffle: bool,
    seed: Option<u64>,
}

impl KFold {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            shuffle: false,
            seed: None,
        }
    }

    /// Shuffle positions before cutting folds.
    pub fn shuffled(mut self, seed: Option<u64>) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn split(&self, n: usize) -> TrainResult<Vec<Fold>> {
        if self.k < 2 {
            return Err(TrainError::InsufficientRows {
                details: format!("k-fold needs k >= 2, got {}", self.k),
            });
        }
        if n < self.k {
            return Err(TrainError::InsufficientRows {
                details: format!("{} rows cannot form {} folds", n, self.k),
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        if self.shuffle {
            order.shuffle(&mut seeded_rng(self.seed));
        }

        let base = n / self.k;
        let extra = n % self.k;
        let mut folds = Vec::with_capacity(self.k);
        let mut start = 0;
        for i in 0..self.k {
            let len = base + usize::from(i < extra);
            let end = start + len;
            let test = order[start..end].to_vec();
            let train = order[..start]
                .iter()
                .chain(&order[end..])
                .copied()
                .collect();
            folds.push(Fold { train, test });
            start = end;
        }
        Ok(folds)
    }
}
