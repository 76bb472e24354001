//! Train/test partitioning for the labeled working set

use crate::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A stratified train/holdout partition of the labeled dataset
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl TrainTestSplit {
    pub fn train_len(&self) -> usize {
        self.y_train.len()
    }

    pub fn test_len(&self) -> usize {
        self.y_test.len()
    }
}

/// Split rows into train and holdout partitions, stratified by label.
///
/// Indices are shuffled per class with a seeded RNG and allocated so each
/// partition preserves the class proportions within rounding. Fails if the
/// dataset is empty, carries a single class, or has a class with fewer than
/// two members; every class must place at least one row in each partition,
/// so neither partition can come out empty.
pub fn stratified_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if y.is_empty() {
        return Err(PipelineError::Insufficient(
            "no labeled rows to split".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(PipelineError::Insufficient(format!(
            "feature matrix has {} rows but target has {}",
            x.nrows(),
            y.len()
        )));
    }
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(PipelineError::Config(format!(
            "test fraction must be in [0, 1), got {}",
            test_fraction
        )));
    }

    // BTreeMap keeps class iteration order stable across runs
    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        by_class.entry(label.round() as i64).or_default().push(idx);
    }

    if by_class.len() < 2 {
        return Err(PipelineError::Insufficient(
            "single-class label distribution; need both labels to stratify".to_string(),
        ));
    }
    for (class, indices) in &by_class {
        if indices.len() < 2 {
            return Err(PipelineError::Insufficient(format!(
                "class {} has only {} row(s); need at least 2 per class to stratify",
                class,
                indices.len()
            )));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
        test_indices.extend_from_slice(&indices[..n_test]);
        train_indices.extend_from_slice(&indices[n_test..]);
    }

    // Restore source row order within each partition
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: Array1::from_vec(train_indices.iter().map(|&i| y[i]).collect()),
        y_test: Array1::from_vec(test_indices.iter().map(|&i| y[i]).collect()),
    })
}
