//! Evaluation metrics for the holdout partition

use ndarray::Array1;
use std::fmt;

/// Fraction of predictions matching the target labels
pub fn accuracy(predictions: &Array1<f64>, targets: &Array1<f64>) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(targets.iter())
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count();
    correct as f64 / targets.len() as f64
}

/// Precision/recall/F1 for one class
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(tp: usize, fp: usize, fn_: usize, support: usize) -> Self {
        let precision = if tp + fp == 0 {
            0.0
        } else {
            tp as f64 / (tp + fp) as f64
        };
        let recall = if tp + fn_ == 0 {
            0.0
        } else {
            tp as f64 / (tp + fn_) as f64
        };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Per-class report over the binary holdout predictions
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub negative: ClassMetrics,
    pub positive: ClassMetrics,
    pub accuracy: f64,
}

impl ClassificationReport {
    pub fn from_predictions(predictions: &Array1<f64>, targets: &Array1<f64>) -> Self {
        let mut tp = 0;
        let mut tn = 0;
        let mut fp = 0;
        let mut fn_ = 0;
        for (p, t) in predictions.iter().zip(targets.iter()) {
            match (*p >= 0.5, *t >= 0.5) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => tn += 1,
            }
        }

        ClassificationReport {
            // For the negative class the roles of the counts flip
            negative: ClassMetrics::from_counts(tn, fn_, fp, tn + fp),
            positive: ClassMetrics::from_counts(tp, fp, fn_, tp + fn_),
            accuracy: accuracy(predictions, targets),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>16} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in [("available", &self.negative), ("low_availability", &self.positive)] {
            writeln!(
                f,
                "{:>16} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(
            f,
            "{:>16} {:>32.2} {:>10}",
            "accuracy",
            self.accuracy,
            self.negative.support + self.positive.support
        )
    }
}
