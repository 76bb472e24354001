//! Baseline training and model selection
//!
//! Trains the fixed candidate set against the training partition, scores
//! each on the holdout, and picks the winner by accuracy.

use crate::data::TrainTestSplit;
use crate::model::{Classifier, LogisticRegression, RandomForest};
use crate::training::metrics::{accuracy, ClassificationReport};
use crate::{PipelineError, Result, TrainingConfig};
use log::{debug, info};
use ndarray::Array1;

/// One trained candidate with its holdout diagnostics
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub name: String,
    pub model: Classifier,
    pub accuracy: f64,
    pub predictions: Array1<f64>,
    pub probabilities: Option<Array1<f64>>,
    pub report: ClassificationReport,
}

/// Full result set of one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best_index: usize,
    pub candidates: Vec<CandidateResult>,
}

impl TrainingOutcome {
    pub fn best(&self) -> &CandidateResult {
        &self.candidates[self.best_index]
    }
}

/// Trains and compares the baseline candidates
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Trainer { config }
    }

    /// Train both baselines in fixed order and select the winner.
    ///
    /// Candidate order is part of the contract: the forest is enumerated
    /// first, so an exact accuracy tie resolves to it.
    pub fn train(&self, split: &TrainTestSplit) -> Result<TrainingOutcome> {
        if split.test_len() == 0 {
            return Err(PipelineError::Insufficient(
                "empty holdout partition; accuracy over zero samples is meaningless".to_string(),
            ));
        }

        let mut candidates = Vec::with_capacity(2);

        debug!(
            "Training candidates on {} rows, evaluating on {}",
            split.train_len(),
            split.test_len()
        );

        let mut forest = RandomForest::new(self.config.forest_trees)
            .with_max_depth(self.config.forest_max_depth)
            .with_seed(self.config.seed);
        forest.fit(&split.x_train, &split.y_train)?;
        candidates.push(self.evaluate(Classifier::RandomForest(forest), split)?);

        let mut logistic = LogisticRegression::new()
            .with_max_iter(self.config.logistic_max_iter)
            .with_learning_rate(self.config.logistic_learning_rate);
        logistic.fit(&split.x_train, &split.y_train)?;
        candidates.push(self.evaluate(Classifier::LogisticRegression(logistic), split)?);

        let best_index = select_best(&candidates);
        info!(
            "Best model: {} (accuracy {:.3})",
            candidates[best_index].name, candidates[best_index].accuracy
        );

        Ok(TrainingOutcome {
            best_index,
            candidates,
        })
    }

    fn evaluate(&self, model: Classifier, split: &TrainTestSplit) -> Result<CandidateResult> {
        let predictions = model.predict(&split.x_test)?;
        let probabilities = model.predict_proba(&split.x_test).ok();
        let acc = accuracy(&predictions, &split.y_test);
        let report = ClassificationReport::from_predictions(&predictions, &split.y_test);

        info!("{} holdout accuracy: {:.3}", model.name(), acc);

        Ok(CandidateResult {
            name: model.name().to_string(),
            model,
            accuracy: acc,
            predictions,
            probabilities,
            report,
        })
    }
}

/// Index of the candidate with the highest accuracy.
///
/// Strictly-greater comparison keeps the earliest candidate on ties, which
/// makes selection stable across runs with the same seed.
pub fn select_best(candidates: &[CandidateResult]) -> usize {
    let mut best = 0;
    for (idx, candidate) in candidates.iter().enumerate().skip(1) {
        if candidate.accuracy > candidates[best].accuracy {
            best = idx;
        }
    }
    best
}
