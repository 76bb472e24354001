//! Baseline classifiers and the persisted model artifact

pub mod artifact;
pub mod forest;
pub mod logistic;

pub use artifact::ModelArtifact;
pub use forest::RandomForest;
pub use logistic::LogisticRegression;

use crate::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A trained baseline classifier of either variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    /// Identifier used for artifact naming and selection reporting
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::RandomForest(_) => "RandomForest",
            Classifier::LogisticRegression(_) => "LogisticRegression",
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(m) => m.predict(x),
            Classifier::LogisticRegression(m) => m.predict(x),
        }
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(m) => m.predict_proba(x),
            Classifier::LogisticRegression(m) => m.predict_proba(x),
        }
    }

    /// Per-feature importance scores, for variants that expose them
    pub fn feature_importances(&self) -> Option<&[f64]> {
        match self {
            Classifier::RandomForest(m) => m.feature_importances(),
            Classifier::LogisticRegression(_) => None,
        }
    }
}
