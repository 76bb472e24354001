//! Model training, evaluation, and selection

pub mod metrics;
pub mod trainer;

pub use metrics::{accuracy, ClassificationReport, ClassMetrics};
pub use trainer::{select_best, CandidateResult, Trainer, TrainingOutcome};
