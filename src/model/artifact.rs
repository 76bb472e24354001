//! Model artifact persistence
//!
//! One JSON file per training run holding the winning model, the feature
//! column order it was trained with, and its name. Overwritten wholesale on
//! the next run; no versioning. The forest additionally gets a ranked
//! feature-importance CSV report, written best-effort.

use crate::model::Classifier;
use crate::{PipelineError, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// The persisted training output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: Classifier,
    pub feature_columns: Vec<String>,
    pub model_name: String,
}

impl ModelArtifact {
    pub fn new(model: Classifier, feature_columns: Vec<String>) -> Self {
        let model_name = model.name().to_string();
        ModelArtifact {
            model,
            feature_columns,
            model_name,
        }
    }

    /// Artifact path for a model name: `<dir>/model_<name_lowercase>.json`
    pub fn path_for(model_dir: &Path, model_name: &str) -> PathBuf {
        model_dir.join(format!("model_{}.json", model_name.to_lowercase()))
    }

    /// Serialize to the model directory, creating it if needed
    pub fn save(&self, model_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(model_dir)?;
        let path = Self::path_for(model_dir, &self.model_name);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(path)
    }

    /// Load a previously persisted artifact
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::NoModel);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Feature importances paired with column names, sorted descending.
    /// None for variants without importance scores.
    pub fn ranked_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.model.feature_importances()?;
        let mut ranked: Vec<(String, f64)> = self
            .feature_columns
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Some(ranked)
    }

    /// Write the importance report CSV next to the artifact.
    ///
    /// Returns the report path, or None when the model has no importances.
    /// Failures here are isolated by the caller; they never fail the
    /// artifact itself.
    pub fn write_importance_report(&self, model_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(ranked) = self.ranked_importances() else {
            return Ok(None);
        };

        let path = model_dir.join("feature_importance.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["feature", "importance"])?;
        for (feature, importance) in &ranked {
            writer.write_record([feature.as_str(), &format!("{:.6}", importance)])?;
        }
        writer.flush()?;
        Ok(Some(path))
    }
}

/// Persist the artifact and, best-effort, its importance report.
///
/// Leftovers from a previous run that the other variant won (its JSON file,
/// a report the current winner does not produce) are removed so the
/// directory only ever reflects the latest run. Report and cleanup failures
/// are logged and swallowed; artifact failure propagates.
pub fn persist(artifact: &ModelArtifact, model_dir: &Path) -> Result<(PathBuf, Option<PathBuf>)> {
    let artifact_path = artifact.save(model_dir)?;

    for name in ["RandomForest", "LogisticRegression"] {
        let stale = ModelArtifact::path_for(model_dir, name);
        if stale != artifact_path && stale.exists() {
            if let Err(e) = std::fs::remove_file(&stale) {
                warn!("Could not remove stale artifact {}: {}", stale.display(), e);
            }
        }
    }

    let report_path = match artifact.write_importance_report(model_dir) {
        Ok(path) => path,
        Err(e) => {
            warn!("Feature importance report failed: {}", e);
            None
        }
    };
    if report_path.is_none() {
        let stale_report = model_dir.join("feature_importance.csv");
        if stale_report.exists() {
            if let Err(e) = std::fs::remove_file(&stale_report) {
                warn!(
                    "Could not remove stale importance report {}: {}",
                    stale_report.display(),
                    e
                );
            }
        }
    }

    Ok((artifact_path, report_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COLUMNS;
    use crate::model::{LogisticRegression, RandomForest};
    use ndarray::{Array1, Array2};

    fn feature_columns() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((20, 7), |(i, j)| (i * 7 + j) as f64 * 0.37);
        let y = Array1::from_shape_fn(20, |i| if i < 8 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_artifact_roundtrip_forest() {
        let (x, y) = training_data();
        let mut forest = RandomForest::new(10).with_max_depth(4).with_seed(42);
        forest.fit(&x, &y).unwrap();
        let model = Classifier::RandomForest(forest);
        let expected = model.predict(&x).unwrap();

        let artifact = ModelArtifact::new(model, feature_columns());
        let dir = tempfile::tempdir().unwrap();
        let path = artifact.save(dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "model_randomforest.json"
        );

        let reloaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(reloaded.model_name, "RandomForest");
        assert_eq!(reloaded.feature_columns, feature_columns());
        assert_eq!(reloaded.model.predict(&x).unwrap(), expected);
    }

    #[test]
    fn test_artifact_roundtrip_logistic() {
        let (x, y) = training_data();
        let mut logistic = LogisticRegression::new().with_max_iter(200);
        logistic.fit(&x, &y).unwrap();
        let model = Classifier::LogisticRegression(logistic);
        let expected = model.predict(&x).unwrap();

        let artifact = ModelArtifact::new(model, feature_columns());
        let dir = tempfile::tempdir().unwrap();
        let path = artifact.save(dir.path()).unwrap();

        let reloaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(reloaded.model_name, "LogisticRegression");
        assert_eq!(reloaded.model.predict(&x).unwrap(), expected);
    }

    #[test]
    fn test_importance_report_for_forest() {
        let (x, y) = training_data();
        let mut forest = RandomForest::new(10).with_seed(1);
        forest.fit(&x, &y).unwrap();
        let artifact = ModelArtifact::new(Classifier::RandomForest(forest), feature_columns());

        let ranked = artifact.ranked_importances().unwrap();
        assert_eq!(ranked.len(), 7);
        // Sorted descending
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }

        let dir = tempfile::tempdir().unwrap();
        let report = artifact.write_importance_report(dir.path()).unwrap();
        let report_path = report.unwrap();
        let content = std::fs::read_to_string(report_path).unwrap();
        assert!(content.starts_with("feature,importance"));
        assert_eq!(content.lines().count(), 8);
    }

    #[test]
    fn test_no_report_for_logistic() {
        let (x, y) = training_data();
        let mut logistic = LogisticRegression::new().with_max_iter(50);
        logistic.fit(&x, &y).unwrap();
        let artifact =
            ModelArtifact::new(Classifier::LogisticRegression(logistic), feature_columns());

        assert!(artifact.ranked_importances().is_none());
        let dir = tempfile::tempdir().unwrap();
        assert!(artifact
            .write_importance_report(dir.path())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_persist_clears_previous_winner() {
        let (x, y) = training_data();
        let dir = tempfile::tempdir().unwrap();

        // First run: the forest wins, leaving its JSON and the report
        let mut forest = RandomForest::new(10).with_seed(3);
        forest.fit(&x, &y).unwrap();
        let forest_artifact =
            ModelArtifact::new(Classifier::RandomForest(forest), feature_columns());
        let (forest_path, report_path) = persist(&forest_artifact, dir.path()).unwrap();
        let report_path = report_path.unwrap();
        assert!(forest_path.exists());
        assert!(report_path.exists());

        // Second run: the logistic wins; the forest JSON and its stale
        // report must be gone
        let mut logistic = LogisticRegression::new().with_max_iter(50);
        logistic.fit(&x, &y).unwrap();
        let logistic_artifact =
            ModelArtifact::new(Classifier::LogisticRegression(logistic), feature_columns());
        let (logistic_path, no_report) = persist(&logistic_artifact, dir.path()).unwrap();
        assert!(logistic_path.exists());
        assert!(no_report.is_none());
        assert!(!forest_path.exists());
        assert!(!report_path.exists());

        // Third run: the forest wins again; the logistic JSON is replaced
        let (forest_path, report_path) = persist(&forest_artifact, dir.path()).unwrap();
        assert!(forest_path.exists());
        assert!(report_path.unwrap().exists());
        assert!(!logistic_path.exists());
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = ModelArtifact::path_for(dir.path(), "RandomForest");
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(PipelineError::NoModel)
        ));
    }
}
