//! Target labeling and feature preparation
//!
//! Pure functions over the feature records pulled from the store: derive the
//! binary low-availability label and assemble the numeric feature matrix.

use crate::FeatureRecord;
use ndarray::{Array1, Array2};

/// Feature columns, in training order. Persisted verbatim in the artifact;
/// any future prediction input must follow this exact order.
pub const FEATURE_COLUMNS: [&str; 7] = [
    "appearances",
    "starts",
    "ppg",
    "minutes",
    "appearance_ratio",
    "minutes_ratio",
    "season_start_year",
];

/// A season counts as low availability below this minutes-ratio threshold
pub const LOW_AVAILABILITY_THRESHOLD: f64 = 0.4;

/// Derive the binary target: 1 where `minutes_ratio < 0.4`, else 0.
///
/// Strict comparison: a ratio of exactly 0.4 labels 0. Deterministic and
/// idempotent; the input records are not mutated.
pub fn label_low_availability(records: &[FeatureRecord]) -> Vec<u8> {
    records
        .iter()
        .map(|r| u8::from(r.minutes_ratio < LOW_AVAILABILITY_THRESHOLD))
        .collect()
}

/// Label distribution summary for run diagnostics
#[derive(Debug, Clone, Copy)]
pub struct LabelSummary {
    pub positive: usize,
    pub negative: usize,
}

impl LabelSummary {
    pub fn from_labels(labels: &[u8]) -> Self {
        let positive = labels.iter().filter(|&&l| l == 1).count();
        LabelSummary {
            positive,
            negative: labels.len() - positive,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative
    }

    /// Fraction of seasons labeled low availability
    pub fn positive_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.positive as f64 / self.total() as f64
        }
    }
}

/// Assemble the feature matrix and target vector.
///
/// Selects the [`FEATURE_COLUMNS`] subset in order. A missing `ppg` becomes
/// 0.0 rather than dropping the row; keeping every season in the working set
/// matters more here than imputation accuracy.
pub fn prepare(records: &[FeatureRecord], labels: &[u8]) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::zeros((records.len(), FEATURE_COLUMNS.len()));
    for (i, record) in records.iter().enumerate() {
        let row = feature_row(record);
        for (j, value) in row.iter().enumerate() {
            x[[i, j]] = *value;
        }
    }
    let y = Array1::from_vec(labels.iter().map(|&l| l as f64).collect());
    (x, y)
}

/// One record as a numeric row in [`FEATURE_COLUMNS`] order
pub fn feature_row(record: &FeatureRecord) -> [f64; 7] {
    [
        record.appearances as f64,
        record.starts as f64,
        record.ppg.unwrap_or(0.0),
        record.minutes as f64,
        record.appearance_ratio,
        record.minutes_ratio,
        record.season_start_year as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_ratio(minutes_ratio: f64) -> FeatureRecord {
        FeatureRecord {
            season: "1992-93".to_string(),
            club: "Ajax".to_string(),
            competition: "Eredivisie".to_string(),
            appearances: 30,
            starts: 28,
            ppg: Some(0.52),
            minutes: 2400,
            appearance_ratio: 0.79,
            minutes_ratio,
            season_start_year: 1992,
        }
    }

    #[test]
    fn test_label_threshold_is_exact() {
        let records = vec![
            record_with_ratio(0.39999),
            record_with_ratio(0.4),
            record_with_ratio(0.40001),
        ];
        assert_eq!(label_low_availability(&records), vec![1, 0, 0]);
    }

    #[test]
    fn test_labeling_is_idempotent() {
        let records = vec![record_with_ratio(0.2), record_with_ratio(0.9)];
        let first = label_low_availability(&records);
        let second = label_low_availability(&records);
        assert_eq!(first, second);
        assert_eq!(first, vec![1, 0]);
    }

    #[test]
    fn test_missing_ppg_filled_with_zero() {
        let mut record = record_with_ratio(0.5);
        record.ppg = None;
        let labels = label_low_availability(std::slice::from_ref(&record));
        let (x, y) = prepare(&[record], &labels);

        // Row is kept, ppg slot (column 2) is zero
        assert_eq!(x.nrows(), 1);
        assert_eq!(x[[0, 2]], 0.0);
        assert_eq!(y[0], 0.0);
    }

    #[test]
    fn test_feature_column_order() {
        let record = record_with_ratio(0.3);
        let labels = label_low_availability(std::slice::from_ref(&record));
        let (x, y) = prepare(std::slice::from_ref(&record), &labels);

        assert_eq!(x.ncols(), FEATURE_COLUMNS.len());
        assert_eq!(x[[0, 0]], 30.0); // appearances
        assert_eq!(x[[0, 1]], 28.0); // starts
        assert_eq!(x[[0, 2]], 0.52); // ppg
        assert_eq!(x[[0, 3]], 2400.0); // minutes
        assert_eq!(x[[0, 4]], 0.79); // appearance_ratio
        assert_eq!(x[[0, 5]], 0.3); // minutes_ratio
        assert_eq!(x[[0, 6]], 1992.0); // season_start_year
        assert_eq!(y[0], 1.0);
    }

    #[test]
    fn test_label_summary() {
        let summary = LabelSummary::from_labels(&[1, 0, 0, 1, 0]);
        assert_eq!(summary.positive, 2);
        assert_eq!(summary.negative, 3);
        assert!((summary.positive_rate() - 0.4).abs() < 1e-12);
    }
}
