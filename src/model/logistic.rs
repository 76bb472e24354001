//! Logistic regression baseline
//!
//! Batch gradient descent with L2 regularization on standardized inputs.
//! Zero-initialized weights and a fixed iteration cap make the fit
//! deterministic for a given input order.

use crate::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Option<Array1<f64>>,
    intercept: Option<f64>,
    /// Column means/stds captured at fit time; inputs are standardized with
    /// these at prediction so raw feature scales (minutes vs ratios) do not
    /// swamp the gradient.
    feature_means: Option<Array1<f64>>,
    feature_stds: Option<Array1<f64>>,
    pub max_iter: usize,
    pub learning_rate: f64,
    /// L2 regularization strength
    pub alpha: f64,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        LogisticRegression {
            coefficients: None,
            intercept: None,
            feature_means: None,
            feature_stds: None,
            max_iter: 1000,
            learning_rate: 0.1,
            alpha: 0.01,
            tol: 1e-6,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    fn standardize(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (means, stds) = match (&self.feature_means, &self.feature_stds) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(PipelineError::NotFitted),
        };
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - means[j]) / stds[j];
            }
        }
        Ok(out)
    }

    /// Fit with batch gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 {
            return Err(PipelineError::Insufficient(
                "cannot fit logistic regression on an empty training set".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(PipelineError::Insufficient(format!(
                "feature matrix has {} rows but target has {}",
                n_samples,
                y.len()
            )));
        }

        let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        let stds = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        self.feature_means = Some(means);
        self.feature_stds = Some(stds);

        let x = self.standardize(x)?;
        let mut weights: Array1<f64> = Array1::zeros(n_features);
        let mut bias = 0.0;

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples as f64) + self.alpha * &weights;
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);

        Ok(())
    }

    /// Positive-class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(PipelineError::NotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);

        let x = self.standardize(x)?;
        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Class labels (0.0 or 1.0)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [100.0, 0.1],
                [120.0, 0.2],
                [90.0, 0.15],
                [110.0, 0.05],
                [2000.0, 0.9],
                [2200.0, 0.8],
                [1900.0, 0.95],
                [2100.0, 0.85],
            ],
            array![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        )
    }

    #[test]
    fn test_fit_predict_separable() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new().with_max_iter(1000);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_proba_orders_classes() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        // Positive rows (small minutes) should carry higher probability
        assert!(proba[0] > proba[4]);
        for &p in proba.iter() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let mut a = LogisticRegression::new();
        let mut b = LogisticRegression::new();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_predict_unfitted_fails() {
        let model = LogisticRegression::new();
        assert!(model.predict(&array![[1.0, 2.0]]).is_err());
    }
}
