//! Seeded random forest classifier
//!
//! Bagged gini decision trees for the binary availability label. Trees are
//! built sequentially with a per-tree seeded RNG so the whole fit is
//! reproducible given the same seed and input order.

use crate::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// A single gini classification tree, used as a forest member
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    root: Option<TreeNode>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    /// Features considered per split (sqrt of total in the forest)
    max_features: usize,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    fn new(max_depth: Option<usize>, max_features: usize) -> Self {
        DecisionTree {
            root: None,
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features,
            feature_importances: Vec::new(),
        }
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, rng: &mut ChaCha8Rng) {
        let n_features = x.ncols();
        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, rng));

        // Normalize importances within the tree
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = importances;
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.is_some_and(|d| depth >= d)
            || is_pure(&labels);

        if should_stop {
            return TreeNode::Leaf {
                value: majority(&labels),
                n_samples,
            };
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, rng) else {
            return TreeNode::Leaf {
                value: majority(&labels),
                n_samples,
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf
        {
            return TreeNode::Leaf {
                value: majority(&labels),
                n_samples,
            };
        }

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Best (feature, threshold, gini gain) over a random feature subset
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = gini(&labels);

        let mut features: Vec<usize> = (0..n_features).collect();
        let subset: Vec<usize> = if self.max_features < n_features {
            let (picked, _) = features.partial_shuffle(rng, self.max_features);
            let mut picked = picked.to_vec();
            picked.sort_unstable();
            picked
        } else {
            features
        };

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &subset {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let mut left = ClassCounts::default();
                let mut right = ClassCounts::default();
                for &idx in indices {
                    if x[[idx, feature_idx]] <= threshold {
                        left.add(y[idx]);
                    } else {
                        right.add(y[idx]);
                    }
                }

                if left.total() < self.min_samples_leaf || right.total() < self.min_samples_leaf {
                    continue;
                }

                let n = indices.len() as f64;
                let weighted = (left.total() as f64 * left.gini()
                    + right.total() as f64 * right.gini())
                    / n;
                let gain = parent_impurity - weighted;

                if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    fn predict_sample(&self, sample: &[f64]) -> f64 {
        let mut node = self.root.as_ref().expect("tree is fitted before predict");
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Binary class counts for incremental gini evaluation
#[derive(Debug, Default, Clone, Copy)]
struct ClassCounts {
    negative: usize,
    positive: usize,
}

impl ClassCounts {
    fn add(&mut self, label: f64) {
        if label >= 0.5 {
            self.positive += 1;
        } else {
            self.negative += 1;
        }
    }

    fn total(&self) -> usize {
        self.negative + self.positive
    }

    fn gini(&self) -> f64 {
        let n = self.total() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let p_pos = self.positive as f64 / n;
        let p_neg = self.negative as f64 / n;
        1.0 - p_pos * p_pos - p_neg * p_neg
    }
}

fn gini(labels: &[f64]) -> f64 {
    let mut counts = ClassCounts::default();
    for &l in labels {
        counts.add(l);
    }
    counts.gini()
}

fn is_pure(labels: &[f64]) -> bool {
    labels
        .first()
        .map(|&first| labels.iter().all(|&l| (l - first).abs() < 1e-10))
        .unwrap_or(true)
}

fn majority(labels: &[f64]) -> f64 {
    let mut counts = ClassCounts::default();
    for &l in labels {
        counts.add(l);
    }
    // Ties go to the negative class, matching the strict vote threshold
    if counts.positive > counts.negative {
        1.0
    } else {
        0.0
    }
}

/// Random forest binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
    n_features: usize,
    feature_importances: Option<Vec<f64>>,
}

impl RandomForest {
    pub fn new(n_trees: usize) -> Self {
        RandomForest {
            trees: Vec::new(),
            n_trees,
            max_depth: 5,
            seed: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the forest on bootstrap samples of the training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(PipelineError::Insufficient(
                "cannot fit a forest on an empty training set".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(PipelineError::Insufficient(format!(
                "feature matrix has {} rows but target has {}",
                n_samples,
                y.len()
            )));
        }

        self.n_features = x.ncols();
        let max_features = ((self.n_features as f64).sqrt().ceil() as usize).max(1);

        let mut trees = Vec::with_capacity(self.n_trees);
        for tree_idx in 0..self.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));

            let sample_indices: Vec<usize> = (0..n_samples)
                .map(|_| (rng.next_u64() as usize) % n_samples)
                .collect();
            let x_boot = x.select(Axis(0), &sample_indices);
            let y_boot = Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

            let mut tree = DecisionTree::new(Some(self.max_depth), max_features);
            tree.fit(&x_boot, &y_boot, &mut rng);
            trees.push(tree);
        }
        self.trees = trees;
        self.compute_feature_importances();

        Ok(())
    }

    fn compute_feature_importances(&mut self) {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (i, &imp) in tree.feature_importances.iter().enumerate() {
                totals[i] += imp;
            }
        }
        let n_trees = self.trees.len() as f64;
        for imp in &mut totals {
            *imp /= n_trees;
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for imp in &mut totals {
                *imp /= sum;
            }
        }
        self.feature_importances = Some(totals);
    }

    /// Positive-class probability: fraction of trees voting 1
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::NotFitted);
        }

        let n_trees = self.trees.len() as f64;
        let proba: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let sample: Vec<f64> = x.row(i).to_vec();
                let votes = self
                    .trees
                    .iter()
                    .filter(|tree| tree.predict_sample(&sample) >= 0.5)
                    .count();
                votes as f64 / n_trees
            })
            .collect();

        Ok(Array1::from_vec(proba))
    }

    /// Majority-vote class labels (0.0 or 1.0)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Mean decrease in gini impurity per feature, normalized to sum 1
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [0.0, 0.1],
                [0.1, 0.0],
                [0.2, 0.2],
                [0.1, 0.1],
                [1.0, 1.1],
                [1.1, 1.0],
                [1.2, 1.2],
                [1.0, 1.0],
            ],
            array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        )
    }

    #[test]
    fn test_fit_predict_separable() {
        let (x, y) = separable();
        let mut forest = RandomForest::new(20).with_max_depth(3).with_seed(42);
        forest.fit(&x, &y).unwrap();

        let predictions = forest.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let mut a = RandomForest::new(15).with_seed(42);
        let mut b = RandomForest::new(15).with_seed(42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_proba_in_unit_range() {
        let (x, y) = separable();
        let mut forest = RandomForest::new(10).with_seed(7);
        forest.fit(&x, &y).unwrap();

        for &p in forest.predict_proba(&x).unwrap().iter() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = separable();
        let mut forest = RandomForest::new(10).with_seed(1);
        forest.fit(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_unfitted_fails() {
        let forest = RandomForest::new(5);
        let x = array![[0.0, 0.0]];
        assert!(forest.predict(&x).is_err());
    }

    #[test]
    fn test_empty_training_set_fails() {
        let mut forest = RandomForest::new(5);
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert!(matches!(
            forest.fit(&x, &y),
            Err(PipelineError::Insufficient(_))
        ));
    }
}
