//! Bagged regression-tree ensemble (random forest) used as the default
//! [`PriceModel`].
//!
//! Each tree is grown on a bootstrap sample drawn from a `ChaCha8Rng` seeded
//! with `seed + tree_index`, and at every node considers a seeded shuffle of
//! the features. Splits minimise the summed squared error of the children.
//! The same config and training rows always produce the same forest.

use crate::domain::error::PricecastError;
use crate::domain::features::{FeatureVector, TrainingSet, FEATURE_COUNT};
use crate::ports::model_port::PriceModel;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

type Row = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` tries all of them.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 300,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &Row) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

fn sse(sum: f64, sum_sq: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        (sum_sq - sum * sum / n as f64).max(0.0)
    }
}

/// A single CART regression tree.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
}

struct TreeBuilder<'a> {
    rows: &'a [Row],
    targets: &'a [f64],
    config: &'a ForestConfig,
    rng: ChaCha8Rng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &mut [usize], depth: usize) -> Node {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, q), &i| {
            let y = self.targets[i];
            (s + y, q + y * y)
        });
        let value = if n == 0 { 0.0 } else { sum / n as f64 };
        let parent_sse = sse(sum, sum_sq, n);

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < self.config.min_samples_split.max(2) || parent_sse <= 1e-12 {
            return Node::Leaf { value };
        }

        let Some(best) = self.best_split(indices, parent_sse) else {
            return Node::Leaf { value };
        };

        let (left, right) = partition(indices, |i| self.rows[i][best.feature] <= best.threshold);
        let left = self.build(left, depth + 1);
        let right = self.build(right, depth + 1);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn best_split(&mut self, indices: &mut [usize], parent_sse: f64) -> Option<SplitCandidate> {
        let min_leaf = self.config.min_samples_leaf.max(1);
        let n = indices.len();

        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(&mut self.rng);
        features.truncate(self.config.max_features.unwrap_or(FEATURE_COUNT).clamp(1, FEATURE_COUNT));

        let total_sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.targets[i].powi(2)).sum();

        let mut best: Option<SplitCandidate> = None;

        for feature in features {
            indices.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let y = self.targets[indices[pos]];
                left_sum += y;
                left_sq += y * y;

                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let here = self.rows[indices[pos]][feature];
                let next = self.rows[indices[pos + 1]][feature];
                if here >= next {
                    continue;
                }

                let split_sse = sse(left_sum, left_sq, left_n)
                    + sse(total_sum - left_sum, total_sq - left_sq, right_n);

                if split_sse < parent_sse - 1e-12
                    && best.as_ref().is_none_or(|b| split_sse < b.sse)
                {
                    let mut threshold = (here + next) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        sse: split_sse,
                    });
                }
            }
        }

        best
    }
}

/// Stable in-place partition; returns (matching, rest).
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> (&mut [usize], &mut [usize]) {
    let (mut yes, no): (Vec<usize>, Vec<usize>) = indices.iter().partition(|&&i| pred(i));
    let split = yes.len();
    yes.extend(no);
    indices.copy_from_slice(&yes);
    indices.split_at_mut(split)
}

impl RegressionTree {
    pub fn fit(rows: &[Row], targets: &[f64], sample: &[usize], config: &ForestConfig, seed: u64) -> Self {
        let mut builder = TreeBuilder {
            rows,
            targets,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        let mut indices = sample.to_vec();
        Self {
            root: builder.build(&mut indices, 0),
        }
    }

    pub fn predict_row(&self, row: &Row) -> f64 {
        self.root.predict(row)
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn predict_row(&self, row: &Row) -> Option<f64> {
        self.is_fitted()
            .then(|| mean(self.trees.iter().map(|t| t.predict_row(row))))
    }

    fn bootstrap_indices(n: usize, seed: u64) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl PriceModel for RandomForest {
    fn fit(&mut self, training: &TrainingSet) -> Result<(), PricecastError> {
        if training.is_empty() {
            return Err(PricecastError::Model {
                reason: "cannot fit on an empty training set".into(),
            });
        }
        if self.config.n_trees == 0 {
            return Err(PricecastError::Model {
                reason: "n_trees must be at least 1".into(),
            });
        }

        let rows = training.feature_matrix();
        let targets = training.targets();
        let n = rows.len();
        let full: Vec<usize> = (0..n).collect();

        self.trees = (0..self.config.n_trees)
            .map(|i| {
                let seed = self.config.seed.wrapping_add(i as u64);
                let sample = if self.config.bootstrap {
                    Self::bootstrap_indices(n, seed)
                } else {
                    full.clone()
                };
                RegressionTree::fit(&rows, &targets, &sample, &self.config, seed)
            })
            .collect();

        tracing::debug!(
            trees = self.trees.len(),
            samples = n,
            max_depth = self.trees.iter().map(RegressionTree::depth).max().unwrap_or(0),
            "random forest fitted"
        );
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, PricecastError> {
        self.predict_row(&features.to_array())
            .ok_or_else(|| PricecastError::Model {
                reason: "predict called before fit".into(),
            })
    }
}
