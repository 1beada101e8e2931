//! Regression tree, the building block of the random forest.

use ndarray::{Array1, Array2, ArrayView1};
use ncv_types::{ModelError, NcvResult, SplitCriterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::metrics::median;
use crate::regressor::{check_fit_input, check_predict_input, Regressor};

/// Upper bound on thresholds evaluated per feature under the absolute-error
/// criterion. Each evaluation needs two medians, so the exhaustive scan used
/// for squared error is too slow here.
pub const MAX_ABSOLUTE_ERROR_CANDIDATES: usize = 32;

/// Split depth used when `max_depth` is unset. Bounds the recursion in
/// `build` on chain-shaped trees.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    /// `None` falls back to [`DEFAULT_MAX_DEPTH`].
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random per node; `None` considers all of them.
    pub max_features: Option<usize>,
    pub criterion: SplitCriterion,
    pub seed: u64,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new(SplitCriterion::SquaredError)
    }
}

struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    cost: f64,
}

impl DecisionTreeRegressor {
    pub fn new(criterion: SplitCriterion) -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion,
            seed: 0,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map(walk).unwrap_or(0)
    }

    pub fn n_leaves(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => walk(left) + walk(right),
            }
        }
        self.root.as_ref().map(walk).unwrap_or(0)
    }

    fn leaf_value(&self, targets: &mut [f64]) -> f64 {
        match self.criterion {
            SplitCriterion::SquaredError => targets.iter().sum::<f64>() / targets.len() as f64,
            SplitCriterion::AbsoluteError => median(targets),
        }
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let mut targets: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let pure = targets.windows(2).all(|w| w[0] == w[1]);

        let should_stop = pure
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || depth >= self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);

        let best = if should_stop {
            None
        } else {
            self.find_best_split(x, y, indices, rng)
        };

        let Some(best) = best else {
            return TreeNode::Leaf {
                value: self.leaf_value(&mut targets),
                n_samples,
            };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(self.build(x, y, &left, depth + 1, rng)),
            right: Box::new(self.build(x, y, &right, depth + 1, rng)),
            n_samples,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let features: Vec<usize> = match self.max_features {
            Some(k) if k < n_features => rand::seq::index::sample(rng, n_features, k).into_vec(),
            _ => (0..n_features).collect(),
        };

        let mut best: Option<SplitCandidate> = None;
        for feature_idx in features {
            if let Some((threshold, cost)) = self.best_threshold(x.column(feature_idx), y, indices) {
                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        cost,
                    });
                }
            }
        }
        best
    }

    /// Best threshold on one feature as `(threshold, total child cost)`.
    fn best_threshold(
        &self,
        column: ArrayView1<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(f64, f64)> {
        let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (column[i], y[i])).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let leaf = self.min_samples_leaf.max(1);
        if n < 2 * leaf {
            return None;
        }
        let mut positions: Vec<usize> = (leaf..=n - leaf)
            .filter(|&k| pairs[k - 1].0 < pairs[k].0)
            .collect();
        if positions.is_empty() {
            return None;
        }

        let (position, cost) = match self.criterion {
            SplitCriterion::SquaredError => squared_error_scan(&pairs, &positions),
            SplitCriterion::AbsoluteError => {
                if positions.len() > MAX_ABSOLUTE_ERROR_CANDIDATES {
                    let m = MAX_ABSOLUTE_ERROR_CANDIDATES;
                    let last = positions.len() - 1;
                    positions = (0..m).map(|i| positions[i * last / (m - 1)]).collect();
                }
                absolute_error_scan(&pairs, &positions)
            }
        }?;

        let (lo, hi) = (pairs[position - 1].0, pairs[position].0);
        let mut threshold = lo / 2.0 + hi / 2.0;
        if threshold >= hi {
            threshold = lo;
        }
        Some((threshold, cost))
    }
}

/// Sum of squared deviations on each side, from prefix sums.
fn squared_error_scan(pairs: &[(f64, f64)], positions: &[usize]) -> Option<(usize, f64)> {
    let n = pairs.len();
    let mut prefix_sum = Vec::with_capacity(n + 1);
    let mut prefix_sq = Vec::with_capacity(n + 1);
    prefix_sum.push(0.0);
    prefix_sq.push(0.0);
    for (_, v) in pairs {
        prefix_sum.push(prefix_sum[prefix_sum.len() - 1] + v);
        prefix_sq.push(prefix_sq[prefix_sq.len() - 1] + v * v);
    }
    let (total_sum, total_sq) = (prefix_sum[n], prefix_sq[n]);

    let mut best: Option<(usize, f64)> = None;
    for &k in positions {
        let (ls, lq) = (prefix_sum[k], prefix_sq[k]);
        let (rs, rq) = (total_sum - ls, total_sq - lq);
        let cost = (lq - ls * ls / k as f64) + (rq - rs * rs / (n - k) as f64);
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((k, cost));
        }
    }
    best
}

/// Sum of absolute deviations from each side's median.
fn absolute_error_scan(pairs: &[(f64, f64)], positions: &[usize]) -> Option<(usize, f64)> {
    let mut buffer = Vec::with_capacity(pairs.len());
    let mut side_cost = |side: &[(f64, f64)]| {
        buffer.clear();
        buffer.extend(side.iter().map(|p| p.1));
        let m = median(buffer.as_mut_slice());
        buffer.iter().map(|v| (v - m).abs()).sum::<f64>()
    };

    let mut best: Option<(usize, f64)> = None;
    for &k in positions {
        let cost = side_cost(&pairs[..k]) + side_cost(&pairs[k..]);
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((k, cost));
        }
    }
    best
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<()> {
        check_fit_input(x, y)?;
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidParameter {
                parameter: "max_features".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        self.n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build(x, y, &indices, 0, &mut rng));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> NcvResult<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        check_predict_input(x, self.n_features)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => break *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                            ..
                        } => {
                            node = if row[*feature_idx] <= *threshold {
                                left.as_ref()
                            } else {
                                right.as_ref()
                            };
                        }
                    }
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "DecisionTreeRegressor"
    }
}
