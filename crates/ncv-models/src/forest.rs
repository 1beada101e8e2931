//! Bagged regression trees fitted on the rayon pool.

use ndarray::{Array1, Array2, Axis};
use ncv_types::{ModelError, NcvResult, SplitCriterion};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::regressor::{check_fit_input, check_predict_input, Regressor};
use crate::tree::DecisionTreeRegressor;

/// Forest settings that stay fixed across a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub criterion: SplitCriterion,
    pub bootstrap: bool,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Base seed; tree `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            criterion: SplitCriterion::AbsoluteError,
            bootstrap: true,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTreeRegressor>,
    pub n_estimators: usize,
    /// Features considered at each split (absolute count).
    pub max_features: usize,
    pub config: ForestConfig,
    n_features: usize,
}

impl RandomForest {
    pub fn new(n_estimators: usize, max_features: usize) -> NcvResult<Self> {
        if n_estimators == 0 {
            return Err(ModelError::InvalidParameter {
                parameter: "n_estimators".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if max_features == 0 {
            return Err(ModelError::InvalidParameter {
                parameter: "max_features".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(Self {
            trees: Vec::new(),
            n_estimators,
            max_features,
            config: ForestConfig::default(),
            n_features: 0,
        })
    }

    pub fn with_config(mut self, config: ForestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn trees(&self) -> &[DecisionTreeRegressor] {
        &self.trees
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if self.max_features > n_features {
            return Err(ModelError::InvalidParameter {
                parameter: "max_features".to_string(),
                message: format!("{} exceeds the {} available features", self.max_features, n_features),
            }
            .into());
        }

        let config = self.config;
        let max_features = self.max_features;

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));

                let mut tree = DecisionTreeRegressor::new(config.criterion)
                    .with_min_samples_split(config.min_samples_split)
                    .with_min_samples_leaf(config.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_seed(rng.next_u64());
                if let Some(depth) = config.max_depth {
                    tree = tree.with_max_depth(depth);
                }

                if config.bootstrap {
                    let sample: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                    let x_boot = x.select(Axis(0), &sample);
                    let y_boot = y.select(Axis(0), &sample);
                    tree.fit(&x_boot, &y_boot)?;
                } else {
                    tree.fit(x, y)?;
                }
                Ok(tree)
            })
            .collect::<NcvResult<Vec<_>>>()?;

        tracing::debug!(
            "Fitted {} trees (max_features={}, criterion={:?}) on {} rows",
            trees.len(),
            max_features,
            config.criterion,
            n_samples
        );
        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> NcvResult<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted.into());
        }
        check_predict_input(x, self.n_features)?;

        let sum = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .try_reduce(|| Array1::zeros(x.nrows()), |acc, p| Ok(acc + p))?;
        Ok(sum / self.trees.len() as f64)
    }

    fn name(&self) -> &'static str {
        "RandomForestRegressor"
    }
}
