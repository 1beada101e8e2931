//! Elastic-net linear regression fitted by cyclic coordinate descent.
//!
//! Minimises
//!
//! ```text
//! 1 / (2 n) ||y - X w - b||^2 + alpha * l1_ratio * ||w||_1
//!     + 0.5 * alpha * (1 - l1_ratio) * ||w||_2^2
//! ```
//!
//! With `normalize` set, columns are centred and divided by their L2 norm
//! before fitting and the coefficients are mapped back afterwards, so the
//! penalty acts on the rescaled features.

use ndarray::{Array1, Array2, Axis};
use ncv_types::{ModelError, NcvResult};
use serde::{Deserialize, Serialize};

use crate::regressor::{check_fit_input, check_predict_input, Regressor};

/// Solver settings that stay fixed across a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticNetConfig {
    pub fit_intercept: bool,
    pub normalize: bool,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for ElasticNetConfig {
    fn default() -> Self {
        Self {
            fit_intercept: true,
            normalize: true,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticNet {
    pub alpha: f64,
    pub l1_ratio: f64,
    pub config: ElasticNetConfig,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    n_iter: usize,
}

impl ElasticNet {
    pub fn new(alpha: f64, l1_ratio: f64) -> NcvResult<Self> {
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(ModelError::InvalidParameter {
                parameter: "alpha".to_string(),
                message: format!("must be a non-negative number, got {alpha}"),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&l1_ratio) {
            return Err(ModelError::InvalidParameter {
                parameter: "l1_ratio".to_string(),
                message: format!("must be in [0, 1], got {l1_ratio}"),
            }
            .into());
        }
        Ok(Self {
            alpha,
            l1_ratio,
            config: ElasticNetConfig::default(),
            coefficients: None,
            intercept: 0.0,
            n_iter: 0,
        })
    }

    pub fn with_config(mut self, config: ElasticNetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coordinate-descent sweeps used by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn soft_threshold(value: f64, threshold: f64) -> f64 {
        if value > threshold {
            value - threshold
        } else if value < -threshold {
            value + threshold
        } else {
            0.0
        }
    }
}

impl Regressor for ElasticNet {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        let (x_mean, y_mean) = if self.config.fit_intercept {
            (
                x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features)),
                y.mean().unwrap_or(0.0),
            )
        } else {
            (Array1::zeros(n_features), 0.0)
        };

        let mut xs = x - &x_mean.view().insert_axis(Axis(0));
        let yc = y - y_mean;

        // Zero-norm columns keep scale 1 and end up with a zero coefficient.
        let x_scale: Array1<f64> = if self.config.normalize && self.config.fit_intercept {
            xs.map_axis(Axis(0), |col| {
                let norm = col.dot(&col).sqrt();
                if norm > 0.0 {
                    norm
                } else {
                    1.0
                }
            })
        } else {
            Array1::ones(n_features)
        };
        xs /= &x_scale.view().insert_axis(Axis(0));

        let col_sq: Vec<f64> = xs.columns().into_iter().map(|c| c.dot(&c)).collect();
        let n = n_samples as f64;
        let l1_penalty = self.alpha * self.l1_ratio * n;
        let l2_penalty = self.alpha * (1.0 - self.l1_ratio) * n;

        let mut w: Array1<f64> = Array1::zeros(n_features);
        let mut residual = yc.clone();
        let mut converged = false;
        let mut sweeps = 0;

        for _ in 0..self.config.max_iter {
            sweeps += 1;
            let mut max_delta = 0.0f64;
            let mut max_weight = 0.0f64;

            for j in 0..n_features {
                let denom = col_sq[j] + l2_penalty;
                if denom <= 0.0 {
                    continue;
                }
                let column = xs.column(j);
                let old = w[j];
                let rho = column.dot(&residual) + col_sq[j] * old;
                let new = Self::soft_threshold(rho, l1_penalty) / denom;
                if new != old {
                    residual.scaled_add(old - new, &column);
                    w[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_weight = max_weight.max(new.abs());
            }

            if max_weight == 0.0 || max_delta / max_weight < self.config.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!(
                "Elastic net did not converge after {} iterations (alpha={}, l1_ratio={}); consider raising max_iter",
                self.config.max_iter,
                self.alpha,
                self.l1_ratio
            );
        }

        let coefficients = &w / &x_scale;
        self.intercept = if self.config.fit_intercept {
            y_mean - x_mean.dot(&coefficients)
        } else {
            0.0
        };
        self.coefficients = Some(coefficients);
        self.n_iter = sweeps;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> NcvResult<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_predict_input(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }

    fn name(&self) -> &'static str {
        "ElasticNet"
    }
}
