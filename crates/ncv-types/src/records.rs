use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::hyperparams::ParamSet;

/// The closed set of algorithms the benchmark compares.
///
/// Declaration order doubles as the tie-break order during model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    ElasticNet,
    RandomForest,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 2] = [AlgorithmKind::ElasticNet, AlgorithmKind::RandomForest];

    /// Display name used in logs, result tables and the notification body.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ElasticNet => "Elastic Net",
            Self::RandomForest => "Random Forest",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Round half-to-even at `decimals` places.
///
/// Non-finite values pass through unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(decimals))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Validation error of one outer fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuterFoldScore {
    pub fold_idx: usize,
    /// Mean absolute error of the tuned estimator on the fold's validation rows.
    pub error: f64,
    /// Inner-CV error of the candidate the tuner picked for this fold.
    pub inner_error: f64,
    pub best_params: ParamSet,
}

/// One row of the outer-loop results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuterFoldSummary {
    pub algorithm: AlgorithmKind,
    pub folds: Vec<OuterFoldScore>,
    pub mean_error: f64,
    /// Population standard deviation.
    pub sd_error: f64,
}

impl OuterFoldSummary {
    pub fn from_folds(algorithm: AlgorithmKind, folds: Vec<OuterFoldScore>) -> Self {
        let n = folds.len() as f64;
        let (mean_error, sd_error) = if folds.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let mean = folds.iter().map(|f| f.error).sum::<f64>() / n;
            let variance = folds.iter().map(|f| (f.error - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        };
        Self {
            algorithm,
            folds,
            mean_error,
            sd_error,
        }
    }

    pub fn scores(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.error).collect()
    }
}

/// Terminal output of a run: the chosen algorithm and its error figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalModelRecord {
    pub algorithm: AlgorithmKind,
    pub params: ParamSet,
    /// Mean inner-fold error of the chosen candidate on the full training set.
    pub kfold_error: f64,
    /// Mean outer-fold validation error of the chosen algorithm.
    pub outer_fold_error: f64,
    pub train_error: f64,
    pub test_error: f64,
}

impl FinalModelRecord {
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            algorithm: self.algorithm,
            params: self.params.clone(),
            kfold_error: round_to(self.kfold_error, decimals),
            outer_fold_error: round_to(self.outer_fold_error, decimals),
            train_error: round_to(self.train_error, decimals),
            test_error: round_to(self.test_error, decimals),
        }
    }
}

/// Everything the reporting sink receives at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub experiment: String,
    pub duration_seconds: f64,
    pub tags: BTreeMap<String, String>,
    pub record: FinalModelRecord,
    pub outer_results: Vec<OuterFoldSummary>,
    pub finished_at: DateTime<Utc>,
}
