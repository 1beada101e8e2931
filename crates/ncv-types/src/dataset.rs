use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::{DataError, NcvResult};

/// Feature matrix plus target vector, with column names kept for reporting.
///
/// The target is always the last column of the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub features: Array2<f64>,
    pub target: Array1<f64>,
}

impl Dataset {
    pub fn new(
        feature_names: Vec<String>,
        target_name: String,
        features: Array2<f64>,
        target: Array1<f64>,
    ) -> NcvResult<Self> {
        if features.nrows() != target.len() {
            return Err(DataError::InvalidFormat {
                message: format!(
                    "{} feature rows but {} target values",
                    features.nrows(),
                    target.len()
                ),
            }
            .into());
        }
        if features.ncols() != feature_names.len() {
            return Err(DataError::InvalidFormat {
                message: format!(
                    "{} feature columns but {} feature names",
                    features.ncols(),
                    feature_names.len()
                ),
            }
            .into());
        }
        Ok(Self {
            feature_names,
            target_name,
            features,
            target,
        })
    }

    /// Build from named columns; the last column becomes the target.
    pub fn from_columns(names: Vec<String>, columns: Vec<Vec<f64>>) -> NcvResult<Self> {
        if names.len() != columns.len() {
            return Err(DataError::InvalidFormat {
                message: format!("{} names for {} columns", names.len(), columns.len()),
            }
            .into());
        }
        if columns.len() < 2 {
            return Err(DataError::InsufficientData {
                message: format!(
                    "need at least one feature and one target column, got {} column(s)",
                    columns.len()
                ),
            }
            .into());
        }

        let n_rows = columns[0].len();
        if let Some((i, _)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_rows) {
            return Err(DataError::InvalidFormat {
                message: format!(
                    "column '{}' has {} rows, expected {}",
                    names[i],
                    columns[i].len(),
                    n_rows
                ),
            }
            .into());
        }

        let mut names = names;
        let mut columns = columns;
        let target_name = names.pop().unwrap_or_default();
        let target = Array1::from_vec(columns.pop().unwrap_or_default());

        let n_features = columns.len();
        let features = Array2::from_shape_fn((n_rows, n_features), |(r, c)| columns[c][r]);

        Self::new(names, target_name, features, target)
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Copy of the rows at `rows`, in the given order.
    pub fn select(&self, rows: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
            features: self.features.select(Axis(0), rows),
            target: self.target.select(Axis(0), rows),
        }
    }
}

/// Disjoint train/test partitions of one dataset.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shape summary logged after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub features: usize,
}

impl From<&Dataset> for DatasetShape {
    fn from(ds: &Dataset) -> Self {
        Self {
            rows: ds.n_rows(),
            features: ds.n_features(),
        }
    }
}
