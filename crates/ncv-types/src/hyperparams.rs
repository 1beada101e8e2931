//! Hyperparameter values, parameter sets and grids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{GridError, ModelError, NcvResult};

/// A concrete hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Text(_) => None,
        }
    }

    /// Integer view; floats are accepted only when they hold an integral value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
        }
    }
}

/// One hyperparameter combination, keyed by the name the estimator expects.
///
/// Ordered by name so that display and serialization are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, ParameterValue>);

impl ParamSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    pub fn require_f64(&self, name: &str) -> NcvResult<f64> {
        let value = self.0.get(name).ok_or_else(|| ModelError::MissingParameter {
            parameter: name.to_string(),
        })?;
        value.as_f64().ok_or_else(|| {
            ModelError::InvalidParameter {
                parameter: name.to_string(),
                message: format!("expected a number, got {value}"),
            }
            .into()
        })
    }

    pub fn require_usize(&self, name: &str) -> NcvResult<usize> {
        let value = self.0.get(name).ok_or_else(|| ModelError::MissingParameter {
            parameter: name.to_string(),
        })?;
        match value.as_i64() {
            Some(v) if v >= 0 => Ok(v as usize),
            _ => Err(ModelError::InvalidParameter {
                parameter: name.to_string(),
                message: format!("expected a non-negative integer, got {value}"),
            }
            .into()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{name}': {value}")?;
        }
        write!(f, "}}")
    }
}

/// How the axes of a [`ParameterGrid`] combine into candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridLayout {
    /// Axes are columns of one table; candidate `i` takes row `i` of every axis.
    Zipped,
    /// Every combination of axis values.
    Cartesian,
}

/// A single named axis of candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<ParameterValue>,
}

/// Search space for one algorithm: named axes of candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub axes: Vec<GridAxis>,
    pub layout: GridLayout,
}

impl ParameterGrid {
    pub fn zipped() -> Self {
        Self {
            axes: Vec::new(),
            layout: GridLayout::Zipped,
        }
    }

    pub fn cartesian() -> Self {
        Self {
            axes: Vec::new(),
            layout: GridLayout::Cartesian,
        }
    }

    pub fn add_axis(mut self, name: impl Into<String>, values: Vec<ParameterValue>) -> Self {
        self.axes.push(GridAxis {
            name: name.into(),
            values,
        });
        self
    }

    /// Number of distinct candidates the grid describes.
    pub fn cardinality(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        match self.layout {
            GridLayout::Zipped => self.axes.iter().map(|a| a.values.len()).min().unwrap_or(0),
            GridLayout::Cartesian => self
                .axes
                .iter()
                .try_fold(1usize, |acc, a| acc.checked_mul(a.values.len()))
                .unwrap_or(usize::MAX),
        }
    }

    /// Reject grids that cannot produce a candidate.
    pub fn validate(&self, algorithm: &str) -> NcvResult<()> {
        if self.cardinality() == 0 {
            return Err(GridError::Empty {
                algorithm: algorithm.to_string(),
            }
            .into());
        }
        if self.layout == GridLayout::Zipped {
            let first = self.axes[0].values.len();
            if let Some(axis) = self.axes.iter().find(|a| a.values.len() != first) {
                return Err(GridError::LengthMismatch {
                    message: format!(
                        "'{}' has {} values, '{}' has {}",
                        self.axes[0].name,
                        first,
                        axis.name,
                        axis.values.len()
                    ),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Candidate at `index` in canonical grid order.
    pub fn combination(&self, index: usize) -> Option<ParamSet> {
        if index >= self.cardinality() {
            return None;
        }
        let mut params = ParamSet::new();
        match self.layout {
            GridLayout::Zipped => {
                for axis in &self.axes {
                    params.insert(axis.name.clone(), axis.values[index].clone());
                }
            }
            GridLayout::Cartesian => {
                // Last axis varies fastest.
                let mut rem = index;
                for axis in self.axes.iter().rev() {
                    let len = axis.values.len();
                    params.insert(axis.name.clone(), axis.values[rem % len].clone());
                    rem /= len;
                }
            }
        }
        Some(params)
    }

    /// All candidates in canonical grid order.
    pub fn combinations(&self) -> Vec<ParamSet> {
        (0..self.cardinality())
            .filter_map(|i| self.combination(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(values: &[f64]) -> Vec<ParameterValue> {
        values.iter().map(|v| ParameterValue::Float(*v)).collect()
    }

    #[test]
    fn zipped_grid_pairs_rows() {
        let grid = ParameterGrid::zipped()
            .add_axis("alpha", floats(&[0.1, 0.2, 0.3]))
            .add_axis("l1_ratio", floats(&[0.5, 0.6, 0.7]));
        assert_eq!(grid.cardinality(), 3);

        let combos = grid.combinations();
        assert_eq!(combos.len(), 3);
        assert_eq!(combos[1].require_f64("alpha").unwrap(), 0.2);
        assert_eq!(combos[1].require_f64("l1_ratio").unwrap(), 0.6);
    }

    #[test]
    fn cartesian_grid_enumerates_every_combination() {
        let grid = ParameterGrid::cartesian()
            .add_axis("a", vec![ParameterValue::Int(1), ParameterValue::Int(2), ParameterValue::Int(3)])
            .add_axis("b", vec![ParameterValue::Int(10), ParameterValue::Int(11)]);
        assert_eq!(grid.cardinality(), 6);

        let combos = grid.combinations();
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0].get("a"), Some(&ParameterValue::Int(1)));
        assert_eq!(combos[0].get("b"), Some(&ParameterValue::Int(10)));
        assert_eq!(combos[1].get("b"), Some(&ParameterValue::Int(11)));
        assert_eq!(combos[5].get("a"), Some(&ParameterValue::Int(3)));
        for i in 0..combos.len() {
            for j in (i + 1)..combos.len() {
                assert_ne!(combos[i], combos[j]);
            }
        }
    }

    #[test]
    fn empty_grid_is_rejected() {
        let grid = ParameterGrid::zipped().add_axis("alpha", Vec::new());
        assert!(matches!(
            grid.validate("Elastic Net"),
            Err(crate::NcvError::Grid(GridError::Empty { .. }))
        ));
        assert!(ParameterGrid::cartesian().validate("x").is_err());
    }

    #[test]
    fn ragged_zipped_grid_is_rejected() {
        let grid = ParameterGrid::zipped()
            .add_axis("alpha", floats(&[0.1, 0.2]))
            .add_axis("l1_ratio", floats(&[0.5]));
        assert!(matches!(
            grid.validate("Elastic Net"),
            Err(crate::NcvError::Grid(GridError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn param_set_accessors() {
        let params = ParamSet::new()
            .with("max_features", ParameterValue::Float(3.0))
            .with("n_estimators", ParameterValue::Int(200))
            .with("alpha", ParameterValue::Float(0.25));

        assert_eq!(params.require_usize("max_features").unwrap(), 3);
        assert_eq!(params.require_usize("n_estimators").unwrap(), 200);
        assert_eq!(params.require_f64("n_estimators").unwrap(), 200.0);
        assert!(params.require_usize("alpha").is_err());
        assert!(params.require_f64("missing").is_err());
    }

    #[test]
    fn param_set_display_is_sorted() {
        let params = ParamSet::new()
            .with("l1_ratio", ParameterValue::Float(0.5))
            .with("alpha", ParameterValue::Float(0.01));
        assert_eq!(params.to_string(), "{'alpha': 0.01, 'l1_ratio': 0.5}");
    }
}
