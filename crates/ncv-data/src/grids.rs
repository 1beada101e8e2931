//! Turns externally generated hyperparameter tables into search grids.

use ncv_types::{AlgorithmKind, GridError, GridLayout, NcvResult, ParameterGrid, ParameterValue};

use crate::loaders::Table;

/// How a table column is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int,
}

/// Mapping from a parameter-table column to the estimator's parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRename {
    pub column: &'static str,
    pub parameter: &'static str,
    pub kind: ValueKind,
}

/// Column renames for each algorithm's parameter table.
pub fn renames_for(kind: AlgorithmKind) -> &'static [ColumnRename] {
    const ELASTIC_NET: &[ColumnRename] = &[
        ColumnRename {
            column: "penalty",
            parameter: "alpha",
            kind: ValueKind::Float,
        },
        ColumnRename {
            column: "mixture",
            parameter: "l1_ratio",
            kind: ValueKind::Float,
        },
    ];
    const RANDOM_FOREST: &[ColumnRename] = &[
        ColumnRename {
            column: "mtry",
            parameter: "max_features",
            kind: ValueKind::Int,
        },
        ColumnRename {
            column: "trees",
            parameter: "n_estimators",
            kind: ValueKind::Int,
        },
    ];
    match kind {
        AlgorithmKind::ElasticNet => ELASTIC_NET,
        AlgorithmKind::RandomForest => RANDOM_FOREST,
    }
}

/// Build the search grid for `kind` from its parameter table.
///
/// With [`GridLayout::Zipped`] every table row is one candidate. With
/// [`GridLayout::Cartesian`] each column contributes its distinct values, in
/// first-seen order, as one axis.
pub fn build_grid(kind: AlgorithmKind, table: &Table, layout: GridLayout) -> NcvResult<ParameterGrid> {
    let mut grid = match layout {
        GridLayout::Zipped => ParameterGrid::zipped(),
        GridLayout::Cartesian => ParameterGrid::cartesian(),
    };

    for rename in renames_for(kind) {
        let raw = table.column(rename.column).ok_or_else(|| GridError::MissingColumn {
            algorithm: kind.name().to_string(),
            column: rename.column.to_string(),
        })?;

        let mut values = raw
            .iter()
            .map(|v| convert(*v, rename))
            .collect::<NcvResult<Vec<_>>>()?;

        if layout == GridLayout::Cartesian {
            let mut distinct: Vec<ParameterValue> = Vec::with_capacity(values.len());
            for v in values {
                if !distinct.contains(&v) {
                    distinct.push(v);
                }
            }
            values = distinct;
        }

        grid = grid.add_axis(rename.parameter, values);
    }

    grid.validate(kind.name())?;
    tracing::info!(
        "{} grid: {} candidates over {:?}",
        kind,
        grid.cardinality(),
        grid.axes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>()
    );
    Ok(grid)
}

fn convert(value: f64, rename: &ColumnRename) -> NcvResult<ParameterValue> {
    if !value.is_finite() {
        return Err(GridError::InvalidValue {
            parameter: rename.parameter.to_string(),
            message: format!("{value} is not finite"),
        }
        .into());
    }
    match rename.kind {
        ValueKind::Float => Ok(ParameterValue::Float(value)),
        ValueKind::Int if value.fract() == 0.0 => Ok(ParameterValue::Int(value as i64)),
        ValueKind::Int => Err(GridError::InvalidValue {
            parameter: rename.parameter.to_string(),
            message: format!("{value} is not an integer"),
        }
        .into()),
    }
}
