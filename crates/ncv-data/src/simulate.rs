//! Synthetic inputs: the benchmark dataset and Latin hypercube parameter tables.

use ncv_types::{validation_error, Dataset, NcvResult};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

use crate::loaders::Table;

/// Number of uniform features in the Friedman #1 problem.
pub const FRIEDMAN_FEATURES: usize = 10;

/// Log10 range of the elastic-net penalty.
pub const PENALTY_LOG10_RANGE: (f64, f64) = (-10.0, 0.0);
/// Upper bound of the forest's tree count.
pub const MAX_TREES: usize = 2000;

/// Friedman #1 regression problem.
///
/// Ten features drawn from U(0, 1); only the first five are informative:
/// `y = 10 sin(pi x1 x2) + 20 (x3 - 0.5)^2 + 10 x4 + 5 x5 + N(0, sd^2)`.
pub fn friedman1(n_rows: usize, noise_sd: f64, seed: u64) -> NcvResult<Dataset> {
    if n_rows == 0 {
        return Err(validation_error!("friedman1 needs at least one row"));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut columns = vec![Vec::with_capacity(n_rows); FRIEDMAN_FEATURES + 1];

    for _ in 0..n_rows {
        let x: Vec<f64> = (0..FRIEDMAN_FEATURES).map(|_| rng.gen::<f64>()).collect();
        let signal = 10.0 * (PI * x[0] * x[1]).sin()
            + 20.0 * (x[2] - 0.5).powi(2)
            + 10.0 * x[3]
            + 5.0 * x[4];
        let y = signal + noise_sd * standard_normal(&mut rng);

        for (col, value) in x.into_iter().enumerate() {
            columns[col].push(value);
        }
        columns[FRIEDMAN_FEATURES].push(y);
    }

    let mut names: Vec<String> = (1..=FRIEDMAN_FEATURES).map(|i| format!("x.{i}")).collect();
    names.push("y".to_string());
    Dataset::from_columns(names, columns)
}

/// Noiseless linear data: `y = intercept + sum(coef_j * x_j)`, features U(-1, 1).
pub fn linear(n_rows: usize, coefficients: &[f64], intercept: f64, seed: u64) -> NcvResult<Dataset> {
    if coefficients.is_empty() {
        return Err(validation_error!("linear data needs at least one coefficient"));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let p = coefficients.len();
    let mut columns = vec![Vec::with_capacity(n_rows); p + 1];

    for _ in 0..n_rows {
        let mut y = intercept;
        for (col, coef) in coefficients.iter().enumerate() {
            let x = rng.gen_range(-1.0..1.0);
            y += coef * x;
            columns[col].push(x);
        }
        columns[p].push(y);
    }

    let mut names: Vec<String> = (1..=p).map(|i| format!("x{i}")).collect();
    names.push("y".to_string());
    Dataset::from_columns(names, columns)
}

/// Box-Muller transform.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1 = 1.0 - rng.gen::<f64>(); // (0, 1]
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// `size` x `dims` Latin hypercube sample on the unit cube.
///
/// Each dimension is cut into `size` equal strata and every stratum holds
/// exactly one point.
pub fn latin_hypercube(size: usize, dims: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    let mut columns = Vec::with_capacity(dims);
    for _ in 0..dims {
        let mut strata: Vec<usize> = (0..size).collect();
        strata.shuffle(rng);
        let column = strata
            .into_iter()
            .map(|s| (s as f64 + rng.gen::<f64>()) / size as f64)
            .collect();
        columns.push(column);
    }
    columns
}

/// Elastic-net table: `penalty` on a log10 scale, `mixture` in [0, 1].
pub fn elastic_net_table(size: usize, seed: u64) -> NcvResult<Table> {
    if size == 0 {
        return Err(validation_error!("grid size must be positive"));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cube = latin_hypercube(size, 2, &mut rng);
    let mixture = cube.pop().unwrap_or_default();
    let (lo, hi) = PENALTY_LOG10_RANGE;
    let penalty = cube
        .pop()
        .unwrap_or_default()
        .into_iter()
        .map(|u| 10f64.powf(lo + u * (hi - lo)))
        .collect();

    Ok(Table::new(
        vec!["penalty".to_string(), "mixture".to_string()],
        vec![penalty, mixture],
    ))
}

/// Random-forest table: integer `mtry` in [1, n_features], `trees` in [1, 2000].
pub fn random_forest_table(size: usize, n_features: usize, seed: u64) -> NcvResult<Table> {
    if size == 0 || n_features == 0 {
        return Err(validation_error!(
            "grid size and feature count must be positive (size {}, features {})",
            size,
            n_features
        ));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cube = latin_hypercube(size, 2, &mut rng);
    let trees = scale_to_integers(cube.pop().unwrap_or_default(), MAX_TREES);
    let mtry = scale_to_integers(cube.pop().unwrap_or_default(), n_features);

    Ok(Table::new(
        vec!["mtry".to_string(), "trees".to_string()],
        vec![mtry, trees],
    ))
}

/// Map unit-interval draws onto the integers 1..=max.
fn scale_to_integers(unit: Vec<f64>, max: usize) -> Vec<f64> {
    unit.into_iter()
        .map(|u| ((u * max as f64).floor() + 1.0).min(max as f64))
        .collect()
}

/// Flatten a dataset back into a table, target last.
pub fn dataset_to_table(dataset: &Dataset) -> Table {
    let mut names = dataset.feature_names.clone();
    names.push(dataset.target_name.clone());
    let mut columns: Vec<Vec<f64>> = dataset
        .features
        .columns()
        .into_iter()
        .map(|c| c.to_vec())
        .collect();
    columns.push(dataset.target.to_vec());
    Table::new(names, columns)
}
