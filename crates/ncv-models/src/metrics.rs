//! Regression error metrics.

use ndarray::Array1;
use ncv_types::{ModelError, NcvResult};
use num_traits::Float;

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> NcvResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        }
        .into());
    }
    if y_true.is_empty() {
        return Err(ModelError::ShapeMismatch {
            expected: "at least one sample".to_string(),
            actual: "0 samples".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Mean absolute error, the benchmark's scoring function.
pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> NcvResult<f64> {
    check_lengths(y_true, y_pred)?;
    Ok((y_true - y_pred).mapv(f64::abs).mean().unwrap_or(f64::NAN))
}

pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> NcvResult<f64> {
    check_lengths(y_true, y_pred)?;
    let mse = (y_true - y_pred).mapv(|v| v * v).mean().unwrap_or(f64::NAN);
    Ok(mse.sqrt())
}

/// Coefficient of determination. A constant target scores 1.0 when predicted exactly.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> NcvResult<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res = (y_true - y_pred).mapv(|v| v * v).sum();
    let ss_tot = y_true.mapv(|v| (v - mean).powi(2)).sum();
    Ok(if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    })
}

/// Median of `values`, reordering the slice. Even lengths average the two middle values.
pub fn median<F: Float>(values: &mut [F]) -> F {
    let n = values.len();
    if n == 0 {
        return F::nan();
    }
    let cmp = |a: &F, b: &F| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, cmp);
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        let lower_max = lower.iter().copied().fold(F::neg_infinity(), F::max);
        (lower_max + upper) / (F::one() + F::one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn mae_and_rmse() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let p = array![1.5, 2.0, 2.0, 4.0];
        assert!((mean_absolute_error(&y, &p).unwrap() - 0.375).abs() < 1e-12);
        assert!((root_mean_squared_error(&y, &p).unwrap() - (1.25f64 / 4.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn perfect_prediction_has_r2_one() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y).unwrap(), 1.0);
        assert_eq!(mean_absolute_error(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn length_mismatch_is_error() {
        assert!(mean_absolute_error(&array![1.0, 2.0], &array![1.0]).is_err());
        assert!(mean_absolute_error(&Array1::zeros(0), &Array1::zeros(0)).is_err());
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median::<f64>(&mut []).is_nan());
    }
}
