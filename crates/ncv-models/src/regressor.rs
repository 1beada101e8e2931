use ndarray::{Array1, Array2};
use ncv_types::{ModelError, NcvResult};

use crate::metrics::r2_score;

/// Uniform fit / predict / score surface shared by every estimator.
pub trait Regressor: Send + Sync {
    /// Fit on `x` (rows are samples) and `y`, replacing any previous fit.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<()>;

    fn predict(&self, x: &Array2<f64>) -> NcvResult<Array1<f64>>;

    /// R² of the predictions on `x` against `y`.
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<f64> {
        let predictions = self.predict(x)?;
        r2_score(y, &predictions)
    }

    fn name(&self) -> &'static str;
}

pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<()> {
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        }
        .into());
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::FitFailed {
            message: format!("cannot fit on a {}x{} matrix", x.nrows(), x.ncols()),
        }
        .into());
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ModelError::FitFailed {
            message: "input contains NaN or infinite values".to_string(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> NcvResult<()> {
    if x.ncols() != n_features {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        }
        .into());
    }
    Ok(())
}
