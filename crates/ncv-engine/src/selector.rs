//! Picks the algorithm with the lowest outer-loop error.

use ncv_types::{NcvResult, OuterFoldSummary, TuningError};

/// The summary with the minimal finite mean error.
///
/// Exact ties go to the algorithm declared first in `AlgorithmKind`.
pub fn select_best(results: &[OuterFoldSummary]) -> NcvResult<&OuterFoldSummary> {
    if results.is_empty() {
        return Err(TuningError::NothingToSelect.into());
    }

    let mut best: Option<&OuterFoldSummary> = None;
    for summary in results.iter().filter(|s| s.mean_error.is_finite()) {
        best = match best {
            None => Some(summary),
            Some(current) => {
                let better = summary.mean_error < current.mean_error
                    || (summary.mean_error == current.mean_error && summary.algorithm < current.algorithm);
                Some(if better { summary } else { current })
            }
        };
    }

    let best = best.ok_or_else(|| TuningError::NoFiniteScore {
        algorithm: "any algorithm".to_string(),
    })?;
    tracing::info!("Selected {} (outer MAE {:.5})", best.algorithm, best.mean_error);
    Ok(best)
}
