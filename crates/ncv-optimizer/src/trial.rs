//! Per-candidate cross-validation results and best-candidate tracking.

use ncv_types::{AlgorithmKind, NcvResult, ParamSet, TuningError};
use serde::{Deserialize, Serialize};

/// Cross-validated error of one candidate: one row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Position in canonical grid order.
    pub index: usize,
    pub params: ParamSet,
    /// Mean absolute error on each validation fold, in fold order.
    pub fold_errors: Vec<f64>,
    pub mean_error: f64,
    /// Population standard deviation of `fold_errors`.
    pub std_error: f64,
    /// 1 for the lowest mean error; ties share the lower rank.
    pub rank: usize,
}

impl CandidateResult {
    pub fn new(index: usize, params: ParamSet, fold_errors: Vec<f64>) -> Self {
        let n = fold_errors.len() as f64;
        let mean_error = fold_errors.iter().sum::<f64>() / n;
        let std_error = (fold_errors.iter().map(|e| (e - mean_error).powi(2)).sum::<f64>() / n).sqrt();
        Self {
            index,
            params,
            fold_errors,
            mean_error,
            std_error,
            rank: 0,
        }
    }

    /// Higher-is-better form of the error, as a scorer would report it.
    pub fn score(&self) -> f64 {
        -self.mean_error
    }
}

/// Results of one search, in evaluation order, with the winner resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub algorithm: AlgorithmKind,
    pub results: Vec<CandidateResult>,
    best: usize,
}

impl SearchOutcome {
    /// Rank the candidates and pick the one with the lowest finite mean error.
    ///
    /// On equal means the candidate evaluated first wins.
    pub fn from_results(algorithm: AlgorithmKind, mut results: Vec<CandidateResult>) -> NcvResult<Self> {
        if results.is_empty() {
            return Err(TuningError::NoCandidates {
                algorithm: algorithm.name().to_string(),
            }
            .into());
        }

        let mut best: Option<usize> = None;
        for (pos, result) in results.iter().enumerate() {
            if !result.mean_error.is_finite() {
                continue;
            }
            let improves = match best {
                None => true,
                Some(b) => result.mean_error < results[b].mean_error,
            };
            if improves {
                best = Some(pos);
            }
        }
        let best = best.ok_or_else(|| TuningError::NoFiniteScore {
            algorithm: algorithm.name().to_string(),
        })?;

        let means: Vec<f64> = results.iter().map(|r| r.mean_error).collect();
        for result in &mut results {
            let better = means
                .iter()
                .filter(|m| m.is_finite() && (!result.mean_error.is_finite() || **m < result.mean_error))
                .count();
            result.rank = better + 1;
        }

        Ok(Self {
            algorithm,
            results,
            best,
        })
    }

    pub fn best(&self) -> &CandidateResult {
        &self.results[self.best]
    }

    pub fn best_params(&self) -> &ParamSet {
        &self.best().params
    }

    /// Mean inner-fold error of the winning candidate.
    pub fn best_error(&self) -> f64 {
        self.best().mean_error
    }

    /// Negated [`SearchOutcome::best_error`].
    pub fn best_score(&self) -> f64 {
        self.best().score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncv_types::ParameterValue;

    fn result(index: usize, errors: &[f64]) -> CandidateResult {
        CandidateResult::new(
            index,
            ParamSet::new().with("alpha", ParameterValue::Int(index as i64)),
            errors.to_vec(),
        )
    }

    #[test]
    fn mean_and_population_std() {
        let r = result(0, &[1.0, 3.0]);
        assert_eq!(r.mean_error, 2.0);
        assert_eq!(r.std_error, 1.0);
        assert_eq!(r.score(), -2.0);
    }

    #[test]
    fn best_is_minimum_mean_error() {
        let outcome = SearchOutcome::from_results(
            AlgorithmKind::ElasticNet,
            vec![result(4, &[2.0, 2.0]), result(1, &[0.5, 1.5]), result(2, &[3.0, 1.0])],
        )
        .unwrap();
        assert_eq!(outcome.best().index, 1);
        assert_eq!(outcome.best_error(), 1.0);
        assert_eq!(outcome.best_score(), -1.0);
        let min = outcome
            .results
            .iter()
            .map(|r| r.mean_error)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(outcome.best_error(), min);
    }

    #[test]
    fn ties_go_to_first_evaluated_and_share_rank() {
        let outcome = SearchOutcome::from_results(
            AlgorithmKind::RandomForest,
            vec![result(7, &[1.0]), result(3, &[1.0]), result(5, &[0.5, 2.5])],
        )
        .unwrap();
        assert_eq!(outcome.best().index, 7);
        let ranks: Vec<usize> = outcome.results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
    }

    #[test]
    fn nan_never_wins() {
        let outcome = SearchOutcome::from_results(
            AlgorithmKind::ElasticNet,
            vec![result(0, &[f64::NAN]), result(1, &[5.0])],
        )
        .unwrap();
        assert_eq!(outcome.best().index, 1);
        assert_eq!(outcome.results[0].rank, 2);

        let all_nan = SearchOutcome::from_results(AlgorithmKind::ElasticNet, vec![result(0, &[f64::NAN])]);
        assert!(matches!(
            all_nan,
            Err(ncv_types::NcvError::Tuning(TuningError::NoFiniteScore { .. }))
        ));
    }

    #[test]
    fn empty_results_are_rejected() {
        assert!(SearchOutcome::from_results(AlgorithmKind::ElasticNet, Vec::new()).is_err());
    }
}
