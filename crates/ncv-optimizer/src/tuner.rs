//! Inner-loop hyperparameter tuning: randomized search scored by K-fold MAE.

use ndarray::Array2;
use ncv_models::{mean_absolute_error, AlgorithmSpec, Estimator, Regressor};
use ncv_types::{Dataset, NcvResult, ParamSet, ParameterGrid, TuningError};
use rayon::prelude::*;
use std::time::Instant;

use crate::folds::KFold;
use crate::search::{RandomizedSearch, SearchStrategy};
use crate::trial::{CandidateResult, SearchOutcome};

/// Randomized search over one algorithm's grid, refitting the winner on all rows.
#[derive(Debug, Clone)]
pub struct InnerTuner {
    pub spec: AlgorithmSpec,
    pub grid: ParameterGrid,
    /// Candidates to sample; defaults to the grid size.
    pub n_iter: usize,
    pub cv: KFold,
    pub search_seed: u64,
    /// Evaluate candidate x fold fits on the rayon pool.
    pub parallel: bool,
}

/// Search results plus the winning configuration refit on the tuner's input.
#[derive(Debug, Clone)]
pub struct TunedModel {
    pub outcome: SearchOutcome,
    pub estimator: Estimator,
}

impl TunedModel {
    pub fn best_params(&self) -> &ParamSet {
        self.outcome.best_params()
    }

    pub fn best_error(&self) -> f64 {
        self.outcome.best_error()
    }

    pub fn predict(&self, x: &Array2<f64>) -> NcvResult<ndarray::Array1<f64>> {
        self.estimator.predict(x)
    }
}

impl InnerTuner {
    pub fn new(spec: AlgorithmSpec, grid: ParameterGrid, cv: KFold) -> Self {
        let n_iter = grid.cardinality();
        Self {
            spec,
            grid,
            n_iter,
            cv,
            search_seed: 0,
            parallel: true,
        }
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_search_seed(mut self, seed: u64) -> Self {
        self.search_seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Score every sampled candidate on every fold of `data`, pick the lowest
    /// mean error and refit it on all of `data`.
    pub fn fit(&self, data: &Dataset) -> NcvResult<TunedModel> {
        let kind = self.spec.kind();
        self.grid.validate(kind.name())?;

        let mut search = RandomizedSearch::new(self.grid.clone(), self.n_iter, self.search_seed);
        let candidates = search.suggest(search.budget());
        if candidates.is_empty() {
            return Err(TuningError::NoCandidates {
                algorithm: kind.name().to_string(),
            }
            .into());
        }

        let folds: Vec<(Dataset, Dataset)> = self
            .cv
            .split(data.n_rows())?
            .into_iter()
            .map(|split| (data.select(&split.train_indices), data.select(&split.test_indices)))
            .collect();

        let started = Instant::now();
        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let evaluate = |&(c, f): &(usize, usize)| -> NcvResult<f64> {
            let (train, test) = &folds[f];
            let mut estimator = self.spec.build(&candidates[c].params)?;
            estimator.fit(&train.features, &train.target)?;
            let predictions = estimator.predict(&test.features)?;
            mean_absolute_error(&test.target, &predictions)
        };

        let errors: Vec<f64> = if self.parallel {
            jobs.par_iter().map(evaluate).collect::<NcvResult<_>>()?
        } else {
            jobs.iter().map(evaluate).collect::<NcvResult<_>>()?
        };

        let results: Vec<CandidateResult> = candidates
            .iter()
            .enumerate()
            .map(|(c, candidate)| {
                let fold_errors = errors[c * folds.len()..(c + 1) * folds.len()].to_vec();
                CandidateResult::new(candidate.index, candidate.params.clone(), fold_errors)
            })
            .collect();
        let outcome = SearchOutcome::from_results(kind, results)?;

        tracing::debug!(
            "{}: {} candidates x {} folds evaluated in {:.2}s",
            kind,
            candidates.len(),
            folds.len(),
            started.elapsed().as_secs_f64()
        );

        let mut estimator = self.spec.build(outcome.best_params())?;
        estimator.fit(&data.features, &data.target)?;

        tracing::info!(
            "{} best params {} with inner CV MAE {:.5} on {} rows",
            kind,
            outcome.best_params(),
            outcome.best_error(),
            data.n_rows()
        );

        Ok(TunedModel { outcome, estimator })
    }
}
