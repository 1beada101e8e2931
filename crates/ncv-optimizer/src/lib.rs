//! # ncv-optimizer
//!
//! Inner-loop hyperparameter search for the nested-CV benchmark.
//!
//! Provides the K-fold splitter, randomized sweep strategy, the
//! per-candidate results table and the [`InnerTuner`] that ties them to an
//! estimator.

mod folds;
mod search;
mod trial;
mod tuner;

pub use folds::{FoldSplit, KFold};
pub use search::{Candidate, RandomizedSearch, SearchStrategy};
pub use trial::{CandidateResult, SearchOutcome};
pub use tuner::{InnerTuner, TunedModel};
