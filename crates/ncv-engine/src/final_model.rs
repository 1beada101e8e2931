//! Refit of the selected algorithm and its train/test scoring.

use ncv_models::mean_absolute_error;
use ncv_optimizer::TunedModel;
use ncv_types::{AlgorithmKind, Dataset, FinalModelRecord, NcvResult, TrainTestSplit};

use crate::registry::AlgorithmRegistry;

pub struct FinalTrainer<'a> {
    registry: &'a AlgorithmRegistry,
}

impl<'a> FinalTrainer<'a> {
    pub fn new(registry: &'a AlgorithmRegistry) -> Self {
        Self { registry }
    }

    /// Re-run the inner search for `kind` on the whole training set.
    pub fn fit(&self, kind: AlgorithmKind, train: &Dataset) -> NcvResult<TunedModel> {
        self.registry.tuner(kind)?.fit(train)
    }

    /// MAE on both partitions. Unrounded; see [`FinalModelRecord::rounded`].
    pub fn score(&self, tuned: &TunedModel, split: &TrainTestSplit, outer_fold_error: f64) -> NcvResult<FinalModelRecord> {
        let train_predictions = tuned.predict(&split.train.features)?;
        let test_predictions = tuned.predict(&split.test.features)?;

        let record = FinalModelRecord {
            algorithm: tuned.outcome.algorithm,
            params: tuned.best_params().clone(),
            kfold_error: tuned.best_error(),
            outer_fold_error,
            train_error: mean_absolute_error(&split.train.target, &train_predictions)?,
            test_error: mean_absolute_error(&split.test.target, &test_predictions)?,
        };

        tracing::info!(
            "Final {}: train MAE {:.5}, test MAE {:.5}",
            record.algorithm,
            record.train_error,
            record.test_error
        );
        Ok(record)
    }
}
