//! Outer cross-validation loop around the inner tuner.

use ncv_models::mean_absolute_error;
use ncv_optimizer::KFold;
use ncv_types::{AlgorithmKind, Dataset, NcvResult, OuterFoldScore, OuterFoldSummary};
use std::time::Instant;
use tracing::{debug, info};

use crate::registry::AlgorithmRegistry;

/// Estimates each algorithm's generalization error with an outer K-fold loop.
///
/// Every algorithm sees the same outer folds, since the splitter is seeded
/// from the registry's CV settings.
#[derive(Debug, Clone)]
pub struct OuterLoopEvaluator<'a> {
    registry: &'a AlgorithmRegistry,
    folds: KFold,
}

impl<'a> OuterLoopEvaluator<'a> {
    pub fn new(registry: &'a AlgorithmRegistry) -> Self {
        let cv = registry.cv();
        Self {
            registry,
            folds: KFold::new(cv.outer_folds, cv.seed),
        }
    }

    pub fn folds(&self) -> &KFold {
        &self.folds
    }

    /// Tune on each outer training part, score MAE on the held-out part.
    pub fn evaluate(&self, kind: AlgorithmKind, data: &Dataset) -> NcvResult<OuterFoldSummary> {
        let tuner = self.registry.tuner(kind)?;
        let started = Instant::now();

        let mut scores = Vec::with_capacity(self.folds.n_splits);
        for split in self.folds.split(data.n_rows())? {
            let train = data.select(&split.train_indices);
            let validation = data.select(&split.test_indices);

            let tuned = tuner.fit(&train)?;
            let predictions = tuned.predict(&validation.features)?;
            let error = mean_absolute_error(&validation.target, &predictions)?;

            debug!(
                "{} outer fold {}: MAE {:.5} (inner {:.5}) with {}",
                kind,
                split.fold_idx,
                error,
                tuned.best_error(),
                tuned.best_params()
            );
            scores.push(OuterFoldScore {
                fold_idx: split.fold_idx,
                error,
                inner_error: tuned.best_error(),
                best_params: tuned.best_params().clone(),
            });
        }

        let summary = OuterFoldSummary::from_folds(kind, scores);
        info!(
            "{}: outer MAE {:.5} +/- {:.5} over {} folds in {:.1}s",
            kind,
            summary.mean_error,
            summary.sd_error,
            summary.folds.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(summary)
    }

    /// Evaluate every registered algorithm, in name order.
    pub fn evaluate_all(&self, data: &Dataset) -> NcvResult<Vec<OuterFoldSummary>> {
        self.registry
            .kinds_by_name()
            .into_iter()
            .map(|kind| self.evaluate(kind, data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncv_types::{CvSettings, ModelSettings, ParameterGrid, ParameterValue};
    use std::collections::BTreeMap;

    fn data(n: usize) -> Dataset {
        let x1: Vec<f64> = (0..n).map(|i| ((i * 7) % 17) as f64 / 17.0).collect();
        let x2: Vec<f64> = (0..n).map(|i| ((i * 3) % 11) as f64 / 11.0).collect();
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 2.0 * a + b).collect();
        Dataset::from_columns(vec!["x1".into(), "x2".into(), "y".into()], vec![x1, x2, y]).unwrap()
    }

    fn registry() -> AlgorithmRegistry {
        let grids = BTreeMap::from([
            (
                AlgorithmKind::ElasticNet,
                ParameterGrid::zipped()
                    .add_axis("alpha", vec![ParameterValue::Float(1e-4), ParameterValue::Float(0.5)])
                    .add_axis("l1_ratio", vec![ParameterValue::Float(0.5), ParameterValue::Float(0.5)]),
            ),
            (
                AlgorithmKind::RandomForest,
                ParameterGrid::zipped()
                    .add_axis("max_features", vec![ParameterValue::Int(2)])
                    .add_axis("n_estimators", vec![ParameterValue::Int(4)]),
            ),
        ]);
        AlgorithmRegistry::from_grids(&grids, &ModelSettings::default(), CvSettings::default())
    }

    #[test]
    fn mean_is_over_exactly_five_folds() {
        let registry = registry();
        let summary = OuterLoopEvaluator::new(&registry)
            .evaluate(AlgorithmKind::ElasticNet, &data(50))
            .unwrap();

        assert_eq!(summary.folds.len(), 5);
        let mean = summary.scores().iter().sum::<f64>() / 5.0;
        assert!((summary.mean_error - mean).abs() < 1e-12);
        assert!(summary.sd_error >= 0.0);
        assert!(summary.folds.iter().all(|f| f.best_params.get("alpha").is_some()));
    }

    #[test]
    fn all_algorithms_in_name_order() {
        let registry = registry();
        let results = OuterLoopEvaluator::new(&registry).evaluate_all(&data(40)).unwrap();
        let kinds: Vec<AlgorithmKind> = results.iter().map(|r| r.algorithm).collect();
        assert_eq!(kinds, vec![AlgorithmKind::ElasticNet, AlgorithmKind::RandomForest]);
    }

    #[test]
    fn repeated_runs_agree() {
        let registry = registry();
        let evaluator = OuterLoopEvaluator::new(&registry);
        let a = evaluator.evaluate(AlgorithmKind::RandomForest, &data(40)).unwrap();
        let b = evaluator.evaluate(AlgorithmKind::RandomForest, &data(40)).unwrap();
        assert_eq!(a, b);
    }
}
