//! Closed set of configured algorithms and the estimators they build.

use ndarray::{Array1, Array2};
use ncv_types::{AlgorithmKind, ModelSettings, NcvResult, ParamSet};
use serde::{Deserialize, Serialize};

use crate::elastic_net::{ElasticNet, ElasticNetConfig};
use crate::forest::{ForestConfig, RandomForest};
use crate::regressor::Regressor;

/// An algorithm with its fixed settings; hyperparameters are supplied per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlgorithmSpec {
    ElasticNet(ElasticNetConfig),
    RandomForest(ForestConfig),
}

impl AlgorithmSpec {
    pub fn from_settings(kind: AlgorithmKind, settings: &ModelSettings) -> Self {
        match kind {
            AlgorithmKind::ElasticNet => Self::ElasticNet(ElasticNetConfig {
                fit_intercept: true,
                normalize: settings.elastic_net_normalize,
                max_iter: settings.elastic_net_max_iter,
                tol: settings.elastic_net_tol,
            }),
            AlgorithmKind::RandomForest => Self::RandomForest(ForestConfig {
                criterion: settings.forest_criterion,
                seed: settings.forest_seed,
                ..ForestConfig::default()
            }),
        }
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::ElasticNet(_) => AlgorithmKind::ElasticNet,
            Self::RandomForest(_) => AlgorithmKind::RandomForest,
        }
    }

    /// Unfitted estimator for one candidate.
    ///
    /// Elastic net reads `alpha` and `l1_ratio`; the forest reads
    /// `max_features` and `n_estimators`.
    pub fn build(&self, params: &ParamSet) -> NcvResult<Estimator> {
        match self {
            Self::ElasticNet(config) => {
                let alpha = params.require_f64("alpha")?;
                let l1_ratio = params.require_f64("l1_ratio")?;
                Ok(Estimator::ElasticNet(ElasticNet::new(alpha, l1_ratio)?.with_config(*config)))
            }
            Self::RandomForest(config) => {
                let n_estimators = params.require_usize("n_estimators")?;
                let max_features = params.require_usize("max_features")?;
                Ok(Estimator::RandomForest(
                    RandomForest::new(n_estimators, max_features)?.with_config(*config),
                ))
            }
        }
    }
}

/// A concrete estimator of either family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    ElasticNet(ElasticNet),
    RandomForest(RandomForest),
}

impl Estimator {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::ElasticNet(_) => AlgorithmKind::ElasticNet,
            Self::RandomForest(_) => AlgorithmKind::RandomForest,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> NcvResult<()> {
        match self {
            Self::ElasticNet(m) => m.fit(x, y),
            Self::RandomForest(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> NcvResult<Array1<f64>> {
        match self {
            Self::ElasticNet(m) => m.predict(x),
            Self::RandomForest(m) => m.predict(x),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ElasticNet(m) => m.name(),
            Self::RandomForest(m) => m.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncv_types::{ParameterValue, SplitCriterion};

    #[test]
    fn settings_flow_into_specs() {
        let settings = ModelSettings {
            elastic_net_max_iter: 50,
            forest_seed: 9,
            ..ModelSettings::default()
        };
        match AlgorithmSpec::from_settings(AlgorithmKind::ElasticNet, &settings) {
            AlgorithmSpec::ElasticNet(c) => {
                assert_eq!(c.max_iter, 50);
                assert!(c.normalize && c.fit_intercept);
            }
            other => panic!("unexpected spec {other:?}"),
        }
        match AlgorithmSpec::from_settings(AlgorithmKind::RandomForest, &settings) {
            AlgorithmSpec::RandomForest(c) => {
                assert_eq!(c.seed, 9);
                assert_eq!(c.criterion, SplitCriterion::AbsoluteError);
            }
            other => panic!("unexpected spec {other:?}"),
        }
    }

    #[test]
    fn build_reads_renamed_parameters() {
        let spec = AlgorithmSpec::from_settings(AlgorithmKind::RandomForest, &ModelSettings::default());
        let params = ParamSet::new()
            .with("max_features", ParameterValue::Int(3))
            .with("n_estimators", ParameterValue::Int(40));
        match spec.build(&params).unwrap() {
            Estimator::RandomForest(rf) => {
                assert_eq!(rf.max_features, 3);
                assert_eq!(rf.n_estimators, 40);
            }
            other => panic!("unexpected estimator {other:?}"),
        }
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let spec = AlgorithmSpec::from_settings(AlgorithmKind::ElasticNet, &ModelSettings::default());
        let params = ParamSet::new().with("alpha", ParameterValue::Float(0.1));
        assert!(matches!(
            spec.build(&params),
            Err(ncv_types::NcvError::Model(ncv_types::ModelError::MissingParameter { .. }))
        ));
    }

    #[test]
    fn estimator_reports_its_kind() {
        let spec = AlgorithmSpec::from_settings(AlgorithmKind::ElasticNet, &ModelSettings::default());
        let params = ParamSet::new()
            .with("alpha", ParameterValue::Float(0.1))
            .with("l1_ratio", ParameterValue::Float(0.5));
        let estimator = spec.build(&params).unwrap();
        assert_eq!(estimator.kind(), spec.kind());
        assert_eq!(estimator.name(), "ElasticNet");
    }
}
