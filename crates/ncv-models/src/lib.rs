//! Regression estimators used by the benchmark: elastic net and random forest.

pub mod elastic_net;
pub mod forest;
pub mod metrics;
pub mod regressor;
pub mod spec;
pub mod tree;

pub use elastic_net::{ElasticNet, ElasticNetConfig};
pub use forest::{ForestConfig, RandomForest};
pub use metrics::{mean_absolute_error, r2_score, root_mean_squared_error};
pub use regressor::Regressor;
pub use spec::{AlgorithmSpec, Estimator};
pub use tree::{DecisionTreeRegressor, TreeNode, DEFAULT_MAX_DEPTH};
