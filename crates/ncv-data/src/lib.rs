//! Input handling for the nested-CV benchmark.
//!
//! Loads the simulated dataset and the two hyperparameter tables, turns the
//! tables into search grids and performs the one-off train/test split.

pub mod grids;
pub mod loaders;
pub mod simulate;
pub mod split;

pub use grids::*;
pub use loaders::*;
pub use split::*;

use ncv_types::{AlgorithmKind, Dataset, DatasetShape, ExperimentConfig, NcvResult, ParameterGrid, TrainTestSplit};
use std::collections::BTreeMap;

/// Everything a run reads from disk, already split and converted.
#[derive(Debug, Clone)]
pub struct ExperimentData {
    pub split: TrainTestSplit,
    pub grids: BTreeMap<AlgorithmKind, ParameterGrid>,
}

impl ExperimentData {
    /// Load the dataset and both parameter tables named by `config`.
    pub fn load(config: &ExperimentConfig) -> NcvResult<Self> {
        let loader = TableLoader::new();

        let table = loader.load(&config.data_path)?;
        let dataset = Dataset::from_columns(table.names, table.columns)?;
        tracing::info!(
            "Dataset {:?}, target '{}'",
            DatasetShape::from(&dataset),
            dataset.target_name
        );

        let mut grids = BTreeMap::new();
        for kind in AlgorithmKind::ALL {
            let path = match kind {
                AlgorithmKind::ElasticNet => &config.elastic_net_grid_path,
                AlgorithmKind::RandomForest => &config.random_forest_grid_path,
            };
            let table = loader.load(path)?;
            grids.insert(kind, build_grid(kind, &table, config.cv.grid_layout)?);
        }

        Self::from_parts(&dataset, grids, config)
    }

    /// Split an in-memory dataset and pair it with prepared grids.
    pub fn from_parts(
        dataset: &Dataset,
        grids: BTreeMap<AlgorithmKind, ParameterGrid>,
        config: &ExperimentConfig,
    ) -> NcvResult<Self> {
        let split = train_test_split(dataset, config.split.test_size, config.split.seed)?;
        Ok(Self { split, grids })
    }
}
