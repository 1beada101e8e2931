//! The configured algorithms of a run, each with its search grid.

use ncv_models::AlgorithmSpec;
use ncv_optimizer::{InnerTuner, KFold};
use ncv_types::{validation_error, AlgorithmKind, CvSettings, ModelSettings, NcvResult, ParameterGrid};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AlgorithmEntry {
    pub spec: AlgorithmSpec,
    pub grid: ParameterGrid,
    /// Candidates the inner search samples; the grid size unless overridden.
    pub n_iter: usize,
}

/// Algorithms keyed by kind, plus the shared inner-CV settings.
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    entries: BTreeMap<AlgorithmKind, AlgorithmEntry>,
    cv: CvSettings,
}

impl AlgorithmRegistry {
    pub fn new(cv: CvSettings) -> Self {
        Self {
            entries: BTreeMap::new(),
            cv,
        }
    }

    /// One entry per grid, with estimator settings from `models`.
    pub fn from_grids(
        grids: &BTreeMap<AlgorithmKind, ParameterGrid>,
        models: &ModelSettings,
        cv: CvSettings,
    ) -> Self {
        let mut registry = Self::new(cv);
        for (kind, grid) in grids {
            registry.register(AlgorithmSpec::from_settings(*kind, models), grid.clone());
        }
        registry
    }

    pub fn register(&mut self, spec: AlgorithmSpec, grid: ParameterGrid) -> &mut Self {
        let n_iter = grid.cardinality();
        self.entries.insert(spec.kind(), AlgorithmEntry { spec, grid, n_iter });
        self
    }

    pub fn get(&self, kind: AlgorithmKind) -> NcvResult<&AlgorithmEntry> {
        self.entries
            .get(&kind)
            .ok_or_else(|| validation_error!("{} is not registered", kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered kinds in name order, the order the outer loop visits them.
    pub fn kinds_by_name(&self) -> Vec<AlgorithmKind> {
        let mut kinds: Vec<AlgorithmKind> = self.entries.keys().copied().collect();
        kinds.sort_by_key(|k| k.name());
        kinds
    }

    pub fn cv(&self) -> &CvSettings {
        &self.cv
    }

    /// Inner tuner for `kind`, using the shared fold seed and search seed.
    pub fn tuner(&self, kind: AlgorithmKind) -> NcvResult<InnerTuner> {
        let entry = self.get(kind)?;
        Ok(
            InnerTuner::new(entry.spec, entry.grid.clone(), KFold::new(self.cv.inner_folds, self.cv.seed))
                .with_n_iter(entry.n_iter)
                .with_search_seed(self.cv.search_seed)
                .with_parallel(self.cv.parallel),
        )
    }
}
