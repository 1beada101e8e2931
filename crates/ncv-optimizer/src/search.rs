//! Candidate sweep strategies over a [`ParameterGrid`].

use ncv_types::{ParamSet, ParameterGrid};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A grid combination together with its position in canonical grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub params: ParamSet,
}

/// Common trait for all search strategies.
pub trait SearchStrategy: Send + Sync {
    /// Next batch of at most `count` candidates; empty once exhausted.
    fn suggest(&mut self, count: usize) -> Vec<Candidate>;

    /// Candidates this strategy will hand out in total.
    fn budget(&self) -> usize;

    fn name(&self) -> &str;
}

// ---- Randomized search ----

/// `n_iter` distinct grid combinations drawn without replacement in a
/// seeded random order. With `n_iter` equal to the grid size every
/// combination is visited exactly once, shuffled.
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    grid: ParameterGrid,
    order: Vec<usize>,
    cursor: usize,
}

impl RandomizedSearch {
    pub fn new(grid: ParameterGrid, n_iter: usize, seed: u64) -> Self {
        let cardinality = grid.cardinality();
        if n_iter > cardinality {
            tracing::warn!(
                "n_iter={} exceeds the {} grid combinations; sampling all of them",
                n_iter,
                cardinality
            );
        }
        let amount = n_iter.min(cardinality);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let order = rand::seq::index::sample(&mut rng, cardinality, amount).into_vec();
        Self {
            grid,
            order,
            cursor: 0,
        }
    }
}

impl SearchStrategy for RandomizedSearch {
    fn suggest(&mut self, count: usize) -> Vec<Candidate> {
        let end = (self.cursor + count).min(self.order.len());
        let batch = self.order[self.cursor..end]
            .iter()
            .filter_map(|&index| self.grid.combination(index).map(|params| Candidate { index, params }))
            .collect();
        self.cursor = end;
        batch
    }

    fn budget(&self) -> usize {
        self.order.len()
    }

    fn name(&self) -> &str {
        "randomized"
    }
}
