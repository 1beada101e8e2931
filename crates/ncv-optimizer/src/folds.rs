//! K-fold row partitioning.

use ncv_types::{NcvResult, TuningError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One train/validation partition of `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub fold_idx: usize,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// K-fold splitter. With `shuffle` set the row order is permuted by a
/// ChaCha8 stream seeded with `seed`, so equal seeds give equal folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Partition `0..n_samples` into `n_splits` folds.
    ///
    /// The first `n_samples % n_splits` folds hold one extra row. Test
    /// indices keep the (possibly shuffled) order; train indices are sorted.
    pub fn split(&self, n_samples: usize) -> NcvResult<Vec<FoldSplit>> {
        if self.n_splits < 2 {
            return Err(TuningError::TooFewSplits {
                n_splits: self.n_splits,
            }
            .into());
        }
        if n_samples < self.n_splits {
            return Err(TuningError::TooFewSamples {
                n_samples,
                n_splits: self.n_splits,
            }
            .into());
        }

        let mut order: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            order.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut splits = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold_idx in 0..self.n_splits {
            let size = if fold_idx < remainder { base + 1 } else { base };
            let end = start + size;

            let test_indices = order[start..end].to_vec();
            let mut train_indices: Vec<usize> = order[..start]
                .iter()
                .chain(order[end..].iter())
                .copied()
                .collect();
            train_indices.sort_unstable();

            splits.push(FoldSplit {
                fold_idx,
                train_indices,
                test_indices,
            });
            start = end;
        }

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn folds_partition_all_rows() {
        let splits = KFold::new(5, 1).split(23).unwrap();
        assert_eq!(splits.len(), 5);

        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![5, 5, 5, 4, 4]);

        let mut seen = HashSet::new();
        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 23);
            let train: HashSet<_> = split.train_indices.iter().collect();
            assert!(split.test_indices.iter().all(|i| !train.contains(i)));
            for i in &split.test_indices {
                assert!(seen.insert(*i), "row {i} in two test folds");
            }
        }
        assert_eq!(seen.len(), 23);
    }

    #[test]
    fn fixed_seed_reproduces_partitions() {
        let a = KFold::new(2, 1).split(40).unwrap();
        let b = KFold::new(2, 1).split(40).unwrap();
        let c = KFold::new(2, 3).split(40).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unshuffled_folds_are_contiguous() {
        let splits = KFold::new(3, 0).without_shuffle().split(6).unwrap();
        assert_eq!(splits[0].test_indices, vec![0, 1]);
        assert_eq!(splits[2].test_indices, vec![4, 5]);
        assert_eq!(splits[1].train_indices, vec![0, 1, 4, 5]);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        assert!(matches!(
            KFold::new(1, 0).split(10),
            Err(ncv_types::NcvError::Tuning(TuningError::TooFewSplits { n_splits: 1 }))
        ));
        assert!(matches!(
            KFold::new(5, 0).split(3),
            Err(ncv_types::NcvError::Tuning(TuningError::TooFewSamples { .. }))
        ));
    }
}
