use ncv_types::{DataError, Dataset, NcvResult, TrainTestSplit};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Split `dataset` once into disjoint train and test partitions.
///
/// The test partition holds `ceil(test_size * n)` rows drawn by a seeded
/// permutation; both partitions must end up non-empty.
pub fn train_test_split(dataset: &Dataset, test_size: f64, seed: u64) -> NcvResult<TrainTestSplit> {
    let n = dataset.n_rows();
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DataError::InvalidFormat {
            message: format!("test_size must be in (0, 1), got {}", test_size),
        }
        .into());
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DataError::InsufficientData {
            message: format!("{} rows cannot be split with test_size {}", n, test_size),
        }
        .into());
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let test_indices = permutation[..n_test].to_vec();
    let train_indices = permutation[n_test..].to_vec();

    tracing::info!(
        "Split {} rows into {} train / {} test (seed {})",
        n,
        train_indices.len(),
        test_indices.len(),
        seed
    );

    Ok(TrainTestSplit {
        train: dataset.select(&train_indices),
        test: dataset.select(&test_indices),
        train_indices,
        test_indices,
    })
}
