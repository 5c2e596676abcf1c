//! Random benchmark inputs. The generator is always passed in, so tests can seed it.

use crate::encoding::{Matrix, Vector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::warn;

const NOISE_DOMAIN_TAG: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seeded generator for one benchmark cell, or an entropy-seeded one when `seed` is `None`.
pub fn cell_rng(seed: Option<u64>, cell: u64) -> ChaCha20Rng {
    match seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed.wrapping_add(cell)),
        None => ChaCha20Rng::from_rng(&mut rand::rng()),
    }
}

/// Seed for the engine noise of one benchmark cell. Tagged so its stream never coincides with
/// the input stream of [`cell_rng`] for the same cell.
pub fn noise_seed(seed: Option<u64>, cell: u64) -> Option<u64> {
    seed.map(|seed| seed.wrapping_add(cell) ^ NOISE_DOMAIN_TAG)
}

/// `dim×dim` matrix with entries uniform in `[-max_value, max_value]`.
pub fn random_matrix<R: Rng>(rng: &mut R, dim: usize, max_value: f64) -> Matrix {
    if max_value == 0.0 {
        warn!("max matrix value is 0, matrix will be all zeros");
    }
    let bound = max_value.abs();
    (0..dim).map(|_| (0..dim).map(|_| rng.random_range(-bound..=bound)).collect()).collect()
}

/// Vector of length `dim` with entries uniform in `[-max_value, max_value]`.
pub fn random_vector<R: Rng>(rng: &mut R, dim: usize, max_value: f64) -> Vector {
    if max_value == 0.0 {
        warn!("max vector value is 0, vector will be all zeros");
    }
    let bound = max_value.abs();
    (0..dim).map(|_| rng.random_range(-bound..=bound)).collect()
}
