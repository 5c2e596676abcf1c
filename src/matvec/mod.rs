//! Encrypted matrix-vector multiplication over diagonal encodings.
//!
//! The input ciphertext must hold the replicated vector (see
//! [`replicate_vector`](crate::encoding::replicate_vector)); the product ends up in its first
//! `n` slots. Both variants compute `Σ_i diag_i ⊙ rot_i(v)` and differ only in how the rotated
//! copies are obtained:
//! * [`MatVecVariant::Sequential`] rotates a running accumulator by one slot at a time, so a
//!   single rotation key suffices but every term depends on the previous one.
//! * [`MatVecVariant::Parallel`] rotates the original ciphertext by `i` for term `i`; terms are
//!   independent and computed on the rayon pool, at the cost of one key per shift.

use crate::{
    encoding::{Vector, extract_diagonals, replicate_vector},
    engine::{EngineError, HeEngine},
    env,
    error::KernelError,
    parallel_iter,
};
use rayon::iter::ParallelIterator;
use std::{fmt, str::FromStr};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatVecVariant {
    Sequential,
    Parallel,
}

impl MatVecVariant {
    pub fn name(&self) -> &'static str {
        match self {
            MatVecVariant::Sequential => "sequential",
            MatVecVariant::Parallel => "parallel",
        }
    }
}

impl fmt::Display for MatVecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatVecVariant {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // "helib" is the name older configs used for the sequential schedule
            "sequential" | "helib" => Ok(MatVecVariant::Sequential),
            "parallel" => Ok(MatVecVariant::Parallel),
            other => Err(KernelError::UnknownVariant { kernel: "matvec", name: other.to_string() }),
        }
    }
}

/// Rotation shifts a variant needs keys for when multiplying an `n×n` matrix.
pub fn required_rotation_shifts(variant: MatVecVariant, n: usize) -> Vec<i32> {
    match variant {
        MatVecVariant::Sequential if n > 1 => vec![1],
        MatVecVariant::Sequential => vec![],
        MatVecVariant::Parallel => (1..n as i32).collect(),
    }
}

/// Packs and encrypts the replicated form of `vector`.
pub fn encrypt_replicated<E: HeEngine>(
    engine: &E,
    vector: &[f64],
) -> Result<E::Ciphertext, EngineError> {
    let replicated: Vector = replicate_vector(vector);
    let pt = engine.pack(&replicated)?;
    engine.encrypt(&pt)
}

/// Multiplies `matrix` with the encrypted replicated vector `ct` using `variant`.
pub fn matvec_mult<E: HeEngine>(
    engine: &E,
    variant: MatVecVariant,
    matrix: &[Vec<f64>],
    ct: &E::Ciphertext,
) -> Result<E::Ciphertext, KernelError> {
    let diagonals = extract_diagonals(matrix);
    let plain_diagonals =
        diagonals.iter().map(|diag| engine.pack(diag)).collect::<Result<Vec<_>, _>>()?;
    debug!("matvec {} over {} diagonals", variant, plain_diagonals.len());
    let result = match variant {
        MatVecVariant::Sequential => sequential(engine, &plain_diagonals, ct)?,
        MatVecVariant::Parallel => parallel(engine, &plain_diagonals, ct)?,
    };
    Ok(result)
}

fn sequential<E: HeEngine>(
    engine: &E,
    diagonals: &[E::Plaintext],
    ct: &E::Ciphertext,
) -> Result<E::Ciphertext, EngineError> {
    let mut terms = Vec::with_capacity(diagonals.len());
    let mut tmp = ct.clone();
    for (i, diag) in diagonals.iter().enumerate() {
        if i > 0 {
            tmp = engine.eval_rotate(&tmp, 1)?;
        }
        terms.push(engine.eval_mult_plain(&tmp, diag)?);
    }
    engine.eval_add_many(&terms)
}

fn parallel<E: HeEngine>(
    engine: &E,
    diagonals: &[E::Plaintext],
    ct: &E::Ciphertext,
) -> Result<E::Ciphertext, EngineError> {
    let batch = env::matvec_parallel_terms().unwrap_or(diagonals.len());
    parallel_batched(engine, diagonals, ct, batch)
}

/// Parallel variant with at most `batch` terms in flight at once.
fn parallel_batched<E: HeEngine>(
    engine: &E,
    diagonals: &[E::Plaintext],
    ct: &E::Ciphertext,
    batch: usize,
) -> Result<E::Ciphertext, EngineError> {
    let n = diagonals.len();
    let batch = batch.max(1);
    let mut terms = Vec::with_capacity(n);
    let mut start = 0;
    while start < n {
        let end = (start + batch).min(n);
        let chunk = parallel_iter!(start..end)
            .map(|i| {
                if i == 0 {
                    return engine.eval_mult_plain(ct, &diagonals[0]);
                }
                let rotated = engine.eval_rotate(ct, i as i32)?;
                engine.eval_mult_plain(&rotated, &diagonals[i])
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        terms.extend(chunk);
        start = end;
    }
    // every term has to be in place before the reduction
    engine.eval_add_many(&terms)
}

/// Encrypted inner product of `ct` with a plaintext weight vector. The result sits in slot 0.
///
/// Slots of `ct` past `weights.len()` are masked by the zero padding of the packed weights, so
/// cumulative shift-1 rotations followed by one sum fold every product onto slot 0.
pub fn inner_product<E: HeEngine>(
    engine: &E,
    ct: &E::Ciphertext,
    weights: &[f64],
) -> Result<E::Ciphertext, KernelError> {
    if weights.is_empty() {
        return Err(KernelError::DimensionMismatch { expected: 1, actual: 0 });
    }
    let pt = engine.pack(weights)?;
    let mut tmp = engine.eval_mult_plain(ct, &pt)?;
    let mut rotated = Vec::with_capacity(weights.len());
    for i in 0..weights.len() {
        if i > 0 {
            tmp = engine.eval_rotate(&tmp, 1)?;
        }
        rotated.push(tmp.clone());
    }
    Ok(engine.eval_add_many(&rotated)?)
}
