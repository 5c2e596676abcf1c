//! Benchmark grids over ring dimensions, input sizes and kernel variants.
//!
//! Every `(ring_dim, size)` pair is a cell group: its inputs are sampled once from a generator
//! seeded with the cell index, so all variants of a group see the same matrix or vector.
//! Each variant then gets a fresh engine context with the keys it needs; its noise is seeded
//! from a separately tagged seed.

use crate::{
    config::{BenchConfig, ConfigError},
    engine::{HeEngine, SimulatedEngine, context_summary, create_engine},
    env,
    error::KernelError,
    matvec::{MatVecVariant, encrypt_replicated, matvec_mult, required_rotation_shifts},
    oracle::{compare_vectors, matvec_expected, poly_eval_expected},
    poly_eval::{PolyEvalVariant, poly_eval},
    report::{render_matrix, render_vector},
    sampler::{cell_rng, noise_seed, random_matrix, random_vector},
    utils::{debug_mem, duration_ms, log_mem, timed},
};
use itertools::iproduct;
use tracing::{debug, info, warn};

const RENDER_LIMIT: usize = 8;

/// One executed benchmark cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchRecord {
    pub ring_dim: u32,
    pub size: usize,
    pub variant: String,
    pub elapsed_ms: f64,
    pub passed: bool,
}

/// Outcome of a kernel run that produced a result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub elapsed_ms: f64,
    pub passed: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    /// Aborts the whole benchmark.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Skips the current cell.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Times one encrypted matrix-vector product and checks it against the plaintext product.
/// Keys must already be generated.
pub fn measure_matvec<E: HeEngine>(
    engine: &E,
    variant: MatVecVariant,
    matrix: &[Vec<f64>],
    vector: &[f64],
    tolerance: f64,
) -> Result<Measurement, KernelError> {
    if matrix.len() != vector.len() {
        return Err(KernelError::DimensionMismatch { expected: matrix.len(), actual: vector.len() });
    }
    let ct = encrypt_replicated(engine, vector)?;
    let (result, elapsed) = timed(|| matvec_mult(engine, variant, matrix, &ct));
    let pt = engine.decrypt(&result?)?;
    let actual = engine.unpack(&pt, vector.len());
    let passed = compare_vectors(&matvec_expected(matrix, vector), &actual, tolerance);
    Ok(Measurement { elapsed_ms: duration_ms(elapsed), passed })
}

/// Times one encrypted polynomial evaluation and checks it against the plaintext polynomial
/// over the full coefficient list.
pub fn measure_poly_eval<E: HeEngine>(
    engine: &E,
    variant: PolyEvalVariant,
    vector: &[f64],
    coeffs: &[f64],
    tolerance: f64,
) -> Result<Measurement, KernelError> {
    let ct = engine.encrypt(&engine.pack(vector)?)?;
    let (result, elapsed) = timed(|| poly_eval(engine, variant, &ct, coeffs));
    let pt = engine.decrypt(&result?)?;
    let actual = engine.unpack(&pt, vector.len());
    let passed = compare_vectors(&poly_eval_expected(vector, coeffs), &actual, tolerance);
    Ok(Measurement { elapsed_ms: duration_ms(elapsed), passed })
}

fn matvec_engine(
    config: &BenchConfig,
    variant: MatVecVariant,
    ring_dim: u32,
    size: usize,
    cell: u64,
) -> Result<SimulatedEngine, BenchError> {
    let mut engine = create_engine(
        &config.fhe,
        config.matvec.depth,
        ring_dim,
        noise_seed(config.fhe.seed, cell),
    )?;
    engine.gen_mult_key().map_err(KernelError::from)?;
    let mut shifts = config.matvec.rotation_indices.clone();
    shifts.extend(required_rotation_shifts(variant, size));
    engine.gen_rotate_keys(&shifts).map_err(KernelError::from)?;
    Ok(engine)
}

/// Runs one matrix-vector cell. `cell` indexes the `(ring_dim, size)` group.
pub fn run_matvec_cell(
    config: &BenchConfig,
    ring_dim: u32,
    size: usize,
    variant_name: &str,
    cell: u64,
) -> Result<BenchRecord, BenchError> {
    let variant: MatVecVariant = variant_name.parse()?;
    let mut rng = cell_rng(config.fhe.seed, cell);
    let matrix = random_matrix(&mut rng, size, config.matvec.max_matrix_value);
    let vector = random_vector(&mut rng, size, config.matvec.max_vector_value);
    if size <= RENDER_LIMIT {
        debug!("matrix:\n{}", render_matrix(&matrix));
        debug!("vector:\n{}", render_vector(&vector));
    }

    let engine = matvec_engine(config, variant, ring_dim, size, cell)?;
    context_summary(&engine, config.fhe.scheme);
    let measurement = measure_matvec(&engine, variant, &matrix, &vector, env::tolerance())?;
    info!(
        "matvec ring_dim={} size={} variant={} time={:.3}ms passed={}",
        ring_dim, size, variant, measurement.elapsed_ms, measurement.passed
    );
    Ok(BenchRecord {
        ring_dim,
        size,
        variant: variant.name().to_string(),
        elapsed_ms: measurement.elapsed_ms,
        passed: measurement.passed,
    })
}

/// Runs one polynomial-evaluation cell. `cell` indexes the `(ring_dim, size)` group.
pub fn run_polyeval_cell(
    config: &BenchConfig,
    ring_dim: u32,
    size: usize,
    variant_name: &str,
    cell: u64,
) -> Result<BenchRecord, BenchError> {
    let variant: PolyEvalVariant = variant_name.parse()?;
    let mut rng = cell_rng(config.fhe.seed, cell);
    let vector = random_vector(&mut rng, size, config.polyeval.max_vector_value);
    if size <= RENDER_LIMIT {
        debug!("vector:\n{}", render_vector(&vector));
    }

    let mut engine = create_engine(
        &config.fhe,
        config.polyeval.depth,
        ring_dim,
        noise_seed(config.fhe.seed, cell),
    )?;
    engine.gen_mult_key().map_err(KernelError::from)?;
    context_summary(&engine, config.fhe.scheme);
    let measurement = measure_poly_eval(
        &engine,
        variant,
        &vector,
        &config.polyeval.chebyshev_coeffs,
        env::tolerance(),
    )?;
    info!(
        "polyeval ring_dim={} size={} variant={} time={:.3}ms passed={}",
        ring_dim, size, variant, measurement.elapsed_ms, measurement.passed
    );
    Ok(BenchRecord {
        ring_dim,
        size,
        variant: variant.name().to_string(),
        elapsed_ms: measurement.elapsed_ms,
        passed: measurement.passed,
    })
}

type CellRunner = fn(&BenchConfig, u32, usize, &str, u64) -> Result<BenchRecord, BenchError>;

fn run_grid(
    config: &BenchConfig,
    kernel: &str,
    ring_dims: &[u32],
    sizes: &[usize],
    variants: &[String],
    run_cell: CellRunner,
) -> Result<Vec<BenchRecord>, ConfigError> {
    let mut records = Vec::new();
    for (cell, (&ring_dim, &size)) in iproduct!(ring_dims, sizes).enumerate() {
        for variant in variants {
            debug_mem(format!("{kernel} ring_dim={ring_dim} size={size} variant={variant}"));
            match run_cell(config, ring_dim, size, variant, cell as u64) {
                Ok(record) => records.push(record),
                Err(BenchError::Kernel(err)) => {
                    warn!("{kernel} cell ring_dim={ring_dim} size={size} skipped: {err}");
                }
                Err(BenchError::Config(err)) => return Err(err),
            }
        }
        log_mem(format!("{kernel} ring_dim={ring_dim} size={size} done"));
    }
    Ok(records)
}

/// Runs the full matrix-vector grid. Cells with an unknown variant or an engine failure are
/// skipped; configuration errors abort.
pub fn run_matvec_benchmark(config: &BenchConfig) -> Result<Vec<BenchRecord>, ConfigError> {
    let matvec = &config.matvec;
    run_grid(
        config,
        "matvec",
        &matvec.ring_dims,
        &matvec.matrix_sizes,
        &matvec.function_variants,
        run_matvec_cell,
    )
}

pub fn run_polyeval_benchmark(config: &BenchConfig) -> Result<Vec<BenchRecord>, ConfigError> {
    let polyeval = &config.polyeval;
    run_grid(
        config,
        "polyeval",
        &polyeval.ring_dims,
        &polyeval.vector_sizes,
        &polyeval.function_variants,
        run_polyeval_cell,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scheme;

    fn small_config() -> BenchConfig {
        let mut config = BenchConfig::default();
        config.fhe.seed = Some(5);
        config.matvec.ring_dims = vec![64];
        config.matvec.matrix_sizes = vec![2, 3];
        config.polyeval.ring_dims = vec![64];
        config.polyeval.vector_sizes = vec![4];
        config
    }

    #[test]
    fn test_matvec_cell_passes() {
        let config = small_config();
        let record = run_matvec_cell(&config, 64, 3, "helib", 0).unwrap();
        assert_eq!(record.variant, "sequential");
        assert_eq!(record.size, 3);
        assert!(record.passed);
        assert!(record.elapsed_ms >= 0.0);
    }

    #[test]
    fn test_unknown_variant_is_a_kernel_error() {
        let config = small_config();
        let err = run_matvec_cell(&config, 64, 2, "bogus", 0).unwrap_err();
        assert!(matches!(err, BenchError::Kernel(KernelError::UnknownVariant { .. })));
    }

    #[test]
    fn test_unsupported_scheme_aborts_grid() {
        let mut config = small_config();
        config.fhe.scheme = Scheme::Bfv;
        assert!(matches!(
            run_matvec_benchmark(&config),
            Err(ConfigError::UnsupportedScheme(Scheme::Bfv))
        ));
    }

    #[test]
    fn test_polyeval_grid() {
        let config = small_config();
        let records = run_polyeval_benchmark(&config).unwrap();
        let variants: Vec<&str> = records.iter().map(|r| r.variant.as_str()).collect();
        assert_eq!(variants, vec!["custom", "engine-native"]);
        // default coefficients have no even terms, so both paths match the reference
        assert!(records.iter().all(|r| r.passed));
    }

    #[test]
    fn test_oversized_matrix_is_skipped() {
        let mut config = small_config();
        // 2 * 20 - 1 = 39 > 32 slots
        config.matvec.matrix_sizes = vec![20, 2];
        let records = run_matvec_benchmark(&config).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.size == 2));
    }
}
