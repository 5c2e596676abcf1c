//! Environment variable helpers for runtime configuration.

pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// `FHE_KERNELS_MATVEC_PARALLEL_TERMS`: max number of diagonal terms the parallel matrix-vector
/// variant computes at once. If unset/invalid, all terms are dispatched together.
pub fn matvec_parallel_terms() -> Option<usize> {
    std::env::var("FHE_KERNELS_MATVEC_PARALLEL_TERMS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// `FHE_KERNELS_TOLERANCE`: absolute tolerance used by the correctness check (default: 0.01).
pub fn tolerance() -> f64 {
    std::env::var("FHE_KERNELS_TOLERANCE")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(DEFAULT_TOLERANCE)
}
