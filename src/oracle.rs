//! Plaintext reference results and the tolerance check decrypted outputs are held to.

use tracing::warn;

/// First position where two sequences differ by more than the tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mismatch {
    Length { expected: usize, actual: usize },
    Value { index: usize, expected: f64, actual: f64 },
}

pub fn matvec_expected(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| row.iter().zip(vector).map(|(m, v)| m * v).sum()).collect()
}

/// `Σ_k coeffs[k] x^k` for every entry, over the full coefficient list.
pub fn poly_eval_expected(vector: &[f64], coeffs: &[f64]) -> Vec<f64> {
    vector
        .iter()
        .map(|&x| coeffs.iter().enumerate().map(|(k, c)| c * x.powi(k as i32)).sum())
        .collect()
}

pub fn first_mismatch(expected: &[f64], actual: &[f64], tolerance: f64) -> Option<Mismatch> {
    if expected.len() != actual.len() {
        return Some(Mismatch::Length { expected: expected.len(), actual: actual.len() });
    }
    expected.iter().zip(actual).enumerate().find_map(|(index, (&e, &a))| {
        // NaN never compares within tolerance
        if (e - a).abs() <= tolerance {
            None
        } else {
            Some(Mismatch::Value { index, expected: e, actual: a })
        }
    })
}

/// Returns `true` when both sequences have the same length and agree within `tolerance`.
/// The first mismatch is logged.
pub fn compare_vectors(expected: &[f64], actual: &[f64], tolerance: f64) -> bool {
    match first_mismatch(expected, actual, tolerance) {
        None => true,
        Some(Mismatch::Length { expected, actual }) => {
            warn!("length mismatch: expected {expected} values, got {actual}");
            false
        }
        Some(Mismatch::Value { index, expected, actual }) => {
            warn!("mismatch at index {index}: expected {expected}, got {actual}");
            false
        }
    }
}
