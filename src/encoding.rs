//! Plaintext layouts for rotation-based matrix-vector multiplication.
//!
//! A packed ciphertext cannot be indexed, only rotated. Relabelling the matrix by its cyclic
//! diagonals turns `M·v` into `Σ_i diag_i ⊙ rot_i(v)`, which needs nothing but rotations,
//! slot-wise products and additions.

pub type Matrix = Vec<Vec<f64>>;
pub type Vector = Vec<f64>;

/// `diag[i][j] = matrix[j][(i + j) mod n]`.
///
/// Panics if the matrix is empty or not square.
pub fn extract_diagonals(matrix: &[Vec<f64>]) -> Matrix {
    let n = matrix.len();
    assert!(n >= 1, "matrix must have at least one row");
    assert!(matrix.iter().all(|row| row.len() == n), "matrix must be square");
    (0..n).map(|i| (0..n).map(|j| matrix[j][(i + j) % n]).collect()).collect()
}

/// Inverse of [`extract_diagonals`]: `matrix[j][k] = diag[(k - j) mod n][j]`.
pub fn recover_matrix(diagonals: &[Vec<f64>]) -> Matrix {
    let n = diagonals.len();
    assert!(n >= 1, "diagonal set must have at least one row");
    assert!(diagonals.iter().all(|row| row.len() == n), "diagonal set must be square");
    (0..n).map(|j| (0..n).map(|k| diagonals[(k + n - j) % n][j]).collect()).collect()
}

/// Concatenates the vector with itself minus its last element (length `2n - 1`).
///
/// After packing, a left rotation by any `i < n` exposes `v[i..] ++ v[..i]` in the first `n`
/// slots without picking up values from unrelated slots.
pub fn replicate_vector(vector: &[f64]) -> Vector {
    let mut replicated = Vec::with_capacity((2 * vector.len()).saturating_sub(1));
    replicated.extend_from_slice(vector);
    if let Some((_, head)) = vector.split_last() {
        replicated.extend_from_slice(head);
    }
    replicated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_diagonals_2x2() {
        let matrix = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(extract_diagonals(&matrix), vec![vec![1.0, 4.0], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_extract_diagonals_formula_and_inverse() {
        let n = 5;
        let matrix: Matrix =
            (0..n).map(|r| (0..n).map(|c| (r * 10 + c) as f64).collect()).collect();
        let diagonals = extract_diagonals(&matrix);
        for i in 0..n {
            for j in 0..n {
                assert_eq!(diagonals[i][j], matrix[j][(i + j) % n]);
            }
        }
        assert_eq!(recover_matrix(&diagonals), matrix);
    }

    #[test]
    fn test_single_element() {
        let matrix = vec![vec![7.5]];
        assert_eq!(extract_diagonals(&matrix), matrix);
        assert_eq!(replicate_vector(&[3.0]), vec![3.0]);
    }

    #[test]
    #[should_panic(expected = "square")]
    fn test_extract_diagonals_rejects_ragged() {
        extract_diagonals(&[vec![1.0, 2.0], vec![3.0]]);
    }

    #[test]
    fn test_replicate_vector_windows() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        let replicated = replicate_vector(&v);
        assert_eq!(replicated, vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0]);
        for i in 0..v.len() {
            let window = &replicated[i..i + v.len()];
            let expected: Vec<f64> = (0..v.len()).map(|j| v[(i + j) % v.len()]).collect();
            assert_eq!(window, expected.as_slice());
        }
    }
}
