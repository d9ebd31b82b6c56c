//! Dense linear algebra and Gaussian normalisation helpers.
//!
//! Matrices are stored row-major as `&[Vec<f64>]`. A matrix with exactly one
//! row is a diagonal matrix given by its variance vector: its inverse is the
//! elementwise reciprocal and its determinant the product of the entries.
//! Every other matrix is treated as square and goes through nalgebra's LU
//! decomposition with partial pivoting.

use std::f64::consts::PI;

use nalgebra::DMatrix;

/// Square `DMatrix` view of a row-major matrix. Missing entries read as zero.
fn to_square(matrix: &[Vec<f64>]) -> DMatrix<f64> {
    let n = matrix.len();
    DMatrix::from_fn(n, n, |i, j| matrix[i].get(j).copied().unwrap_or(0.0))
}

/// Inverse of `matrix`, keeping its shape family.
///
/// Returns `None` for an empty or singular full matrix. A single-row matrix is
/// inverted elementwise, so a zero variance yields an infinite entry rather
/// than `None`.
pub fn inverse(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    match matrix {
        [] => None,
        [diagonal] => Some(vec![diagonal.iter().map(|v| 1.0 / v).collect()]),
        _ => {
            let inv = to_square(matrix).lu().try_inverse()?;
            Some(
                (0..inv.nrows())
                    .map(|i| inv.row(i).iter().copied().collect())
                    .collect(),
            )
        }
    }
}

/// Determinant of `matrix`. An empty matrix has determinant zero.
pub fn determinant(matrix: &[Vec<f64>]) -> f64 {
    match matrix {
        [] => 0.0,
        [diagonal] => diagonal.iter().product(),
        _ => to_square(matrix).lu().determinant(),
    }
}

/// Linear-domain normaliser `1 / ((2π)^(D/2) · √det)`.
pub fn gaussian_constant(dimension: usize, determinant: f64) -> f64 {
    1.0 / ((2.0 * PI).powf(0.5 * dimension as f64) * determinant.sqrt())
}

/// Log-domain normaliser `-(D/2)·ln(2π) - ½·ln(det)`.
pub fn gaussian_constant_log(dimension: usize, determinant: f64) -> f64 {
    -0.5 * dimension as f64 * (2.0 * PI).ln() - 0.5 * determinant.ln()
}

/// Squared Mahalanobis distance `Σ (xᵢ - μᵢ)² / σᵢ²` under a diagonal covariance.
pub fn mahalanobis_diagonal(x: &[f64], mean: &[f64], variances: &[f64]) -> f64 {
    x.iter()
        .zip(mean)
        .zip(variances)
        .map(|((xi, mi), vi)| {
            let d = xi - mi;
            d * d / vi
        })
        .sum()
}

/// Squared Mahalanobis distance `(x - μ)ᵗ Σ⁻¹ (x - μ)` from an inverse covariance.
pub fn mahalanobis_full(x: &[f64], mean: &[f64], inverse: &[Vec<f64>]) -> f64 {
    let centered: Vec<f64> = x.iter().zip(mean).map(|(xi, mi)| xi - mi).collect();
    inverse
        .iter()
        .zip(&centered)
        .map(|(row, ci)| ci * row.iter().zip(&centered).map(|(a, cj)| a * cj).sum::<f64>())
        .sum()
}

/// Density of a diagonal-covariance Gaussian with a precomputed normaliser.
pub fn gaussian_density_diagonal(x: &[f64], mean: &[f64], variances: &[f64], constant: f64) -> f64 {
    constant * (-0.5 * mahalanobis_diagonal(x, mean, variances)).exp()
}

/// Density of a full-covariance Gaussian from its determinant and inverse covariance.
pub fn gaussian_density_full(x: &[f64], mean: &[f64], determinant: f64, inverse: &[Vec<f64>]) -> f64 {
    let exponent = mahalanobis_full(x, mean, inverse);
    gaussian_constant(mean.len(), determinant) * (-0.5 * exponent).exp()
}
