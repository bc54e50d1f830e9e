use crate::mesh::MeshDim;
use nalgebra::DMatrix;

use std::fmt;

/// How far outside [-1, 1] a target logical coordinate may sit before the
/// request is treated as extrapolation and rejected
pub const DEFAULT_EXTRAPOLATION_TOLERANCE: f64 = 1e-12;

/// A requested interpolation target lies outside the reference interval.
/// Extrapolation is never performed here; it is fatal to the offending call only.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainError {
    pub target: f64,
    pub tolerance: f64,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Target logical coordinate ({}) lies outside [-1, 1] by more than {}; cannot interpolate!",
            self.target, self.tolerance
        )
    }
}

impl std::error::Error for DomainError {}

/// Lagrange interpolation matrix in barycentric form: one row per target
/// point, evaluated against the Lagrange basis of the source points.
fn lagrange_matrix(source_points: &[f64], targets: &[f64]) -> DMatrix<f64> {
    let n = source_points.len();

    // barycentric weights of the source grid
    let bary: Vec<f64> = (0..n)
        .map(|s| {
            (0..n)
                .filter(|k| *k != s)
                .map(|k| source_points[s] - source_points[k])
                .product::<f64>()
                .recip()
        })
        .collect();

    let mut matrix = DMatrix::zeros(targets.len(), n);
    for (row, target) in targets.iter().enumerate() {
        if let Some(coincident) = source_points.iter().position(|x| x == target) {
            matrix[(row, coincident)] = 1.0;
            continue;
        }

        let terms: Vec<f64> = (0..n).map(|s| bary[s] / (target - source_points[s])).collect();
        let denominator: f64 = terms.iter().sum();
        for (col, term) in terms.iter().enumerate() {
            matrix[(row, col)] = term / denominator;
        }
    }
    matrix
}

/// Interpolation from one collocation grid to another along a single
/// dimension. The matrix is precomputed once; application is a
/// matrix-vector product. Exact (to round-off) for source data that is a
/// polynomial of degree < source order.
pub struct RegularGridInterpolator {
    matrix: DMatrix<f64>,
}

impl RegularGridInterpolator {
    pub fn new(source: &MeshDim, target: &MeshDim) -> Self {
        Self {
            matrix: lagrange_matrix(&source.grid().points, &target.grid().points),
        }
    }

    /// Interpolate a nodal value array of length `source.order()` onto the
    /// target grid
    pub fn interpolate(&self, values: &[f64]) -> Vec<f64> {
        apply(&self.matrix, values)
    }

    pub(crate) fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

/// Interpolation from a collocation grid to arbitrary logical coordinates in
/// [-1, 1]
#[derive(Debug)]
pub struct IrregularInterpolator {
    matrix: DMatrix<f64>,
}

impl IrregularInterpolator {
    pub fn new(source: &MeshDim, targets: &[f64]) -> Result<Self, DomainError> {
        Self::with_tolerance(source, targets, DEFAULT_EXTRAPOLATION_TOLERANCE)
    }

    pub fn with_tolerance(
        source: &MeshDim,
        targets: &[f64],
        tolerance: f64,
    ) -> Result<Self, DomainError> {
        for target in targets {
            if target.abs() > 1.0 + tolerance {
                return Err(DomainError {
                    target: *target,
                    tolerance,
                });
            }
        }

        Ok(Self {
            matrix: lagrange_matrix(&source.grid().points, targets),
        })
    }

    /// Interpolate a nodal value array of length `source.order()` to the
    /// target coordinates
    pub fn interpolate(&self, values: &[f64]) -> Vec<f64> {
        apply(&self.matrix, values)
    }

    pub(crate) fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

fn apply(matrix: &DMatrix<f64>, values: &[f64]) -> Vec<f64> {
    assert_eq!(
        values.len(),
        matrix.ncols(),
        "Nodal value array length must match the source grid!"
    );

    (0..matrix.nrows())
        .map(|r| (0..matrix.ncols()).map(|c| matrix[(r, c)] * values[c]).sum())
        .collect()
}
