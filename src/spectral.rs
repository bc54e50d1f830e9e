use crate::basis::basis_polynomial;
use crate::mesh::{Mesh, MeshDim};
use nalgebra::DMatrix;

/// Nodal <-> modal change of representation along a single dimension.
///
/// The Vandermonde matrix `V[i][j] = phi_j(x_i)` (phi = Legendre P_j or
/// Chebyshev T_j at this dimension's collocation points) maps modal
/// coefficients to nodal values; its inverse runs the other way. Exact in
/// exact arithmetic for polynomials of degree < order.
pub struct ModalTransform {
    vandermonde: DMatrix<f64>,
    inverse: DMatrix<f64>,
}

impl ModalTransform {
    pub fn new(dim: &MeshDim) -> Self {
        let points = &dim.grid().points;
        let n = dim.order();

        let vandermonde =
            DMatrix::from_fn(n, n, |r, c| basis_polynomial(dim.basis(), c, points[r]));
        let inverse = vandermonde
            .clone()
            .try_inverse()
            .expect("Vandermonde matrices are invertible for distinct collocation points");

        Self {
            vandermonde,
            inverse,
        }
    }

    pub(crate) fn forward(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    pub(crate) fn backward(&self) -> &DMatrix<f64> {
        &self.vandermonde
    }
}

/// Apply `matrix` to every grid line of `data` running along `axis`.
///
/// `data` is stored with dimension 0 varying fastest; the output extent along
/// `axis` is `matrix.nrows()` (the matrix may be rectangular).
pub(crate) fn apply_along_axis(
    data: &[f64],
    extents: &[usize],
    axis: usize,
    matrix: &DMatrix<f64>,
) -> Vec<f64> {
    let n_in = extents[axis];
    let n_out = matrix.nrows();
    assert_eq!(
        matrix.ncols(),
        n_in,
        "Matrix must have one column per collocation point along the target axis!"
    );
    assert_eq!(
        data.len(),
        extents.iter().product::<usize>(),
        "Data length must match the tensor-product grid!"
    );

    let stride: usize = extents[..axis].iter().product();
    let outer: usize = extents[axis + 1..].iter().product();

    let mut out = vec![0.0; stride * n_out * outer];
    for o in 0..outer {
        for s in 0..stride {
            let in_base = o * stride * n_in + s;
            let out_base = o * stride * n_out + s;
            for r in 0..n_out {
                let mut acc = 0.0;
                for k in 0..n_in {
                    acc += matrix[(r, k)] * data[in_base + k * stride];
                }
                out[out_base + r * stride] = acc;
            }
        }
    }
    out
}

/// Spectral coefficients of a nodal value array, dimension 0 varying fastest
pub fn nodal_to_modal(values: &[f64], mesh: &Mesh) -> Vec<f64> {
    let extents = mesh.extents();
    let mut coeffs = values.to_vec();
    for axis in 0..mesh.num_dims() {
        coeffs = apply_along_axis(
            &coeffs,
            &extents,
            axis,
            ModalTransform::new(mesh.dim(axis)).forward(),
        );
    }
    coeffs
}

/// Nodal values of a spectral coefficient array; inverse of [nodal_to_modal]
pub fn modal_to_nodal(coefficients: &[f64], mesh: &Mesh) -> Vec<f64> {
    let extents = mesh.extents();
    let mut values = coefficients.to_vec();
    for axis in 0..mesh.num_dims() {
        values = apply_along_axis(
            &values,
            &extents,
            axis,
            ModalTransform::new(mesh.dim(axis)).backward(),
        );
    }
    values
}

/// Per-dimension magnitudes of the spectral coefficients: one sequence per
/// dimension with one entry per mode index 0..order-1. Along each dimension
/// the other dimensions' indices collapse by RMS, so a 1-D mesh yields the
/// plain absolute values of the coefficients.
pub fn power_monitors(values: &[f64], mesh: &Mesh) -> Vec<Vec<f64>> {
    let coeffs = nodal_to_modal(values, mesh);
    let extents = mesh.extents();
    let num_points = mesh.num_points();

    let mut sums: Vec<Vec<f64>> = extents.iter().map(|n| vec![0.0; *n]).collect();
    for (idx, c) in coeffs.iter().enumerate() {
        let mut rem = idx;
        for (axis, n) in extents.iter().enumerate() {
            sums[axis][rem % n] += c * c;
            rem /= n;
        }
    }

    sums.iter()
        .zip(extents.iter())
        .map(|(axis_sums, n)| {
            let complement = (num_points / n) as f64;
            axis_sums.iter().map(|s| (s / complement).sqrt()).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{Basis, Quadrature};

    const SPECTRAL_ACCURACY: f64 = 1e-10;

    fn legendre_sample(coeffs: &[f64], points: &[f64]) -> Vec<f64> {
        points
            .iter()
            .map(|x| {
                coeffs
                    .iter()
                    .enumerate()
                    .map(|(k, c)| c * basis_polynomial(Basis::Legendre, k, *x))
                    .sum()
            })
            .collect()
    }

    #[test]
    fn modal_coefficients_of_a_legendre_combination_are_recovered() {
        let target_coeffs = [0.75, -0.25, 1.5, 0.0, 2.0e-3];

        for quadrature in [Quadrature::Gauss, Quadrature::GaussLobatto] {
            let mesh = Mesh::new_1d(5, Basis::Legendre, quadrature).unwrap();
            let values = legendre_sample(&target_coeffs, &mesh.dim(0).collocation_points());

            let coeffs = nodal_to_modal(&values, &mesh);
            for (c_ref, c) in target_coeffs.iter().zip(coeffs.iter()) {
                assert!((c_ref - c).abs() < SPECTRAL_ACCURACY);
            }
        }
    }

    #[test]
    fn power_monitors_of_a_low_degree_polynomial_vanish_above_its_degree() {
        // cubic sampled on 8-point grids: modes 4..=7 are round-off
        let cubic = |x: f64| 0.3 * x * x * x - 1.1 * x + 0.7;

        for basis in [Basis::Legendre, Basis::Chebyshev] {
            for quadrature in [Quadrature::Gauss, Quadrature::GaussLobatto] {
                let mesh = Mesh::new_1d(8, basis, quadrature).unwrap();
                let values: Vec<f64> = mesh
                    .dim(0)
                    .collocation_points()
                    .iter()
                    .map(|x| cubic(*x))
                    .collect();

                let monitors = power_monitors(&values, &mesh);
                let peak = monitors[0].iter().cloned().fold(0.0, f64::max);
                for mode in 4..8 {
                    assert!(
                        monitors[0][mode] < SPECTRAL_ACCURACY * peak,
                        "mode {} of {}/{} does not vanish",
                        mode,
                        basis,
                        quadrature
                    );
                }
            }
        }
    }

    #[test]
    fn modal_to_nodal_inverts_nodal_to_modal() {
        let mesh = Mesh::new_1d(9, Basis::Legendre, Quadrature::GaussLobatto).unwrap();
        let values: Vec<f64> = mesh
            .dim(0)
            .collocation_points()
            .iter()
            .map(|x| (3.0 * x).sin() + 0.2 * x)
            .collect();

        let round_trip = modal_to_nodal(&nodal_to_modal(&values, &mesh), &mesh);
        for (v_ref, v) in values.iter().zip(round_trip.iter()) {
            assert!((v_ref - v).abs() < SPECTRAL_ACCURACY);
        }
    }

    #[test]
    fn two_dimensional_monitors_collapse_the_other_axis_by_rms() {
        let dim_u = crate::mesh::MeshDim::new(5, Basis::Legendre, Quadrature::GaussLobatto).unwrap();
        let dim_v = crate::mesh::MeshDim::new(3, Basis::Legendre, Quadrature::GaussLobatto).unwrap();
        let mesh = Mesh::new([dim_u, dim_v]);

        // f(u, v) = P_2(u): a single modal coefficient at (2, 0)
        let u_points = dim_u.collocation_points();
        let mut values = Vec::with_capacity(mesh.num_points());
        for _v_idx in 0..3 {
            for u in u_points.iter() {
                values.push(basis_polynomial(Basis::Legendre, 2, *u));
            }
        }

        let monitors = power_monitors(&values, &mesh);

        // axis 0: all power in mode 2, spread over the 3 v-indices
        assert!((monitors[0][2] - (1.0_f64 / 3.0).sqrt()).abs() < SPECTRAL_ACCURACY);
        for mode in [0, 1, 3, 4] {
            assert!(monitors[0][mode] < SPECTRAL_ACCURACY);
        }

        // axis 1: all power in mode 0, spread over the 5 u-indices
        assert!((monitors[1][0] - (1.0_f64 / 5.0).sqrt()).abs() < SPECTRAL_ACCURACY);
        for mode in [1, 2] {
            assert!(monitors[1][mode] < SPECTRAL_ACCURACY);
        }
    }
}
