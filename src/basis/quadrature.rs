use nalgebra::{DMatrix, SymmetricEigen};

use std::f64::consts::PI;

/// Evaluate the Legendre polynomial P_n at `x` via the three-term recurrence.
pub fn legendre(n: usize, x: f64) -> f64 {
    match n {
        0 => 1.0,
        1 => x,
        _ => {
            let mut p_prev = 1.0;
            let mut p = x;
            for k in 1..n {
                let k_f = k as f64;
                let p_next = ((2.0 * k_f + 1.0) * x * p - k_f * p_prev) / (k_f + 1.0);
                p_prev = p;
                p = p_next;
            }
            p
        }
    }
}

/// Evaluate the Chebyshev polynomial of the first kind T_n at `x`.
pub fn chebyshev(n: usize, x: f64) -> f64 {
    match n {
        0 => 1.0,
        1 => x,
        _ => {
            let mut t_prev = 1.0;
            let mut t = x;
            for _ in 1..n {
                let t_next = 2.0 * x * t - t_prev;
                t_prev = t;
                t = t_next;
            }
            t
        }
    }
}

// https://en.wikipedia.org/wiki/Gaussian_quadrature#Gauss%E2%80%93Legendre_quadrature
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let betas: Vec<f64> = (1..n)
        .map(|i| 0.5 / (1.0 - (2.0 * i as f64).powi(-2)).sqrt())
        .collect();

    let polymat: DMatrix<f64> = DMatrix::from_fn(n, n, |r, c| {
        if r == c + 1 {
            betas[r - 1]
        } else if c == r + 1 {
            betas[c - 1]
        } else {
            0.0
        }
    });

    let eigen_decomp = SymmetricEigen::new(polymat);

    let mut xw: Vec<(f64, f64)> = eigen_decomp
        .eigenvalues
        .iter()
        .cloned()
        .zip(
            eigen_decomp
                .eigenvectors
                .row(0)
                .iter()
                .map(|weight| (*weight).powi(2) * 2.0),
        )
        .collect();

    xw.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    xw.drain(0..).unzip()
}

/// Gauss-Lobatto-Legendre points and weights. The endpoints sit exactly at ±1;
/// the interior points are the Gauss-Jacobi(1,1) points, computed from the
/// symmetric Jacobi matrix as in [gauss_legendre].
pub fn gauss_lobatto_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut points = Vec::with_capacity(n);
    points.push(-1.0);

    let num_interior = n - 2;
    if num_interior > 0 {
        let betas: Vec<f64> = (1..num_interior)
            .map(|k| {
                let k_f = k as f64;
                (k_f * (k_f + 2.0) / ((2.0 * k_f + 1.0) * (2.0 * k_f + 3.0))).sqrt()
            })
            .collect();

        let polymat: DMatrix<f64> = DMatrix::from_fn(num_interior, num_interior, |r, c| {
            if r == c + 1 {
                betas[r - 1]
            } else if c == r + 1 {
                betas[c - 1]
            } else {
                0.0
            }
        });

        let mut interior: Vec<f64> = SymmetricEigen::new(polymat).eigenvalues.iter().cloned().collect();
        interior.sort_by(|a, b| a.partial_cmp(b).unwrap());
        points.extend(interior);
    }

    points.push(1.0);

    // w_j = 2 / (n (n - 1) P_{n-1}(x_j)^2), endpoints included
    let scale = 2.0 / ((n * (n - 1)) as f64);
    let weights = points.iter().map(|x| scale / legendre(n - 1, *x).powi(2)).collect();

    (points, weights)
}

/// Chebyshev-Gauss points with Fejér-1 weights. The weights integrate plain dx
/// (not the Chebyshev weight function) so their sum is the measure of [-1, 1].
pub fn chebyshev_gauss(n: usize) -> (Vec<f64>, Vec<f64>) {
    let thetas: Vec<f64> = (0..n)
        .map(|j| PI * (2.0 * j as f64 + 1.0) / (2.0 * n as f64))
        .collect();

    let points = thetas.iter().map(|theta| -theta.cos()).collect();

    let weights = thetas
        .iter()
        .map(|theta| {
            let correction: f64 = (1..=n / 2)
                .map(|m| {
                    let m_f = m as f64;
                    (2.0 * m_f * theta).cos() / (4.0 * m_f * m_f - 1.0)
                })
                .sum();
            (2.0 / n as f64) * (1.0 - 2.0 * correction)
        })
        .collect();

    (points, weights)
}

/// Chebyshev-Gauss-Lobatto points with Clenshaw-Curtis weights (integrating
/// plain dx, summing to 2).
pub fn chebyshev_gauss_lobatto(n: usize) -> (Vec<f64>, Vec<f64>) {
    let big_n = n - 1;
    let thetas: Vec<f64> = (0..n).map(|j| PI * j as f64 / big_n as f64).collect();

    let points: Vec<f64> = thetas.iter().map(|theta| -theta.cos()).collect();

    let weights = thetas
        .iter()
        .enumerate()
        .map(|(j, theta)| {
            let correction: f64 = (1..=big_n / 2)
                .map(|m| {
                    let m_f = m as f64;
                    let b = if 2 * m == big_n { 1.0 } else { 2.0 };
                    b * (2.0 * m_f * theta).cos() / (4.0 * m_f * m_f - 1.0)
                })
                .sum();
            let c = if j == 0 || j == big_n { 1.0 } else { 2.0 };
            (c / big_n as f64) * (1.0 - correction)
        })
        .collect();

    (points, weights)
}
