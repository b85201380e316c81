//! Dense linear solves for the conductance network.
//!
//! Gaussian elimination with partial pivoting, plus a ridge-regularised
//! least-squares fallback for systems that still come out numerically
//! singular. Floating regions are pinned before the network reaches here,
//! so the fallback does not shift well-posed networks.

use std::cmp::Ordering;

use ndarray::{Array1, Array2};
use tracing::trace;

/// Pivots smaller than this fraction of the largest entry count as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Ridge term for the normal equations, relative to their largest diagonal.
const RIDGE: f64 = 1e-8;

/// Solve `a * x = b` exactly. `None` when `a` is (numerically) singular.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    debug_assert_eq!(a.dim(), (n, n));

    let mut m = a.clone();
    let mut x = b.clone();
    let scale = m.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let tol = PIVOT_TOLERANCE * scale;

    for k in 0..n {
        let p = (k..n)
            .max_by(|&i, &j| {
                m[[i, k]]
                    .abs()
                    .partial_cmp(&m[[j, k]].abs())
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(k);
        let pivot_abs = m[[p, k]].abs();
        if pivot_abs.is_nan() || pivot_abs <= tol {
            return None;
        }
        if p != k {
            for c in k..n {
                m.swap([k, c], [p, c]);
            }
            x.swap(k, p);
        }

        let pivot = m[[k, k]];
        for i in k + 1..n {
            let f = m[[i, k]] / pivot;
            if f == 0.0 {
                continue;
            }
            for c in k..n {
                let delta = f * m[[k, c]];
                m[[i, c]] -= delta;
            }
            let delta = f * x[k];
            x[i] -= delta;
        }
    }

    for k in (0..n).rev() {
        let mut s = x[k];
        for c in k + 1..n {
            s -= m[[k, c]] * x[c];
        }
        x[k] = s / m[[k, k]];
    }
    Some(x)
}

/// Least-squares solution of `a * x = b` via regularised normal equations.
///
/// For a consistent singular system this approaches the minimum-norm
/// solution: components in the null space of `a` are driven to zero.
pub fn least_squares(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let at = a.t();
    let mut normal = at.dot(a);
    let rhs = at.dot(b);

    let diag_max = (0..n).fold(1.0_f64, |acc, i| acc.max(normal[[i, i]]));
    let ridge = RIDGE * diag_max;
    for i in 0..n {
        normal[[i, i]] += ridge;
    }
    solve(&normal, &rhs).unwrap_or_else(|| Array1::zeros(n))
}

/// Exact solve, falling back to least squares when `a` is singular.
pub fn solve_or_least_squares(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    match solve(a, b) {
        Some(x) => x,
        None => {
            trace!(n = b.len(), "singular system, using least squares");
            least_squares(a, b)
        }
    }
}
