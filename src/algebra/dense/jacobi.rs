#![allow(non_snake_case)]

use crate::algebra::{AsFloatT, FloatT};

const JACOBI_MAX_SWEEPS: usize = 100;

// Cyclic Jacobi eigendecomposition of the symmetric column major A.
// On return w holds the eigenvalues and the columns of V the
// eigenvectors.  A is overwritten with its (almost) diagonal form.
pub(crate) fn jacobi_eigen<T: FloatT>(A: &mut [T], n: usize, w: &mut [T], V: &mut [T]) {
    V.fill(T::zero());
    for i in 0..n {
        V[i * n + i] = T::one();
    }

    // only the upper triangle is meaningful on entry
    for col in 0..n {
        for row in (col + 1)..n {
            A[col * n + row] = A[row * n + col];
        }
    }

    let eps = T::epsilon();
    let tol = eps * eps;
    let two: T = (2.).as_T();
    // off-diagonals below this are rounding noise
    let floor = eps * A.iter().fold(T::zero(), |m, &x| T::max(m, x.abs()));

    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut converged = true;

        for i in 0..n {
            for j in (i + 1)..n {
                let a = A[i * n + i];
                let b = A[j * n + j];
                let d = A[j * n + i];

                if d.abs() <= floor || d * d <= tol * (a * b).abs() {
                    continue;
                }
                converged = false;

                let zeta = (b - a) / (two * d);
                let root = T::sqrt(T::one() + zeta * zeta);
                let t = if zeta > T::zero() {
                    T::recip(zeta + root)
                } else {
                    -T::recip(root - zeta)
                };
                let c = T::recip(T::sqrt(T::one() + t * t));
                let s = c * t;

                // rotate columns i and j, then rows i and j
                for k in 0..n {
                    let xi = A[i * n + k];
                    let xj = A[j * n + k];
                    A[i * n + k] = c * xi - s * xj;
                    A[j * n + k] = s * xi + c * xj;

                    let vi = V[i * n + k];
                    let vj = V[j * n + k];
                    V[i * n + k] = c * vi - s * vj;
                    V[j * n + k] = s * vi + c * vj;
                }
                for k in 0..n {
                    let xi = A[k * n + i];
                    let xj = A[k * n + j];
                    A[k * n + i] = c * xi - s * xj;
                    A[k * n + j] = s * xi + c * xj;
                }
                A[j * n + i] = T::zero();
                A[i * n + j] = T::zero();
            }
        }
        if converged {
            break;
        }
    }

    for i in 0..n {
        w[i] = A[i * n + i];
    }
}
