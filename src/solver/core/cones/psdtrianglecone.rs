use super::Cone;
use crate::algebra::dense::EigEngine;
use crate::algebra::*;

// ------------------------------------
// Positive Semidefinite Cone (Scaled triangular form)
// ------------------------------------

/// Semidefinite cone of `n x n` matrices, stored as the lower triangle in
/// column major order with off-diagonal entries scaled by √2.  With that
/// scaling the Euclidean inner product of two stored vectors equals the
/// trace inner product of the matrices.
pub struct PsdTriangleCone<T: FloatT = f64> {
    n: usize,
    numel: usize,
    // boxed so that the enum_dispatch variant stays small
    work: Box<PsdWork<T>>,
}

struct PsdWork<T> {
    X: Vec<T>,
    eig: EigEngine<T>,
}

impl<T> PsdTriangleCone<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            n,
            numel: n * (n + 1) / 2,
            work: Box::new(PsdWork {
                X: vec![T::zero(); n * n],
                eig: EigEngine::new(n),
            }),
        }
    }
}

// svec / smat conversions

pub(crate) fn svec_to_mat<T: FloatT>(M: &mut [T], x: &[T], n: usize) {
    let isqrt2 = T::FRAC_1_SQRT_2();
    let mut k = 0;
    for col in 0..n {
        for row in col..n {
            let v = if row == col { x[k] } else { x[k] * isqrt2 };
            M[col * n + row] = v;
            M[row * n + col] = v;
            k += 1;
        }
    }
}

pub(crate) fn mat_to_svec<T: FloatT>(x: &mut [T], M: &[T], n: usize) {
    let sqrt2 = T::SQRT_2();
    let half: T = (0.5).as_T();
    let mut k = 0;
    for col in 0..n {
        for row in col..n {
            // symmetrize against rounding in the reconstruction
            let v = (M[col * n + row] + M[row * n + col]) * half;
            x[k] = if row == col { v } else { v * sqrt2 };
            k += 1;
        }
    }
}

impl<T> Cone<T> for PsdTriangleCone<T>
where
    T: FloatT,
{
    fn numel(&self) -> usize {
        self.numel
    }

    fn is_separable(&self) -> bool {
        false
    }

    fn project(&mut self, x: &mut [T]) {
        let n = self.n;
        if n == 0 {
            return;
        }
        if n == 1 {
            x[0] = T::max(x[0], T::zero());
            return;
        }

        let PsdWork { X, eig } = &mut *self.work;
        svec_to_mat(X, x, n);
        if eig.eigen(X).is_err() {
            // leave x unprojected; the residuals will reflect it
            log::warn!("PSD cone projection failed for a {n} x {n} block");
            return;
        }
        let (w, V) = (&eig.λ, &eig.V);

        // X = V * max(Λ,0) * V'
        X.fill(T::zero());
        for (k, &λ) in w.iter().enumerate() {
            if λ <= T::zero() {
                continue;
            }
            let vk = &V[k * n..(k + 1) * n];
            for col in 0..n {
                let a = λ * vk[col];
                for row in col..n {
                    X[col * n + row] += a * vk[row];
                }
            }
        }
        // only the lower triangle was accumulated
        for col in 0..n {
            for row in (col + 1)..n {
                X[row * n + col] = X[col * n + row];
            }
        }
        mat_to_svec(x, X, n);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_psd_projection() {
        // [1 2; 2 1] has eigenvalues 3 and -1, eigenvectors (1,1)/√2 and (1,-1)/√2.
        // Projection is 3/2 [1 1; 1 1]
        let s2 = f64::sqrt(2.);
        let mut x = vec![1., 2. * s2, 1.];
        let mut K = PsdTriangleCone::<f64>::new(2);
        K.project(&mut x);
        assert!((x[0] - 1.5).abs() < 1e-10);
        assert!((x[1] - 1.5 * s2).abs() < 1e-10);
        assert!((x[2] - 1.5).abs() < 1e-10);

        // projection is idempotent
        let y = x.clone();
        K.project(&mut x);
        assert!(x.norm_inf_diff(&y) < 1e-10);
    }

    #[test]
    fn test_svec_roundtrip_inner_product() {
        let n = 3;
        let x: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let mut M = vec![0.; 9];
        svec_to_mat(&mut M, &x, n);
        // trace inner product of M with itself matches the svec dot product
        let tr: f64 = M.iter().map(|v| v * v).sum();
        assert!((tr - x.dot(&x)).abs() < 1e-12);
    }
}
