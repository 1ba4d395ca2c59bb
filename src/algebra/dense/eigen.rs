#![allow(non_snake_case)]

use crate::algebra::{DenseFactorizationError, FloatT};

/// Symmetric eigendecomposition engine for matrices of a fixed size.
///
/// Workspace is allocated once at construction and reused across calls.
pub struct EigEngine<T> {
    /// computed eigenvalues, ascending when computed by LAPACK
    pub λ: Vec<T>,
    /// eigenvectors, stored as the columns of an `n x n` column major matrix
    pub V: Vec<T>,
    #[cfg_attr(not(feature = "sdp"), allow(dead_code))]
    pub(crate) work: EigWork<T>,
}

#[cfg_attr(not(feature = "sdp"), allow(dead_code))]
pub(crate) struct EigWork<T> {
    pub(crate) isuppz: Vec<i32>,
    pub(crate) work: Vec<T>,
    pub(crate) iwork: Vec<i32>,
}

impl<T> EigEngine<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            λ: vec![T::zero(); n],
            V: vec![T::zero(); n * n],
            // the first entries receive the optimal work sizes
            work: EigWork {
                isuppz: vec![0; 2 * n],
                work: vec![T::one()],
                iwork: vec![1],
            },
        }
    }

    pub fn n(&self) -> usize {
        self.λ.len()
    }

    /// Compute eigenvalues and eigenvectors of the symmetric `n x n`
    /// column major matrix `A`.  Only the upper triangle is referenced
    /// and `A` is overwritten.
    pub fn eigen(&mut self, A: &mut [T]) -> Result<(), DenseFactorizationError> {
        let n = self.n();
        if A.len() != n * n {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        if n == 0 {
            return Ok(());
        }
        cfg_if::cfg_if! {
            if #[cfg(feature = "sdp")] {
                self.syevr(A)
            } else {
                super::jacobi::jacobi_eigen(A, n, &mut self.λ, &mut self.V);
                Ok(())
            }
        }
    }
}
