#![allow(non_snake_case)]
#![allow(clippy::too_many_arguments)]

// link whichever LAPACK implementation the sdp-* feature selected
extern crate lapack_src;

use super::EigEngine;
use crate::algebra::{DenseFactorizationError, FloatT};

/// Floating point types with LAPACK support.  Added to the bounds of
/// [`FloatT`] when the "sdp" feature is enabled.
pub trait LapackFloatT: private::Sealed + XsyevrScalar {}
impl LapackFloatT for f32 {}
impl LapackFloatT for f64 {}

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

// --------------------------------------
// ?syevr : symmetric eigen decomposition
// --------------------------------------

pub trait XsyevrScalar: Sized {
    #[rustfmt::skip]
    fn xsyevr(
        jobz: u8, range: u8, uplo: u8, n: i32, a: &mut [Self], lda: i32, vl: Self, vu: Self,
        il: i32, iu: i32, abstol: Self, m: &mut i32, w: &mut [Self], z: &mut [Self], ldz: i32,
        isuppz: &mut [i32], work: &mut [Self], lwork: i32, iwork: &mut [i32], liwork: i32,
        info: &mut i32,
    );
}

macro_rules! impl_lapack_xsyevr {
    ($T:ty, $XSYEVR:path) => {
        impl XsyevrScalar for $T {
            #[rustfmt::skip]
            fn xsyevr(
                jobz: u8, range: u8, uplo: u8, n: i32, a: &mut [Self], lda: i32, vl: Self, vu: Self,
                il: i32, iu: i32, abstol: Self, m: &mut i32, w: &mut [Self], z: &mut [Self], ldz: i32,
                isuppz: &mut [i32], work: &mut [Self], lwork: i32, iwork: &mut [i32], liwork: i32,
                info: &mut i32,
            ) {
                unsafe {
                    $XSYEVR(
                        jobz, range, uplo, n, a, lda, vl, vu, il, iu, abstol, m, w, z, ldz,
                        isuppz, work, lwork, iwork, liwork, info,
                    );
                }
            }
        }
    };
}
impl_lapack_xsyevr!(f32, lapack::ssyevr);
impl_lapack_xsyevr!(f64, lapack::dsyevr);

impl<T> EigEngine<T>
where
    T: FloatT,
{
    pub(crate) fn syevr(&mut self, A: &mut [T]) -> Result<(), DenseFactorizationError> {
        let n: i32 = self
            .n()
            .try_into()
            .map_err(|_| DenseFactorizationError::IncompatibleDimension)?;

        let jobz = b'V'; // values and vectors
        let range = b'A'; // all eigenvalues
        let uplo = b'U'; // upper triangle is referenced
        let (vl, vu) = (T::zero(), T::zero()); // unused for range = A
        let (il, iu) = (0_i32, 0_i32); // unused for range = A
        let abstol = -T::one(); // default tolerance
        let mut m = 0_i32;
        let mut info = 0_i32;
        let mut lwork = -1_i32; // workspace query on the first pass
        let mut liwork = -1_i32;

        let w = &mut self.work;
        for pass in 0..2 {
            T::xsyevr(
                jobz, range, uplo, n, A, n, vl, vu, il, iu, abstol, &mut m, &mut self.λ,
                &mut self.V, n, &mut w.isuppz, &mut w.work, lwork, &mut w.iwork, liwork,
                &mut info,
            );
            if info != 0 {
                return Err(DenseFactorizationError::Eigen(info));
            }
            if pass == 0 {
                lwork = w.work[0]
                    .to_i32()
                    .ok_or(DenseFactorizationError::IncompatibleDimension)?;
                liwork = w.iwork[0];
                w.work.resize(lwork as usize, T::zero());
                w.iwork.resize(liwork as usize, 0);
            }
        }
        Ok(())
    }
}
