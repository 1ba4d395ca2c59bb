#![allow(non_snake_case)]
use num_traits::{Float, FloatConst, FromPrimitive, NumAssign};
use std::fmt::{Debug, Display, LowerExp};

#[cfg(feature = "sdp")]
use crate::algebra::dense::LapackFloatT;

/// Core bounds for floating point types used by the algebra layer.
///
/// `FloatT` relies on [`num_traits`](num_traits) for most of its constituent trait bounds.
pub trait CoreFloatT:
    'static
    + Send
    + Sync
    + Float
    + FloatConst
    + NumAssign
    + Default
    + FromPrimitive
    + Display
    + LowerExp
    + Debug
    + Sized
{
}

impl<T> CoreFloatT for T where
    T: 'static
        + Send
        + Sync
        + Float
        + FloatConst
        + NumAssign
        + Default
        + FromPrimitive
        + Display
        + LowerExp
        + Debug
        + Sized
{
}

// with "sdp" enabled the eigendecompositions go through LAPACK,
// which restricts FloatT to f32 and f64

cfg_if::cfg_if! {
    if #[cfg(feature = "sdp")] {
        /// Main trait for floating point types used by the algebra layer.
        ///
        /// The solver core and the marshaling layer work in `f64` throughout, but
        /// the sparse and dense kernels are written against `FloatT` so that they
        /// can be exercised on `f32` data as well.
        pub trait FloatT: CoreFloatT + LapackFloatT {}
        impl<T> FloatT for T where T: CoreFloatT + LapackFloatT {}
    } else {
        /// Main trait for floating point types used by the algebra layer.
        ///
        /// The solver core and the marshaling layer work in `f64` throughout, but
        /// the sparse and dense kernels are written against `FloatT` so that they
        /// can be exercised on `f32` data as well.
        pub trait FloatT: CoreFloatT {}
        impl<T> FloatT for T where T: CoreFloatT {}
    }
}

/// Trait for converting Rust primitives to [`FloatT`](crate::algebra::FloatT)
///
/// Used internally on numeric constants, e.g. `(0.5).as_T()`, and by the
/// settings builder for converting defaults of primitive type.

// NB: `AsFloatT` exists so that we can write (2.0).as_T() on
// constants, rather than T::from_f64(2.0).unwrap() everywhere
pub trait AsFloatT<T>: 'static {
    fn as_T(&self) -> T;
}

macro_rules! impl_as_FloatT {
    ($ty:ty, $ident:ident) => {
        impl<T> AsFloatT<T> for $ty
        where
            T: std::ops::Mul<T, Output = T> + FromPrimitive + 'static,
        {
            #[inline]
            fn as_T(&self) -> T {
                T::$ident(*self).unwrap()
            }
        }
    };
}
impl_as_FloatT!(u32, from_u32);
impl_as_FloatT!(u64, from_u64);
impl_as_FloatT!(usize, from_usize);
impl_as_FloatT!(f32, from_f32);
impl_as_FloatT!(f64, from_f64);
