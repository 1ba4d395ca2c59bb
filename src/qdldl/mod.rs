//! Sparse LDLᵀ factorization of symmetric quasi-definite matrices.
//!
//! The factorization reads only the upper triangle of its input, applies
//! an approximate minimum degree ordering from the [`amd`] crate unless a
//! permutation is supplied, and optionally regularizes pivots towards a
//! prescribed sign pattern.  Numeric values can be replaced after the
//! symbolic phase and the matrix refactored in place.
//!
//! __Example usage__ : To factor and solve with the 2 x 2 matrix
//! ```text
//! K = [ 2.  1.]
//!     [ 1. -1.]
//! ```
//!
//! ```no_run
//! use splitcone::algebra::CscMatrix;
//! use splitcone::qdldl::*;
//!
//! let K = CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![2., 1., -1.]);
//! let opts = LdlSettingsBuilder::default()
//!     .Dsigns(vec![1, -1])
//!     .build()
//!     .unwrap();
//! let mut ldl = LdlFactorization::new(&K, Some(opts)).unwrap();
//! let mut b = vec![3., 0.];
//! ldl.solve(&mut b);
//! ```

#[allow(clippy::module_inception)]
mod qdldl;
pub use qdldl::*;
