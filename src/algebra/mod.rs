//! Sparse and dense linear algebra used by the solver core and the
//! built-in linear system backends.
//!
//! Vector operations are provided on slices via the [`VectorMath`]
//! trait.  Sparse matrices are stored in [`CscMatrix`] format, with
//! transposed and symmetric views available through
//! [`CscMatrix::t`] and [`CscMatrix::sym`].

mod csc;
pub mod dense;
mod error_types;
mod floats;
mod math_traits;
mod vecmath;

pub use csc::*;
pub use error_types::*;
pub use floats::*;
pub use math_traits::*;
