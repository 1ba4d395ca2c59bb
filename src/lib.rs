//! __splitcone__ is the problem marshaling layer of an operator splitting
//! solver for convex conic programs
//!
//! ```text
//! minimize    ½xᵀPx + cᵀx
//! subject to  Ax + s = b
//!             s ∈ K
//! ```
//!
//! with decision variables `x ∈ ℝⁿ`, `s ∈ ℝᵐ`, a positive semidefinite
//! `P` and a cone `K` built from zero, nonnegative, box, second-order,
//! semidefinite, exponential and power cones.
//!
//! The crate turns dynamically typed caller data ([`marshal::Value`]) into
//! validated solver structures, runs the solver core through a pluggable
//! [`LinearSystemBackend`](solver::LinearSystemBackend), and hands the
//! results back as caller owned values.
//!
//! Problems can be solved once with [`solver::solve`] or repeatedly through
//! a persistent [`solver::Workspace`], which keeps the parsed problem and
//! the initialized backend alive between calls and allows `b` and `c` to
//! be replaced in place.
//!
//! # Python interface
//!
//! Building with the `python` feature produces a Python extension module
//! with the same functionality.
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates greek characters
#![allow(confusable_idents)]

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod algebra;
pub mod io;
pub mod marshal;
pub mod qdldl;
pub mod solver;
pub mod timers;

#[cfg(feature = "python")]
pub mod python;

/// Version of the crate.
pub fn version() -> &'static str {
    VERSION
}

/// Width in bytes of the integer type used for sparse indices.
pub fn sizeof_int() -> usize {
    std::mem::size_of::<usize>()
}

/// Width in bytes of the floating point type used for problem data.
pub fn sizeof_float() -> usize {
    std::mem::size_of::<f64>()
}

#[test]
fn test_introspection() {
    assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    assert_eq!(sizeof_int(), std::mem::size_of::<usize>());
    assert_eq!(sizeof_float(), 8);
}
