//! Solver module.
//!
//! This module contains the solver settings, status and info types, the
//! solver core with its linear system backends, and the persistent
//! [`Workspace`] together with the one-shot [`solve`] function.
//!
//! The solver core is an operator splitting method for problems of the
//! form
//!
//! ```text
//! minimize    ½xᵀPx + cᵀx
//! subject to  Ax + s = b,  s ∈ K
//! ```
//!
//! where `K` is a product of zero, nonnegative, box, second-order,
//! semidefinite, exponential and power cones.

// internal module structure
pub(crate) mod core;
pub(crate) mod csvlog;
mod data;
mod info;
pub(crate) mod info_print;
#[cfg(feature = "serde")]
mod json;
mod settings;
mod solution;
mod status;
mod workspace;

pub use data::*;
pub use info::*;
#[cfg(feature = "serde")]
pub use json::*;
pub use settings::*;
pub use solution::*;
pub use status::*;
pub use workspace::*;

//the backend protocol and the built-in backends are user facing,
//so that a host can supply its own linear system solver
pub use crate::solver::core::linsys::*;
pub use crate::solver::core::cones::ConeSet;
