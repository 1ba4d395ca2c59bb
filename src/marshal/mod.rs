//! Marshaling of caller data into solver owned structures.
//!
//! Problem data, cone descriptions, settings and warm starts arrive as
//! dynamically typed [`Value`]s.  The functions in this module check
//! their shapes and element kinds and produce typed views.  A view
//! aliases the caller's memory when the layout already matches and holds
//! a converted copy otherwise; [`Buffer::ownership`] tells which.
//!
//! All failures are reported as an [`InterfaceError`] before any solver
//! work starts.  Non-fatal conditions are collected as [`Diagnostic`]s.

mod buffer;
mod cones;
mod errors;
mod matrix;
mod problem;
mod result;
mod settings;
mod value;
mod warmstart;

pub use buffer::*;
pub use cones::*;
pub use errors::*;
pub use matrix::*;
pub use problem::*;
pub use result::*;
pub use settings::*;
pub use value::*;
pub use warmstart::*;

pub(crate) use errors::{try_copy, try_zeros};
