//! The linear system backend protocol.
//!
//! At every iteration the solver core solves the quasi-definite system
//!
//! ```text
//! [ P + rho_x I      Aᵀ      ] [x]   [r_x]
//! [      A       -(1/scale) I ] [y] = [r_y]
//! ```
//!
//! and applies `A` and `Aᵀ` when forming residuals.  Both are delegated to
//! a [`LinearSystemBackend`].  The crate ships a sparse direct backend, a
//! conjugate gradient backend and a [`CallbackBackend`] that adapts boxed
//! closures supplied by a host environment.

#![allow(non_snake_case)]

use crate::algebra::CscMatrix;
use thiserror::Error;

mod callback;
mod direct;
mod equilibrate;
mod indirect;
mod kkt_assembly;
mod lock;
mod port;
mod timer;

pub use callback::*;
pub use direct::*;
pub use equilibrate::*;
pub use indirect::*;
pub use lock::*;
pub use port::*;
pub use timer::*;

/// Error type returned by linear system backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend returned a vector of the wrong length
    #[error("backend operation '{op}' returned a vector of length {found}, expected {expected}")]
    Contract {
        op: &'static str,
        expected: usize,
        found: usize,
    },
    /// The backend reported a failure
    #[error("backend operation '{op}' failed: {message}")]
    Failed { op: &'static str, message: String },
}

impl BackendError {
    pub(crate) fn failed(op: &'static str, message: impl Into<String>) -> Self {
        BackendError::Failed {
            op,
            message: message.into(),
        }
    }
}

/// How the core must call into a backend.
///
/// `NativeSafe` backends run with the host scheduler lock released.
/// `Reentrant` backends call back into the host, so the lock is held for
/// the duration of every backend call and released again afterwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    #[default]
    NativeSafe,
    Reentrant,
}

/// Data passed to a backend at initialization.
#[derive(Debug, Clone, Copy)]
pub struct LinSysData<'a> {
    /// constraint matrix, `m x n`
    pub A: &'a CscMatrix<f64>,
    /// quadratic cost, upper triangle, `n x n`.  `None` for linear costs.
    pub P: Option<&'a CscMatrix<f64>>,
    /// primal regularization
    pub rho_x: f64,
    /// initial dual scale
    pub scale: f64,
}

/// Diagonal scalings produced by [`LinearSystemBackend::normalize`].
///
/// The normalized data is `E A D` and `D P D`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Normalization {
    /// column scaling, length `n`
    pub d: Vec<f64>,
    /// row scaling, length `m`
    pub e: Vec<f64>,
    /// mean row infinity norm of the normalized `A`
    pub mean_row_norm: f64,
    /// mean column infinity norm of the normalized `A`
    pub mean_col_norm: f64,
}

/// A linear system engine for the solver core.
///
/// A backend owns its copy of the problem matrices.  Every vector passed
/// across the trait is a flat dense slice of known length, and no
/// reference may be retained after a call returns.
pub trait LinearSystemBackend: Send {
    /// Calling convention, fixed for the lifetime of the backend.
    fn call_mode(&self) -> CallMode {
        CallMode::NativeSafe
    }

    /// short name reported in verbose output
    fn method(&self) -> String;

    /// One time setup.  Called once per workspace.
    fn init(&mut self, data: &LinSysData<'_>) -> Result<(), BackendError>;

    /// Solve the system in place.  `rhs` has length `n + m`.  `warm` is an
    /// optional initial guess of the same length, and `iter` is the
    /// current iteration index.
    fn solve(
        &mut self,
        rhs: &mut [f64],
        warm: Option<&[f64]>,
        iter: usize,
    ) -> Result<(), BackendError>;

    /// `y = A x`
    fn apply_a(&mut self, x: &[f64], y: &mut [f64]) -> Result<(), BackendError>;

    /// `x = Aᵀ y`
    fn apply_at(&mut self, y: &[f64], x: &mut [f64]) -> Result<(), BackendError>;

    /// Rescale the stored data.  `boundaries` holds consecutive cone block
    /// lengths, the first being the separable prefix.  Rows within each
    /// later block must share a single scaling.  Returns `None` if the
    /// backend does not rescale.
    fn normalize(
        &mut self,
        _boundaries: &[usize],
        _scale: f64,
    ) -> Result<Option<Normalization>, BackendError> {
        Ok(None)
    }

    /// Undo a previous [`normalize`](LinearSystemBackend::normalize).
    fn un_normalize(&mut self, _norm: &Normalization, _scale: f64) -> Result<(), BackendError> {
        Ok(())
    }

    /// Change the dual scale.  Returns `false` if the backend keeps a fixed
    /// scale.
    fn update_scale(&mut self, _scale: f64) -> Result<bool, BackendError> {
        Ok(false)
    }
}
