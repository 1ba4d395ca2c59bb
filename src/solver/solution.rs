use super::Info;
use crate::marshal::{try_zeros, Diagnostic, InterfaceError};

/// Primal, dual and slack vectors of a solve.
///
/// On an infeasibility or unboundedness result the vectors hold the
/// certificate, with the unused ones filled with NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// primal variables, length `n`
    pub x: Vec<f64>,
    /// dual variables, in the dual cone, length `m`
    pub y: Vec<f64>,
    /// slacks, in the primal cone, length `m`
    pub s: Vec<f64>,
}

impl Solution {
    /// Zero-filled solution buffers for `n` variables and `m` constraints.
    pub fn try_zeros(n: usize, m: usize) -> Result<Self, InterfaceError> {
        Ok(Self {
            x: try_zeros(n)?,
            y: try_zeros(m)?,
            s: try_zeros(m)?,
        })
    }
}

/// Everything a solve hands back to the caller.
#[derive(Debug, Clone)]
pub struct SolveOutput {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub s: Vec<f64>,
    pub info: Info,
    /// non-fatal conditions met while marshaling or solving
    pub diagnostics: Vec<Diagnostic>,
}

impl SolveOutput {
    pub(crate) fn new(sol: Solution, info: Info, diagnostics: Vec<Diagnostic>) -> Self {
        let Solution { x, y, s } = sol;
        Self {
            x,
            y,
            s,
            info,
            diagnostics,
        }
    }
}
