#![allow(non_snake_case)]

use crate::algebra::*;
use crate::marshal::ConeSpec;

/// Solver owned copy of a validated problem
///
/// `min ½xᵀPx + cᵀx  s.t.  Ax + s = b, s ∈ K`
#[derive(Debug, Clone)]
pub struct ProblemData {
    /// quadratic cost, upper triangle, `n x n`
    pub P: CscMatrix<f64>,
    /// constraint matrix, `m x n`
    pub A: CscMatrix<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub cones: ConeSpec<'static>,
}

impl ProblemData {
    /// number of constraints
    pub fn m(&self) -> usize {
        self.A.m
    }

    /// number of variables
    pub fn n(&self) -> usize {
        self.A.n
    }

    /// `P` if it has any entries
    pub fn P_if_nonempty(&self) -> Option<&CscMatrix<f64>> {
        (self.P.nnz() > 0).then_some(&self.P)
    }
}
