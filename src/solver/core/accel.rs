#![allow(non_snake_case)]

use crate::algebra::dense::solve_in_place;
use crate::algebra::*;

const AA_REGULARIZATION_TYPE_2: f64 = 1e-10;
const AA_REGULARIZATION_TYPE_1: f64 = 1e-8;
const AA_MAX_WEIGHT_NORM: f64 = 1e10;

/// Anderson acceleration of a fixed point iteration `z ← F(z)`.
///
/// Keeps up to `mem` difference columns of the iterates `z`, the map
/// outputs `g = F(z)` and the residuals `f = g - z`.  Type-II chooses the
/// weights minimizing the extrapolated residual.  Type-I solves the
/// projected secant equations instead.
#[derive(Debug)]
pub(crate) struct AndersonAccel {
    dim: usize,
    mem: usize,
    type_one: bool,

    // difference columns, column major, ring buffered
    dZ: Vec<f64>,
    dF: Vec<f64>,
    dG: Vec<f64>,
    cols: usize,
    next_col: usize,

    prev_z: Vec<f64>,
    prev_f: Vec<f64>,
    prev_g: Vec<f64>,
    have_prev: bool,

    // small dense workspace
    M: Vec<f64>,
    γ: Vec<f64>,
    f: Vec<f64>,
}

impl AndersonAccel {
    /// `lookback > 0` selects type-II, `lookback < 0` type-I.  Returns
    /// `None` when acceleration is disabled.
    pub(crate) fn new(dim: usize, lookback: i32) -> Option<Self> {
        if lookback == 0 || dim == 0 {
            return None;
        }
        let mem = lookback.unsigned_abs() as usize;
        Some(Self {
            dim,
            mem,
            type_one: lookback < 0,
            dZ: vec![0.0; dim * mem],
            dF: vec![0.0; dim * mem],
            dG: vec![0.0; dim * mem],
            cols: 0,
            next_col: 0,
            prev_z: vec![0.0; dim],
            prev_f: vec![0.0; dim],
            prev_g: vec![0.0; dim],
            have_prev: false,
            M: vec![0.0; mem * mem],
            γ: vec![0.0; mem],
            f: vec![0.0; dim],
        })
    }

    /// forget all stored history
    pub(crate) fn reset(&mut self) {
        self.cols = 0;
        self.next_col = 0;
        self.have_prev = false;
    }

    fn col(v: &[f64], dim: usize, j: usize) -> &[f64] {
        &v[j * dim..(j + 1) * dim]
    }

    /// Record the pair `(z, g = F(z))` and overwrite `g` with the
    /// extrapolated point.  Returns `false`, leaving `g` untouched, when
    /// no extrapolation was possible.
    pub(crate) fn apply(&mut self, z: &[f64], g: &mut [f64]) -> bool {
        let dim = self.dim;
        assert_eq!(z.len(), dim);
        assert_eq!(g.len(), dim);

        self.f.waxpby(1.0, g, -1.0, z);

        if self.have_prev {
            let j = self.next_col;
            let rng = j * dim..(j + 1) * dim;
            self.dZ[rng.clone()].waxpby(1.0, z, -1.0, &self.prev_z);
            self.dF[rng.clone()].waxpby(1.0, &self.f, -1.0, &self.prev_f);
            self.dG[rng].waxpby(1.0, g, -1.0, &self.prev_g);
            self.next_col = (j + 1) % self.mem;
            self.cols = (self.cols + 1).min(self.mem);
        }
        self.prev_z.copy_from(z);
        self.prev_f.copy_from(&self.f);
        self.prev_g.copy_from(g);
        self.have_prev = true;

        let k = self.cols;
        if k == 0 {
            return false;
        }

        // normal equations for the weights
        let M = &mut self.M[..k * k];
        let γ = &mut self.γ[..k];
        let lhs_basis = if self.type_one { &self.dZ } else { &self.dF };
        for i in 0..k {
            let bi = Self::col(lhs_basis, dim, i);
            γ[i] = bi.dot(&self.f);
            for j in 0..k {
                M[j * k + i] = bi.dot(Self::col(&self.dF, dim, j));
            }
        }
        let reg = if self.type_one {
            AA_REGULARIZATION_TYPE_1
        } else {
            AA_REGULARIZATION_TYPE_2
        } * M.norm();
        for i in 0..k {
            M[i * k + i] += reg;
        }

        if solve_in_place(M, k, γ).is_err() || !γ.is_finite() || γ.norm() > AA_MAX_WEIGHT_NORM {
            self.reset();
            return false;
        }

        // g ← g - ΔG γ
        for (j, &γj) in γ.iter().enumerate() {
            g.axpby(-γj, Self::col(&self.dG, dim, j), 1.0);
        }
        if !g.is_finite() {
            g.copy_from(&self.prev_g);
            self.reset();
            return false;
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // F(z) = B z + c with a contraction B
    fn affine_map(z: &[f64]) -> Vec<f64> {
        vec![
            0.9 * z[0] + 0.05 * z[1] + 1.0,
            -0.05 * z[0] + 0.8 * z[1] - 1.0,
        ]
    }

    fn run(lookback: i32, iters: usize) -> f64 {
        let mut aa = AndersonAccel::new(2, lookback);
        let mut z = vec![0.0, 0.0];
        for _ in 0..iters {
            let mut g = affine_map(&z);
            if let Some(aa) = aa.as_mut() {
                aa.apply(&z, &mut g);
            }
            z = g;
        }
        let fz = affine_map(&z);
        fz.norm_inf_diff(&z)
    }

    #[test]
    fn test_anderson_accelerates_affine_map() {
        let plain = run(0, 8);
        let type2 = run(5, 8);
        let type1 = run(-5, 8);
        assert!(type2 < 1e-8);
        assert!(type1 < 1e-6);
        assert!(plain > 1e-2);
    }

    #[test]
    fn test_anderson_disabled() {
        assert!(AndersonAccel::new(4, 0).is_none());
        let mut aa = AndersonAccel::new(2, 3).unwrap();
        let mut g = vec![1.0, 1.0];
        // no history on the first call
        assert!(!aa.apply(&[0.0, 0.0], &mut g));
        assert_eq!(g, vec![1.0, 1.0]);
    }
}
