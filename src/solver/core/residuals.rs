#![allow(non_snake_case)]

use crate::algebra::*;
use std::mem::swap;

/// Iterate and residual data in the original, unscaled problem space.
///
/// The current values and those of the previous check are both kept,
/// since the infeasibility tests work on iterate differences.
#[derive(Debug)]
pub(crate) struct Residuals {
    pub x: Vec<f64>,
    pub s: Vec<f64>,
    pub y: Vec<f64>,
    pub Ax: Vec<f64>,
    pub ATy: Vec<f64>,
    pub Px: Vec<f64>,

    prev_x: Vec<f64>,
    prev_s: Vec<f64>,
    prev_y: Vec<f64>,
    prev_Ax: Vec<f64>,
    prev_ATy: Vec<f64>,
    prev_Px: Vec<f64>,
    have_prev: bool,

    // work vectors
    rn: Vec<f64>,
    rm: Vec<f64>,

    pub res_pri: f64,
    pub res_dual: f64,
    pub gap: f64,
    pub pobj: f64,
    pub dobj: f64,
    pub comp_slack: f64,
    pri_scale: f64,
    dual_scale: f64,
    gap_scale: f64,
}

/// Infeasibility certificate candidate
#[derive(Debug, Clone, Copy)]
pub(crate) enum Certificate {
    /// `y ← δy / (-bᵀδy)`, with the normalized `‖Aᵀy‖∞`
    PrimalInfeasible { denom: f64, res_infeas: f64 },
    /// `(x, s) ← (δx, δs) / (-cᵀδx)`, with normalized `‖Ax + s‖∞` and `‖Px‖∞`
    DualInfeasible {
        denom: f64,
        res_unbdd_a: f64,
        res_unbdd_p: f64,
    },
}

impl Residuals {
    pub(crate) fn new(n: usize, m: usize) -> Self {
        Self {
            x: vec![0.0; n],
            s: vec![0.0; m],
            y: vec![0.0; m],
            Ax: vec![0.0; m],
            ATy: vec![0.0; n],
            Px: vec![0.0; n],
            prev_x: vec![0.0; n],
            prev_s: vec![0.0; m],
            prev_y: vec![0.0; m],
            prev_Ax: vec![0.0; m],
            prev_ATy: vec![0.0; n],
            prev_Px: vec![0.0; n],
            have_prev: false,
            rn: vec![0.0; n],
            rm: vec![0.0; m],
            res_pri: f64::NAN,
            res_dual: f64::NAN,
            gap: f64::NAN,
            pobj: f64::NAN,
            dobj: f64::NAN,
            comp_slack: f64::NAN,
            pri_scale: 0.0,
            dual_scale: 0.0,
            gap_scale: 0.0,
        }
    }

    /// forget the previous iterate, e.g. at the start of a solve
    pub(crate) fn reset(&mut self) {
        self.have_prev = false;
    }

    /// Move the current values into the previous slot.  The current
    /// vectors must be completely overwritten before the next update.
    pub(crate) fn rotate(&mut self) {
        swap(&mut self.x, &mut self.prev_x);
        swap(&mut self.s, &mut self.prev_s);
        swap(&mut self.y, &mut self.prev_y);
        swap(&mut self.Ax, &mut self.prev_Ax);
        swap(&mut self.ATy, &mut self.prev_ATy);
        swap(&mut self.Px, &mut self.prev_Px);
        self.have_prev = true;
    }

    /// Evaluate residuals and objectives from the current vectors.
    pub(crate) fn update(&mut self, b: &[f64], c: &[f64]) {
        // r_pri = Ax + s - b
        self.rm.waxpby(1.0, &self.Ax, 1.0, &self.s);
        self.rm.axpby(-1.0, b, 1.0);
        self.res_pri = self.rm.norm_inf();
        self.pri_scale = self.Ax.norm_inf().max(self.s.norm_inf()).max(b.norm_inf());

        // r_dual = Px + Aᵀy + c
        self.rn.waxpby(1.0, &self.Px, 1.0, &self.ATy);
        self.rn.axpby(1.0, c, 1.0);
        self.res_dual = self.rn.norm_inf();
        self.dual_scale = self.Px.norm_inf().max(self.ATy.norm_inf()).max(c.norm_inf());

        let xPx = self.x.dot(&self.Px);
        let cx = c.dot(&self.x);
        let by = b.dot(&self.y);
        self.gap = (xPx + cx + by).abs();
        self.gap_scale = xPx.abs().max(cx.abs()).max(by.abs());
        self.pobj = 0.5 * xPx + cx;
        self.dobj = -0.5 * xPx - by;
        self.comp_slack = self.s.dot(&self.y).abs();
    }

    /// normalizer of the primal residual, `max(‖Ax‖∞, ‖s‖∞, ‖b‖∞)`
    pub(crate) fn pri_scale(&self) -> f64 {
        self.pri_scale
    }

    /// normalizer of the dual residual, `max(‖Px‖∞, ‖Aᵀy‖∞, ‖c‖∞)`
    pub(crate) fn dual_scale(&self) -> f64 {
        self.dual_scale
    }

    pub(crate) fn is_solved(&self, eps_abs: f64, eps_rel: f64) -> bool {
        self.res_pri <= eps_abs + eps_rel * self.pri_scale
            && self.res_dual <= eps_abs + eps_rel * self.dual_scale
            && self.gap <= eps_abs + eps_rel * self.gap_scale
    }

    /// Test the iterate differences for an infeasibility certificate.
    pub(crate) fn certificate(&mut self, b: &[f64], c: &[f64], eps_infeas: f64) -> Option<Certificate> {
        if !self.have_prev {
            return None;
        }

        // primal: ‖Aᵀδy‖∞ < eps (-bᵀδy)
        self.rm.waxpby(1.0, &self.y, -1.0, &self.prev_y);
        let denom = -b.dot(&self.rm);
        if denom > 0.0 && denom.is_finite() {
            let res = self.ATy.norm_inf_diff(&self.prev_ATy);
            if res < eps_infeas * denom {
                return Some(Certificate::PrimalInfeasible {
                    denom,
                    res_infeas: res / denom,
                });
            }
        }

        // dual: max(‖Pδx‖∞, ‖Aδx + δs‖∞) < eps (-cᵀδx)
        self.rn.waxpby(1.0, &self.x, -1.0, &self.prev_x);
        let denom = -c.dot(&self.rn);
        if denom > 0.0 && denom.is_finite() {
            let res_p = self.Px.norm_inf_diff(&self.prev_Px);
            // Aδx + δs
            self.rm.waxpby(1.0, &self.Ax, -1.0, &self.prev_Ax);
            self.rm.axpby(1.0, &self.s, 1.0);
            self.rm.axpby(-1.0, &self.prev_s, 1.0);
            let res_a = self.rm.norm_inf();
            if res_p.max(res_a) < eps_infeas * denom {
                return Some(Certificate::DualInfeasible {
                    denom,
                    res_unbdd_a: res_a / denom,
                    res_unbdd_p: res_p / denom,
                });
            }
        }
        None
    }

    /// Write the certificate vectors into `x`, `y`, `s`.
    pub(crate) fn write_certificate(&self, cert: Certificate, x: &mut [f64], y: &mut [f64], s: &mut [f64]) {
        match cert {
            Certificate::PrimalInfeasible { denom, .. } => {
                y.waxpby(1.0 / denom, &self.y, -1.0 / denom, &self.prev_y);
                x.fill(f64::NAN);
                s.fill(f64::NAN);
            }
            Certificate::DualInfeasible { denom, .. } => {
                x.waxpby(1.0 / denom, &self.x, -1.0 / denom, &self.prev_x);
                s.waxpby(1.0 / denom, &self.s, -1.0 / denom, &self.prev_s);
                y.fill(f64::NAN);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_residuals_and_certificate() {
        // one variable, one constraint: x + s = 1
        let (b, c) = (vec![1.0], vec![1.0]);
        let mut r = Residuals::new(1, 1);
        r.x[0] = 1.0;
        r.Ax[0] = 1.0;
        r.s[0] = 0.0;
        r.y[0] = -1.0;
        r.ATy[0] = -1.0;
        r.update(&b, &c);
        assert_eq!(r.res_pri, 0.0);
        assert_eq!(r.res_dual, 0.0);
        assert_eq!(r.gap, 0.0);
        assert!(r.is_solved(1e-8, 1e-8));
        assert!(r.certificate(&b, &c, 1e-7).is_none());

        // y moving along a direction with bᵀδy < 0 and Aᵀδy = 0 is
        // a primal infeasibility certificate when A = 0
        r.rotate();
        r.x[0] = 1.0;
        r.s[0] = 0.0;
        r.y[0] = -3.0;
        r.Ax[0] = 1.0;
        r.ATy[0] = -1.0;
        r.Px[0] = 0.0;
        r.update(&b, &c);
        match r.certificate(&b, &c, 1e-7) {
            Some(Certificate::PrimalInfeasible { denom, res_infeas }) => {
                assert_eq!(denom, 2.0);
                assert_eq!(res_infeas, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
