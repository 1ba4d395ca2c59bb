use super::SolverStatus;
#[cfg(feature = "serde")]
use serde::Serialize;

/// Status and metrics of a solve.
///
/// Times are in seconds.  Residuals and objectives refer to the original,
/// unscaled problem.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Info {
    pub status: SolverStatus,
    pub iter: u32,
    pub scale_updates: u32,
    pub scale: f64,
    pub pobj: f64,
    pub dobj: f64,
    pub res_pri: f64,
    pub res_dual: f64,
    pub gap: f64,
    /// primal infeasibility certificate residual `‖Aᵀy‖∞` with `bᵀy = -1`
    pub res_infeas: f64,
    /// dual infeasibility certificate residual `‖Ax + s‖∞` with `cᵀx = -1`
    pub res_unbdd_a: f64,
    /// dual infeasibility certificate residual `‖Px‖∞` with `cᵀx = -1`
    pub res_unbdd_p: f64,
    pub comp_slack: f64,
    pub setup_time: f64,
    pub solve_time: f64,
    pub lin_sys_time: f64,
    pub cone_time: f64,
    pub accel_time: f64,
    pub rejected_accel_steps: u32,
    pub accepted_accel_steps: u32,
}

impl Info {
    pub fn new() -> Self {
        Self {
            res_infeas: f64::NAN,
            res_unbdd_a: f64::NAN,
            res_unbdd_p: f64::NAN,
            ..Self::default()
        }
    }

    /// Clear everything except the setup time.
    pub(crate) fn reset(&mut self) {
        let setup_time = self.setup_time;
        *self = Self::new();
        self.setup_time = setup_time;
    }
}
