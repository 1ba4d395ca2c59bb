use super::Value;
use crate::solver::{Info, SolveOutput};

/// Conversion of solver results into caller owned values.
///
/// The solution vectors are moved into the returned arrays, so each
/// buffer changes hands exactly once.  A [`Workspace`](crate::solver::Workspace)
/// hands out copies of its persistent buffers, while the one-shot
/// [`solve`](crate::solver::solve) hands out the buffers themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMarshaler;

impl ResultMarshaler {
    /// A dict with keys `x`, `y`, `s` and `info`.
    pub fn export(output: SolveOutput) -> Value<'static> {
        let SolveOutput { x, y, s, info, .. } = output;
        Value::dict([
            ("x", Value::from(x)),
            ("y", Value::from(y)),
            ("s", Value::from(s)),
            ("info", Self::export_info(&info)),
        ])
    }

    /// The info record as a dict.  Times are reported in milliseconds.
    pub fn export_info(info: &Info) -> Value<'static> {
        let ms = |t: f64| Value::Float(t * 1e3);
        let count = |n: u32| Value::Int(i64::from(n));
        Value::dict([
            ("status_val", Value::Int(i64::from(info.status.code()))),
            ("status", Value::from(info.status.name())),
            ("iter", count(info.iter)),
            ("scale_updates", count(info.scale_updates)),
            ("scale", Value::Float(info.scale)),
            ("pobj", Value::Float(info.pobj)),
            ("dobj", Value::Float(info.dobj)),
            ("res_pri", Value::Float(info.res_pri)),
            ("res_dual", Value::Float(info.res_dual)),
            ("gap", Value::Float(info.gap)),
            ("res_infeas", Value::Float(info.res_infeas)),
            ("res_unbdd_a", Value::Float(info.res_unbdd_a)),
            ("res_unbdd_p", Value::Float(info.res_unbdd_p)),
            ("comp_slack", Value::Float(info.comp_slack)),
            ("setup_time", ms(info.setup_time)),
            ("solve_time", ms(info.solve_time)),
            ("lin_sys_time", ms(info.lin_sys_time)),
            ("cone_time", ms(info.cone_time)),
            ("accel_time", ms(info.accel_time)),
            ("rejected_accel_steps", count(info.rejected_accel_steps)),
            ("accepted_accel_steps", count(info.accepted_accel_steps)),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::marshal::{float_vector, Ownership};
    use crate::solver::SolverStatus;

    #[test]
    fn test_export_moves_buffers() {
        let x = vec![1.0, 2.0];
        let xptr = x.as_ptr();
        let mut info = Info::new();
        info.status = SolverStatus::MaxIterations;
        info.solve_time = 0.25;
        info.iter = 7;

        let out = ResultMarshaler::export(SolveOutput {
            x,
            y: vec![3.0],
            s: vec![4.0],
            info,
            diagnostics: vec![],
        });

        let xv = float_vector(out.field("x"), "x").unwrap();
        assert_eq!(xv.ownership(), Ownership::Borrowed);
        assert_eq!(xv.as_ptr(), xptr);
        assert_eq!(&*xv, &[1.0, 2.0]);

        let info = out.field("info");
        assert_eq!(info.field("status_val").as_int(), Some(3));
        assert!(matches!(info.field("status"), Value::Str(s) if s == "iteration limit"));
        assert_eq!(info.field("iter").as_int(), Some(7));
        assert_eq!(info.field("solve_time").as_float(), Some(250.0));
        assert!(info.field("res_infeas").as_float().is_some_and(f64::is_nan));
    }
}
