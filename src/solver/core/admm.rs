#![allow(non_snake_case)]

use super::accel::AndersonAccel;
use super::cones::ConeSet;
use super::linsys::*;
use super::residuals::{Certificate, Residuals};
use crate::algebra::*;
use crate::io::PrintTarget;
use crate::marshal::Diagnostic;
use crate::solver::csvlog::{CsvLog, CsvRow};
use crate::solver::info_print::PRINT_INTERVAL;
use crate::solver::{Info, ProblemData, Settings, Solution, SolverStatus};
use crate::timers::*;
use itertools::izip;
use std::time::Instant;

// adaptive scale is considered at this iteration interval
const ADAPTIVE_SCALE_INTERVAL: u32 = 100;
// residual imbalance that triggers a scale update
const ADAPTIVE_SCALE_THRESHOLD: f64 = 3.0;
const MIN_SCALE: f64 = 1e-6;
const MAX_SCALE: f64 = 1e6;
// tolerance loosening for inaccurate termination
const INACCURATE_FACTOR: f64 = 100.0;

/// Operator splitting iteration for
/// `min ½xᵀPx + cᵀx  s.t.  Ax + s = b, s ∈ K`.
///
/// The iterate `(x, s, y)` is held in the scaled space defined by the
/// backend's normalization.  Each iteration performs one backend solve,
/// one cone projection and the dual update.
pub(crate) struct AdmmEngine {
    n: usize,
    pub(crate) port: BackendPort,
    cones: ConeSet<f64>,
    norm: Option<Normalization>,

    // P in scaled space, triu
    P: CscMatrix<f64>,
    // unscaled and scaled vector data
    b: Vec<f64>,
    c: Vec<f64>,
    b_hat: Vec<f64>,
    c_hat: Vec<f64>,

    // scaled iterate
    x: Vec<f64>,
    s: Vec<f64>,
    y: Vec<f64>,
    scale: f64,

    // work
    rhs: Vec<f64>,
    lin_warm: Vec<f64>,
    s_rel: Vec<f64>,
    z_prev: Vec<f64>,
    z_next: Vec<f64>,
    z_plain: Vec<f64>,

    res: Residuals,
    accel: Option<AndersonAccel>,
}

// a pending accelerated step, checked at the following iteration
struct PendingAccel {
    f_norm: f64,
}

impl AdmmEngine {
    /// Initialize the backend and, if enabled, normalize the problem.
    pub(crate) fn new(
        data: &ProblemData,
        settings: &Settings,
        backend: Box<dyn LinearSystemBackend>,
        lock: &dyn SchedulerLock,
    ) -> Result<Self, BackendError> {
        let (m, n) = (data.m(), data.n());
        let mut port = BackendPort::new(backend);

        port.init(
            lock,
            &LinSysData {
                A: &data.A,
                P: data.P_if_nonempty(),
                rho_x: settings.rho_x,
                scale: settings.scale,
            },
        )?;

        let norm = if settings.normalize {
            port.normalize(lock, &data.cones.block_boundaries(), 1.0)?
        } else {
            None
        };

        let mut P = data.P.clone();
        if let Some(norm) = &norm {
            P.lrscale(&norm.d, &norm.d);
        }

        let mut engine = Self {
            n,
            port,
            cones: ConeSet::from_spec(&data.cones),
            norm,
            P,
            b: data.b.clone(),
            c: data.c.clone(),
            b_hat: vec![0.0; m],
            c_hat: vec![0.0; n],
            x: vec![0.0; n],
            s: vec![0.0; m],
            y: vec![0.0; m],
            scale: settings.scale,
            rhs: vec![0.0; n + m],
            lin_warm: vec![0.0; n + m],
            s_rel: vec![0.0; m],
            z_prev: vec![0.0; n + 2 * m],
            z_next: vec![0.0; n + 2 * m],
            z_plain: vec![0.0; n + 2 * m],
            res: Residuals::new(n, m),
            accel: AndersonAccel::new(n + 2 * m, settings.acceleration_lookback),
        };
        engine.rescale_vectors();
        Ok(engine)
    }

    fn rescale_vectors(&mut self) {
        self.b_hat.copy_from(&self.b);
        self.c_hat.copy_from(&self.c);
        if let Some(norm) = &self.norm {
            self.b_hat.hadamard(&norm.e);
            self.c_hat.hadamard(&norm.d);
        }
    }

    /// Replace `b` and/or `c`.  Lengths are checked by the caller.
    pub(crate) fn update_vectors(&mut self, b: Option<&[f64]>, c: Option<&[f64]>) {
        if let Some(b) = b {
            self.b.copy_from(b);
        }
        if let Some(c) = c {
            self.c.copy_from(c);
        }
        self.rescale_vectors();
    }

    /// Restore the backend's unnormalized data.
    pub(crate) fn close(&mut self, lock: &dyn SchedulerLock) -> Result<(), BackendError> {
        if let Some(norm) = self.norm.take() {
            self.port.un_normalize(lock, &norm, 1.0)?;
        }
        Ok(())
    }

    // ---------------------------------------------
    // conversions between scaled and unscaled space
    // x = D x̂,  s = E⁻¹ ŝ,  y = E ŷ
    // ---------------------------------------------

    fn load_initial_point(&mut self, sol: &Solution) {
        let sanitize = |v: f64| if v.is_finite() { v } else { 0.0 };
        self.x.scalarop_from(sanitize, &sol.x);
        self.s.scalarop_from(sanitize, &sol.s);
        self.y.scalarop_from(sanitize, &sol.y);
        if let Some(norm) = &self.norm {
            for (xi, di) in self.x.iter_mut().zip(&norm.d) {
                *xi /= di;
            }
            self.s.hadamard(&norm.e);
            for (yi, ei) in self.y.iter_mut().zip(&norm.e) {
                *yi /= ei;
            }
        }
    }

    // fill the unscaled iterate and products in `res`
    fn unscale_iterate(&mut self, lock: &dyn SchedulerLock) -> Result<(), BackendError> {
        let res = &mut self.res;
        self.port.apply_a(lock, &self.x, &mut res.Ax)?;
        self.port.apply_at(lock, &self.y, &mut res.ATy)?;
        res.Px.fill(0.0);
        self.P.sym().symv(&mut res.Px, &self.x, 1.0, 1.0);

        res.x.copy_from(&self.x);
        res.s.copy_from(&self.s);
        res.y.copy_from(&self.y);

        if let Some(norm) = &self.norm {
            let (d, e) = (&norm.d, &norm.e);
            res.x.hadamard(d);
            res.y.hadamard(e);
            for (si, ei) in res.s.iter_mut().zip(e) {
                *si /= ei;
            }
            for (v, ei) in res.Ax.iter_mut().zip(e) {
                *v /= ei;
            }
            for (v, di) in res.ATy.iter_mut().zip(d) {
                *v /= di;
            }
            for (v, di) in res.Px.iter_mut().zip(d) {
                *v /= di;
            }
        }
        Ok(())
    }

    fn stack(z: &mut [f64], x: &[f64], s: &[f64], y: &[f64]) {
        let (n, m) = (x.len(), s.len());
        z[..n].copy_from(x);
        z[n..n + m].copy_from(s);
        z[n + m..].copy_from(y);
    }

    // one ADMM iteration on the scaled iterate
    fn admm_step(
        &mut self,
        lock: &dyn SchedulerLock,
        settings: &Settings,
        iter: usize,
        timers: &mut Timers,
    ) -> Result<(), BackendError> {
        let (n, α, σ, ρ) = (self.n, settings.alpha, settings.rho_x, self.scale);

        // rhs = [σx - c; b - s - y/ρ]
        let (r1, r2) = self.rhs.split_at_mut(n);
        r1.waxpby(σ, &self.x, -1.0, &self.c_hat);
        r2.waxpby(1.0, &self.b_hat, -1.0, &self.s);
        r2.axpby(-ρ.recip(), &self.y, 1.0);

        let warm = (iter > 0).then_some(self.lin_warm.as_slice());
        let solved;
        timeit! {timers => "linsys";
            solved = self.port.solve(lock, &mut self.rhs, warm, iter);
        }
        solved?;
        self.lin_warm.copy_from(&self.rhs);

        let (xt, ν) = self.rhs.split_at(n);

        // s̃ = s + (y - ν)/ρ, relaxed
        for (sr, &s, &y, &ν) in izip!(&mut self.s_rel, &self.s, &self.y, ν) {
            let st = s + (y - ν) / ρ;
            *sr = α * st + (1.0 - α) * s;
        }
        self.x.axpby(α, xt, 1.0 - α);

        // s ← Π_K(s_rel - y/ρ)
        self.s.waxpby(1.0, &self.s_rel, -ρ.recip(), &self.y);
        timeit! {timers => "cones";
            self.cones.project(&mut self.s);
        }

        // y ← y - ρ(s_rel - s)
        for (y, &sr, &s) in izip!(&mut self.y, &self.s_rel, &self.s) {
            *y -= ρ * (sr - s);
        }
        Ok(())
    }

    fn maybe_update_scale(
        &mut self,
        lock: &dyn SchedulerLock,
        info: &mut Info,
    ) -> Result<(), BackendError> {
        let res = &self.res;
        let rel_pri = res.res_pri / res_scale_floor(res.pri_scale());
        let rel_dual = res.res_dual / res_scale_floor(res.dual_scale());
        if !(rel_pri > 0.0 && rel_dual > 0.0 && rel_pri.is_finite() && rel_dual.is_finite()) {
            return Ok(());
        }
        let ratio = (rel_pri / rel_dual).sqrt();
        if ratio < ADAPTIVE_SCALE_THRESHOLD && ratio > ADAPTIVE_SCALE_THRESHOLD.recip() {
            return Ok(());
        }
        let new_scale = (self.scale * ratio).clamp(MIN_SCALE, MAX_SCALE);
        if new_scale == self.scale {
            return Ok(());
        }
        if self.port.update_scale(lock, new_scale)? {
            log::debug!("scale updated from {:e} to {:e}", self.scale, new_scale);
            self.scale = new_scale;
            info.scale_updates += 1;
            if let Some(accel) = self.accel.as_mut() {
                accel.reset();
            }
        }
        Ok(())
    }

    fn fill_info(&self, info: &mut Info, iter: u32) {
        let res = &self.res;
        info.iter = iter;
        info.scale = self.scale;
        info.res_pri = res.res_pri;
        info.res_dual = res.res_dual;
        info.gap = res.gap;
        info.pobj = res.pobj;
        info.dobj = res.dobj;
        info.comp_slack = res.comp_slack;
    }

    /// Run the iteration from the point in `sol`, leaving the result in
    /// `sol` and the metrics in `info`.
    pub(crate) fn solve(
        &mut self,
        lock: &dyn SchedulerLock,
        settings: &Settings,
        sol: &mut Solution,
        info: &mut Info,
        printer: &mut PrintTarget,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), BackendError> {
        let start = Instant::now();
        let mut timers = Timers::default();
        let timers = &mut timers;

        info.reset();
        info.scale = self.scale;
        self.res.reset();
        if let Some(accel) = self.accel.as_mut() {
            accel.reset();
        }
        self.load_initial_point(sol);

        let mut csv = settings
            .log_csv_filename
            .as_deref()
            .map(|path| CsvLog::create(path, diagnostics));

        print_or_warn(info.print_status_header(printer, settings));

        let interval = settings.acceleration_interval() as usize;
        let time_limit = settings.time_limit();
        let mut pending: Option<PendingAccel> = None;
        let mut iter: u32 = 0;

        let status = loop {
            // termination checks in unscaled space
            self.unscale_iterate(lock)?;
            self.res.update(&self.b, &self.c);
            self.fill_info(info, iter);

            if let Some(csv) = csv.as_mut() {
                csv.row(
                    &CsvRow {
                        iter,
                        res_pri: info.res_pri,
                        res_dual: info.res_dual,
                        gap: info.gap,
                        pobj: info.pobj,
                        dobj: info.dobj,
                        scale: info.scale,
                        time: start.elapsed().as_secs_f64(),
                    },
                    diagnostics,
                );
            }

            if self.res.is_solved(settings.eps_abs, settings.eps_rel) {
                break Termination::Solved(SolverStatus::Solved);
            }
            if let Some(cert) = self.res.certificate(&self.b, &self.c, settings.eps_infeas) {
                break Termination::Certificate(cert, false);
            }

            let limit = if iter >= settings.max_iters {
                Some(SolverStatus::MaxIterations)
            } else if time_limit.is_some_and(|t| start.elapsed() >= t) {
                Some(SolverStatus::MaxTime)
            } else {
                None
            };
            if let Some(limit) = limit {
                break self.inaccurate_termination(settings, limit);
            }

            if iter % PRINT_INTERVAL == 0 {
                print_or_warn(info.print_status(printer, settings, start.elapsed().as_secs_f64()));
            }

            self.res.rotate();

            // ADMM step from z_prev to z_next
            Self::stack(&mut self.z_prev, &self.x, &self.s, &self.y);
            self.admm_step(lock, settings, iter as usize, timers)?;
            Self::stack(&mut self.z_next, &self.x, &self.s, &self.y);
            let f_norm = self.z_next.norm_inf_diff(&self.z_prev);

            if let Some(accel) = self.accel.as_mut() {
                timeit! {timers => "accel";
                    // safeguard the previous accelerated step
                    let mut rejected = false;
                    if let Some(p) = pending.take() {
                        if f_norm > p.f_norm {
                            rejected = true;
                            info.rejected_accel_steps += 1;
                            accel.reset();
                            Self::unstack(&self.z_plain, &mut self.x, &mut self.s, &mut self.y);
                        } else {
                            info.accepted_accel_steps += 1;
                        }
                    }
                    if !rejected && (iter as usize) % interval == 0 {
                        self.z_plain.copy_from(&self.z_next);
                        if accel.apply(&self.z_prev, &mut self.z_next) {
                            pending = Some(PendingAccel { f_norm });
                            Self::unstack(&self.z_next, &mut self.x, &mut self.s, &mut self.y);
                        }
                    }
                }
            }

            iter += 1;

            if settings.adaptive_scale && iter % ADAPTIVE_SCALE_INTERVAL == 0 {
                self.maybe_update_scale(lock, info)?;
            }
        };

        // final status and solution in unscaled space
        match status {
            Termination::Solved(status) | Termination::Limit(status) => {
                info.status = status;
                sol.x.copy_from(&self.res.x);
                sol.s.copy_from(&self.res.s);
                sol.y.copy_from(&self.res.y);
            }
            Termination::Certificate(cert, inaccurate) => {
                self.res.write_certificate(cert, &mut sol.x, &mut sol.y, &mut sol.s);
                match cert {
                    Certificate::PrimalInfeasible { res_infeas, .. } => {
                        info.status = if inaccurate {
                            SolverStatus::InfeasibleInaccurate
                        } else {
                            SolverStatus::Infeasible
                        };
                        info.res_infeas = res_infeas;
                        info.pobj = f64::INFINITY;
                        info.dobj = f64::INFINITY;
                    }
                    Certificate::DualInfeasible {
                        res_unbdd_a,
                        res_unbdd_p,
                        ..
                    } => {
                        info.status = if inaccurate {
                            SolverStatus::UnboundedInaccurate
                        } else {
                            SolverStatus::Unbounded
                        };
                        info.res_unbdd_a = res_unbdd_a;
                        info.res_unbdd_p = res_unbdd_p;
                        info.pobj = f64::NEG_INFINITY;
                        info.dobj = f64::NEG_INFINITY;
                    }
                }
            }
        }

        if let Some(csv) = csv {
            csv.finish(diagnostics);
        }

        info.solve_time = start.elapsed().as_secs_f64();
        info.lin_sys_time = self.port.take_timing_report().as_secs_f64();
        info.cone_time = timers.elapsed(&["cones"]).as_secs_f64();
        info.accel_time = timers.elapsed(&["accel"]).as_secs_f64();

        print_or_warn(info.print_status(printer, settings, info.solve_time));
        print_or_warn(info.print_footer(printer, settings));

        Ok(())
    }

    fn unstack(z: &[f64], x: &mut [f64], s: &mut [f64], y: &mut [f64]) {
        let (n, m) = (x.len(), s.len());
        x.copy_from(&z[..n]);
        s.copy_from(&z[n..n + m]);
        y.copy_from(&z[n + m..]);
    }

    // status at an iteration or time limit
    fn inaccurate_termination(&mut self, settings: &Settings, limit: SolverStatus) -> Termination {
        let (eps_abs, eps_rel) = (
            settings.eps_abs * INACCURATE_FACTOR,
            settings.eps_rel * INACCURATE_FACTOR,
        );
        if self.res.is_solved(eps_abs, eps_rel) {
            return Termination::Solved(SolverStatus::SolvedInaccurate);
        }
        let eps_infeas = settings.eps_infeas * INACCURATE_FACTOR;
        if let Some(cert) = self.res.certificate(&self.b, &self.c, eps_infeas) {
            return Termination::Certificate(cert, true);
        }
        Termination::Limit(limit)
    }
}

enum Termination {
    Solved(SolverStatus),
    Limit(SolverStatus),
    Certificate(Certificate, bool),
}

fn res_scale_floor(v: f64) -> f64 {
    v.max(1e-10)
}

fn print_or_warn(result: std::io::Result<()>) {
    if let Err(e) = result {
        log::warn!("verbose output failed: {e}");
    }
}
