#![allow(non_snake_case)]

use splitcone::io::ConfigurablePrintTarget;
use splitcone::{algebra::*, marshal::*, solver::*};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn lp_data(b: f64) -> (CscMatrix<f64>, Value<'static>) {
    // A = [2I; -2I], b = b*1, c = [3, -2, 1]
    let A = CscMatrix::from(&[
        [2., 0., 0.],  //
        [0., 2., 0.],  //
        [0., 0., 2.],  //
        [-2., 0., 0.], //
        [0., -2., 0.], //
        [0., 0., -2.], //
    ]);
    let data = Value::dict([
        ("m", Value::Int(6)),
        ("n", Value::Int(3)),
        ("Ax", Value::from(A.nzval.clone())),
        ("Ai", Value::from(A.rowval.clone())),
        ("Ap", Value::from(A.colptr.clone())),
        ("b", Value::from(vec![b; 6])),
        ("c", Value::from(vec![3., -2., 1.])),
    ]);
    (A, data)
}

fn lp_cone() -> Value<'static> {
    Value::dict([("l", Value::Int(6))])
}

fn quiet() -> Value<'static> {
    Value::dict([
        ("eps_abs", Value::Float(1e-7)),
        ("eps_rel", Value::Float(1e-7)),
        ("verbose", Value::Bool(false)),
    ])
}

fn state_error(e: InterfaceError) -> WorkspaceStateError {
    match e {
        InterfaceError::WorkspaceState(s) => s,
        other => panic!("expected a workspace state error, found {other}"),
    }
}

#[test]
fn test_lifecycle_errors() {
    let (_, data) = lp_data(1.);
    let mut ws = Workspace::new();

    let err = ws.solve(false, None, None, None).unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::NotInitialized);
    let err = ws.update(None, None).unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::NotInitialized);
    let err = ws.close().unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::NotInitialized);
    assert!(!ws.is_closed());

    ws.init(&data, &lp_cone(), &quiet()).unwrap();
    assert!(ws.is_initialized());
    let err = ws.init(&data, &lp_cone(), &quiet()).unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::AlreadyInitialized);

    ws.close().unwrap();
    assert!(ws.is_closed());
    let err = ws.solve(false, None, None, None).unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::Closed);
    let err = ws.init(&data, &lp_cone(), &quiet()).unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::Closed);
    let err = ws.close().unwrap_err();
    assert_eq!(state_error(err), WorkspaceStateError::Closed);
    assert!(ws.info().is_err());
}

#[test]
fn test_failed_init_stays_uninitialized() {
    let (_, data) = lp_data(1.);
    let mut ws = Workspace::new();

    // cone dimension does not match m
    let cone = Value::dict([("l", Value::Int(5))]);
    assert!(ws.init(&data, &cone, &quiet()).is_err());
    assert!(!ws.is_initialized());

    ws.init(&data, &lp_cone(), &quiet()).unwrap();
    assert!(ws.is_initialized());
}

#[test]
fn test_update_changes_solution() {
    let (_, data) = lp_data(1.);
    let mut ws = Workspace::new();
    ws.init(&data, &lp_cone(), &quiet()).unwrap();

    let out = ws.solve(false, None, None, None).unwrap();
    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[-0.5, 0.5, -0.5]) <= 1e-4);

    let b = Value::from(vec![2.; 6]);
    ws.update(Some(&b), None).unwrap();
    let out = ws.solve(false, None, None, None).unwrap();
    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[-1., 1., -1.]) <= 1e-4);
    assert!((out.info.pobj - (-6.)).abs() <= 1e-4);

    let c = Value::from(vec![-3., 2., -1.]);
    ws.update(None, Some(&c)).unwrap();
    let out = ws.solve(false, None, None, None).unwrap();
    assert!(out.x.norm_inf_diff(&[1., -1., 1.]) <= 1e-4);

    // wrong length leaves the data untouched
    let short = Value::from(vec![1.; 5]);
    let err = ws.update(Some(&short), None).unwrap_err();
    assert_eq!(err.field_name(), Some("b"));
}

#[test]
fn test_warm_start_continues() {
    let (_, data) = lp_data(1.);
    let mut ws = Workspace::new();
    ws.init(&data, &lp_cone(), &quiet()).unwrap();

    let cold = ws.solve(false, None, None, None).unwrap();
    let warm = ws.solve(true, None, None, None).unwrap();
    assert_eq!(warm.info.status, SolverStatus::Solved);
    assert!(warm.info.iter <= cold.info.iter);
    assert!(warm.x.norm_inf_diff(&cold.x) <= 1e-4);

    // supplying the previous solution explicitly behaves the same
    let (x, y, s) = (
        Value::from(cold.x.clone()),
        Value::from(cold.y.clone()),
        Value::from(cold.s.clone()),
    );
    let again = ws.solve(true, Some(&x), Some(&y), Some(&s)).unwrap();
    assert!(again.info.iter <= cold.info.iter);
}

#[test]
fn test_bad_warm_start_vector_is_a_diagnostic() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (_, data) = lp_data(1.);
    let mut ws = Workspace::new();
    ws.init(&data, &lp_cone(), &quiet()).unwrap();

    let bad_x = Value::from(vec![1.; 5]);
    let out = ws.solve(true, Some(&bad_x), None, None).unwrap();
    assert_eq!(out.info.status, SolverStatus::Solved);
    assert_eq!(out.diagnostics.len(), 1);
    assert!(matches!(&out.diagnostics[0], Diagnostic::WarmStart(e) if e.name == "x"));

    // wrong element type is reported the same way
    let text = Value::from("not a vector");
    let out = ws.solve(true, None, Some(&text), None).unwrap();
    assert!(matches!(&out.diagnostics[0], Diagnostic::WarmStart(e) if e.name == "y"));
}

#[test]
fn test_init_diagnostics_returned_once() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (_, data) = lp_data(1.);
    let cone = Value::dict([("f", Value::Int(0)), ("l", Value::Int(6))]);
    let mut ws = Workspace::new();
    ws.init(&data, &cone, &quiet()).unwrap();
    assert!(ws.solve(false, None, None, None).unwrap().diagnostics.is_empty());

    // a zero cone only through the legacy field
    let A = CscMatrix::from(&[[1.], [-1.]]);
    let data = Value::dict([
        ("m", Value::Int(2)),
        ("n", Value::Int(1)),
        ("Ax", Value::from(A.nzval.clone())),
        ("Ai", Value::from(A.rowval.clone())),
        ("Ap", Value::from(A.colptr.clone())),
        ("b", Value::from(vec![1., 0.])),
        ("c", Value::from(vec![1.])),
    ]);
    let cone = Value::dict([("f", Value::Int(1)), ("l", Value::Int(1))]);
    let mut ws = Workspace::new();
    ws.init(&data, &cone, &quiet()).unwrap();

    let first = ws.solve(false, None, None, None).unwrap();
    assert_eq!(first.info.status, SolverStatus::Solved);
    assert!((first.x[0] - 1.).abs() <= 1e-4);
    assert!(matches!(
        first.diagnostics.as_slice(),
        [Diagnostic::DeprecatedConeField { field: "f", .. }]
    ));
    let second = ws.solve(false, None, None, None).unwrap();
    assert!(second.diagnostics.is_empty());
}

#[test]
fn test_verbose_output_to_buffer() {
    let (_, data) = lp_data(1.);
    let mut ws = Workspace::new();
    ws.print_to_buffer();
    let settings = Value::dict([("verbose", Value::Bool(true))]);
    ws.init(&data, &lp_cone(), &settings).unwrap();
    ws.solve(false, None, None, None).unwrap();

    let text = ws.get_print_buffer().unwrap();
    assert!(text.contains("splitcone v"));
    assert!(text.contains("variables     = 3"));
    assert!(text.contains("constraints   = 6"));
    assert!(ws.get_print_buffer().unwrap().is_empty());

    // nothing printed when quiet
    let mut ws = Workspace::new();
    ws.print_to_buffer();
    ws.init(&data, &lp_cone(), &quiet()).unwrap();
    ws.solve(false, None, None, None).unwrap();
    assert!(ws.get_print_buffer().unwrap().is_empty());
}

// ---------------------------------------------------------------
// scheduler lock alternation
// ---------------------------------------------------------------

struct LockState {
    held: AtomicBool,
    attached_calls: AtomicUsize,
    violations: AtomicUsize,
}

#[derive(Clone)]
struct TrackingLock {
    state: Arc<LockState>,
}

impl TrackingLock {
    fn new() -> Self {
        // the host holds its lock when it calls into the solver
        let state = LockState {
            held: AtomicBool::new(true),
            attached_calls: AtomicUsize::new(0),
            violations: AtomicUsize::new(0),
        };
        Self {
            state: Arc::new(state),
        }
    }

    fn check_held(&self) {
        if !self.state.held.load(Ordering::SeqCst) {
            self.state.violations.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl SchedulerLock for TrackingLock {
    fn run_detached(&self, f: &mut (dyn FnMut() + Send)) {
        let prev = self.state.held.swap(false, Ordering::SeqCst);
        f();
        self.state.held.store(prev, Ordering::SeqCst);
    }

    fn run_attached(&self, f: &mut dyn FnMut()) {
        self.state.attached_calls.fetch_add(1, Ordering::SeqCst);
        let prev = self.state.held.swap(true, Ordering::SeqCst);
        f();
        self.state.held.store(prev, Ordering::SeqCst);
    }
}

// a reentrant backend that forwards to the direct backend and checks
// that the host lock is held for every call
fn reentrant_direct(lock: &TrackingLock) -> CallbackBackend {
    let direct = Arc::new(Mutex::new(DirectBackend::new()));

    let (d, l) = (direct.clone(), lock.clone());
    let solve = move |rhs: &[f64], warm: Option<&[f64]>, iter: usize| -> Result<Vec<f64>, BackendError> {
        l.check_held();
        let mut out = rhs.to_vec();
        d.lock().unwrap().solve(&mut out, warm, iter)?;
        Ok(out)
    };
    let (d, l) = (direct.clone(), lock.clone());
    let apply_a = move |x: &[f64]| -> Result<Vec<f64>, BackendError> {
        l.check_held();
        let mut d = d.lock().unwrap();
        let mut y = vec![0.; 6];
        d.apply_a(x, &mut y)?;
        Ok(y)
    };
    let (d, l) = (direct.clone(), lock.clone());
    let apply_at = move |y: &[f64]| -> Result<Vec<f64>, BackendError> {
        l.check_held();
        let mut d = d.lock().unwrap();
        let mut x = vec![0.; 3];
        d.apply_at(y, &mut x)?;
        Ok(x)
    };
    let (d, l) = (direct, lock.clone());
    let init = move |data: &LinSysData<'_>| {
        l.check_held();
        d.lock().unwrap().init(data)
    };

    CallbackBackend::new(CallMode::Reentrant, solve, apply_a, apply_at)
        .with_init(init)
        .with_method("reentrant direct")
}

#[test]
fn test_reentrant_backend_runs_with_lock_held() {
    let (_, data) = lp_data(1.);
    let lock = TrackingLock::new();
    let backend = reentrant_direct(&lock);

    let mut ws = Workspace::new().with_lock(lock.clone());
    ws.init_with_backend(&data, &lp_cone(), &quiet(), Box::new(backend))
        .unwrap();
    let out = ws.solve(false, None, None, None).unwrap();
    ws.close().unwrap();

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[-0.5, 0.5, -0.5]) <= 1e-4);
    assert_eq!(lock.state.violations.load(Ordering::SeqCst), 0);
    assert!(lock.state.attached_calls.load(Ordering::SeqCst) > 0);
    // control returns to the host with its lock held
    assert!(lock.state.held.load(Ordering::SeqCst));
}

#[test]
fn test_native_backend_is_never_attached() {
    let (_, data) = lp_data(1.);
    let lock = TrackingLock::new();
    let mut ws = Workspace::new().with_lock(lock.clone());
    ws.init(&data, &lp_cone(), &quiet()).unwrap();
    ws.solve(false, None, None, None).unwrap();
    ws.close().unwrap();

    assert_eq!(lock.state.attached_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_malformed_backend_result() {
    let (A, data) = lp_data(1.);
    let (A1, A2) = (A.clone(), A);

    // returns one element too few from every solve
    let backend = CallbackBackend::new(
        CallMode::NativeSafe,
        |rhs: &[f64], _warm: Option<&[f64]>, _iter: usize| Ok(vec![0.; rhs.len() - 1]),
        move |x: &[f64]| {
            let mut y = vec![0.; A1.m];
            A1.gemv(&mut y, x, 1., 0.);
            Ok(y)
        },
        move |y: &[f64]| {
            let mut x = vec![0.; A2.n];
            A2.t().gemv(&mut x, y, 1., 0.);
            Ok(x)
        },
    );

    let mut ws = Workspace::new();
    ws.init_with_backend(&data, &lp_cone(), &quiet(), Box::new(backend))
        .unwrap();

    let err = ws.solve(false, None, None, None).unwrap_err();
    match err {
        InterfaceError::Backend(BackendError::Contract {
            op,
            expected,
            found,
        }) => {
            assert_eq!(op, "solve");
            assert_eq!(expected, 9);
            assert_eq!(found, 8);
        }
        other => panic!("unexpected error {other}"),
    }

    // the workspace survives the failure
    assert!(ws.is_initialized());
    assert!(ws.info().is_ok());
    ws.update(Some(&Value::from(vec![2.; 6])), None).unwrap();
    ws.close().unwrap();
}

#[test]
fn test_backend_timing_is_consumed() {
    let A = CscMatrix::<f64>::identity(2);
    let backend = CallbackBackend::new(
        CallMode::NativeSafe,
        |rhs: &[f64], _warm: Option<&[f64]>, _iter: usize| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(rhs.to_vec())
        },
        |x: &[f64]| Ok(x.to_vec()),
        |y: &[f64]| Ok(y.to_vec()),
    );
    let mut port = BackendPort::new(Box::new(backend));
    let data = LinSysData {
        A: &A,
        P: None,
        rho_x: 1e-6,
        scale: 0.1,
    };
    port.init(&NoLock, &data).unwrap();

    let mut rhs = vec![1.; 4];
    port.solve(&NoLock, &mut rhs, None, 0).unwrap();
    port.solve(&NoLock, &mut rhs, None, 1).unwrap();

    assert!(port.take_timing_report() >= Duration::from_millis(10));
    assert_eq!(port.take_timing_report(), Duration::ZERO);
}

#[test]
fn test_init_diagnostics_survive_failed_solve() {
    let A = CscMatrix::from(&[[1.], [-1.]]);
    let data = Value::dict([
        ("m", Value::Int(2)),
        ("n", Value::Int(1)),
        ("Ax", Value::from(A.nzval.clone())),
        ("Ai", Value::from(A.rowval.clone())),
        ("Ap", Value::from(A.colptr.clone())),
        ("b", Value::from(vec![1., 0.])),
        ("c", Value::from(vec![1.])),
    ]);
    let cone = Value::dict([("f", Value::Int(1)), ("l", Value::Int(1))]);

    // forwards to the direct backend, but answers short while `broken` is set
    let direct = Arc::new(Mutex::new(DirectBackend::new()));
    let broken = Arc::new(AtomicBool::new(true));

    let (d, b) = (direct.clone(), broken.clone());
    let solve = move |rhs: &[f64], warm: Option<&[f64]>, iter: usize| -> Result<Vec<f64>, BackendError> {
        let mut out = rhs.to_vec();
        if b.load(Ordering::SeqCst) {
            out.pop();
            return Ok(out);
        }
        d.lock().unwrap().solve(&mut out, warm, iter)?;
        Ok(out)
    };
    let d = direct.clone();
    let apply_a = move |x: &[f64]| -> Result<Vec<f64>, BackendError> {
        let mut y = vec![0.; 2];
        d.lock().unwrap().apply_a(x, &mut y)?;
        Ok(y)
    };
    let d = direct.clone();
    let apply_at = move |y: &[f64]| -> Result<Vec<f64>, BackendError> {
        let mut x = vec![0.; 1];
        d.lock().unwrap().apply_at(y, &mut x)?;
        Ok(x)
    };
    let init = move |data: &LinSysData<'_>| direct.lock().unwrap().init(data);
    let backend = CallbackBackend::new(CallMode::NativeSafe, solve, apply_a, apply_at).with_init(init);

    let mut ws = Workspace::new();
    ws.init_with_backend(&data, &cone, &quiet(), Box::new(backend))
        .unwrap();

    let err = ws.solve(false, None, None, None).unwrap_err();
    assert!(matches!(
        err,
        InterfaceError::Backend(BackendError::Contract { op: "solve", .. })
    ));

    // the deprecation notice is reported by the first solve that succeeds
    broken.store(false, Ordering::SeqCst);
    let out = ws.solve(false, None, None, None).unwrap();
    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!((out.x[0] - 1.).abs() <= 1e-4);
    assert!(matches!(
        out.diagnostics.as_slice(),
        [Diagnostic::DeprecatedConeField { field: "f", .. }]
    ));
    assert!(ws.solve(false, None, None, None).unwrap().diagnostics.is_empty());
}
