#![allow(non_snake_case)]

use splitcone::{algebra::*, marshal::*, solver::*};

fn problem_data(P: Option<&CscMatrix<f64>>, A: &CscMatrix<f64>, b: &[f64], c: &[f64]) -> Value<'static> {
    let mut items = vec![
        ("m", Value::Int(A.m as i64)),
        ("n", Value::Int(A.n as i64)),
        ("Ax", Value::from(A.nzval.clone())),
        ("Ai", Value::from(A.rowval.clone())),
        ("Ap", Value::from(A.colptr.clone())),
        ("b", Value::from(b.to_vec())),
        ("c", Value::from(c.to_vec())),
    ];
    if let Some(P) = P {
        items.push(("Px", Value::from(P.nzval.clone())));
        items.push(("Pi", Value::from(P.rowval.clone())));
        items.push(("Pp", Value::from(P.colptr.clone())));
    }
    Value::dict(items)
}

fn tight_settings(extra: Vec<(&str, Value<'static>)>) -> Value<'static> {
    let mut items = vec![
        ("eps_abs", Value::Float(1e-7)),
        ("eps_rel", Value::Float(1e-7)),
        ("verbose", Value::Bool(false)),
    ];
    items.extend(extra);
    Value::dict(items)
}

fn basic_lp_data() -> (CscMatrix<f64>, Vec<f64>, Vec<f64>) {
    // A = [2I; -2I]
    let A = CscMatrix::from(&[
        [2., 0., 0.],  //
        [0., 2., 0.],  //
        [0., 0., 2.],  //
        [-2., 0., 0.], //
        [0., -2., 0.], //
        [0., 0., -2.], //
    ]);
    let b = vec![1.; 6];
    let c = vec![3., -2., 1.];
    (A, b, c)
}

fn lp_cone() -> Value<'static> {
    Value::dict([("l", Value::Int(6))])
}

fn one_shot(data: &Value, cone: &Value, settings: &Value) -> SolveOutput {
    solve(data, cone, settings, &Value::None, None, &NoLock).unwrap()
}

#[test]
fn test_lp_feasible() {
    let (A, b, c) = basic_lp_data();
    let data = problem_data(None, &A, &b, &c);
    let out = one_shot(&data, &lp_cone(), &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    let refsol = [-0.5, 0.5, -0.5];
    assert!(out.x.norm_inf_diff(&refsol) <= 1e-4);
    assert!((out.info.pobj - (-3.)).abs() <= 1e-4);
    assert!((out.info.dobj - (-3.)).abs() <= 1e-4);
    assert!(out.diagnostics.is_empty());

    // y lies in the nonnegative orthant and s satisfies Ax + s = b
    assert!(out.y.iter().all(|&v| v >= -1e-6));
    let mut r = b.clone();
    A.gemv(&mut r, &out.x, -1., 1.);
    assert!(r.norm_inf_diff(&out.s) <= 1e-4);
}

#[test]
fn test_lp_primal_infeasible() {
    let (A, mut b, c) = basic_lp_data();
    b[0] = -1.;
    b[3] = -1.;
    let data = problem_data(None, &A, &b, &c);
    let settings = tight_settings(vec![("acceleration_lookback", Value::Int(0))]);
    let out = one_shot(&data, &lp_cone(), &settings);

    assert_eq!(out.info.status, SolverStatus::Infeasible);
    assert_eq!(out.info.pobj, f64::INFINITY);
    assert!(out.x.iter().all(|v| v.is_nan()));
    assert!(out.s.iter().all(|v| v.is_nan()));
    assert!((b.dot(&out.y) + 1.).abs() <= 1e-8);
    assert!(out.info.res_infeas < 1e-7);
}

#[test]
fn test_lp_dual_infeasible() {
    let (mut A, b, _) = basic_lp_data();
    // column 0 becomes [2; 0; 0; 1; 0; 0], so x0 is unbounded below
    A.nzval[1] = 1.;
    let c = vec![1., 0., 0.];
    let data = problem_data(None, &A, &b, &c);
    let settings = tight_settings(vec![("acceleration_lookback", Value::Int(0))]);
    let out = one_shot(&data, &lp_cone(), &settings);

    assert_eq!(out.info.status, SolverStatus::Unbounded);
    assert_eq!(out.info.dobj, f64::NEG_INFINITY);
    assert!(out.y.iter().all(|v| v.is_nan()));
    assert!((c.dot(&out.x) + 1.).abs() <= 1e-8);
}

#[test]
fn test_qp_feasible() {
    let P = CscMatrix::from(&[
        [4., 1.], //
        [0., 2.], //
    ]);
    let A = CscMatrix::from(&[
        [1., 1.],  //
        [1., 0.],  //
        [0., 1.],  //
        [-1., 0.], //
        [0., -1.], //
    ]);
    let b = vec![1., 0.7, 0.7, 0., 0.];
    let c = vec![1., 1.];
    let data = problem_data(Some(&P), &A, &b, &c);
    let cone = Value::dict([("z", Value::Int(1)), ("l", Value::Int(4))]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[0.3, 0.7]) <= 1e-3);
    assert!((out.info.pobj - 1.88).abs() <= 1e-3);
}

#[test]
fn test_socp_feasible() {
    // min x0  s.t.  x1 = 1, x2 = 1, x ∈ Q³
    let A = CscMatrix::from(&[
        [0., 1., 0.],  //
        [0., 0., 1.],  //
        [-1., 0., 0.], //
        [0., -1., 0.], //
        [0., 0., -1.], //
    ]);
    let b = vec![1., 1., 0., 0., 0.];
    let c = vec![1., 0., 0.];
    let data = problem_data(None, &A, &b, &c);
    let cone = Value::dict([("z", Value::Int(2)), ("q", Value::from(vec![3usize]))]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!((out.x[0] - f64::sqrt(2.)).abs() <= 1e-3);
    assert!((out.info.pobj - f64::sqrt(2.)).abs() <= 1e-3);
}

#[test]
fn test_zero_iterations() {
    let (A, b, c) = basic_lp_data();
    let data = problem_data(None, &A, &b, &c);
    let settings = tight_settings(vec![("max_iters", Value::Int(0))]);
    let out = one_shot(&data, &lp_cone(), &settings);

    assert_eq!(out.info.status, SolverStatus::MaxIterations);
    assert_eq!(out.info.iter, 0);
    assert_eq!(out.x.len(), 3);
    assert_eq!(out.y.len(), 6);
    assert_eq!(out.s.len(), 6);

    let exported = ResultMarshaler::export(out);
    let info = exported.field("info");
    assert_eq!(info.field("status_val").as_int(), Some(3));
    assert_eq!(info.field("iter").as_int(), Some(0));
}

#[test]
fn test_indirect_backend_matches() {
    let (A, b, c) = basic_lp_data();
    let data = problem_data(None, &A, &b, &c);
    let settings = tight_settings(vec![("use_indirect", Value::Bool(true))]);
    let out = one_shot(&data, &lp_cone(), &settings);

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[-0.5, 0.5, -0.5]) <= 1e-3);
}

#[test]
fn test_warm_start_from_solution() {
    let (A, b, c) = basic_lp_data();
    let data = problem_data(None, &A, &b, &c);
    let settings = tight_settings(vec![]);
    let cold = one_shot(&data, &lp_cone(), &settings);

    let warm = Value::dict([
        ("x", Value::from(cold.x.clone())),
        ("y", Value::from(cold.y.clone())),
        ("s", Value::from(cold.s.clone())),
    ]);
    let hot = solve(&data, &lp_cone(), &settings, &warm, None, &NoLock).unwrap();
    assert_eq!(hot.info.status, SolverStatus::Solved);
    assert!(hot.info.iter <= cold.info.iter);
}

#[test]
fn test_box_cone_feasible() {
    // max x1  s.t.  x0 = 1, (x0, x1) in {(t, s) : 0 ≤ s ≤ 2t}
    let A = CscMatrix::from(&[
        [1., 0.],  //
        [-1., 0.], //
        [0., -1.], //
    ]);
    let b = vec![1., 0., 0.];
    let c = vec![0., -1.];
    let data = problem_data(None, &A, &b, &c);
    let cone = Value::dict([
        ("z", Value::Int(1)),
        ("bl", Value::from(vec![0.])),
        ("bu", Value::from(vec![2.])),
    ]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[1., 2.]) <= 1e-3);
    assert!((out.info.pobj + 2.).abs() <= 1e-3);
}

#[test]
fn test_expcone_feasible() {
    // min x2  s.t.  x0 = 1, x1 = 1, x ∈ K_exp, so x2 = e
    let A = CscMatrix::from(&[
        [1., 0., 0.],  //
        [0., 1., 0.],  //
        [-1., 0., 0.], //
        [0., -1., 0.], //
        [0., 0., -1.], //
    ]);
    let b = vec![1., 1., 0., 0., 0.];
    let c = vec![0., 0., 1.];
    let data = problem_data(None, &A, &b, &c);
    let cone = Value::dict([("z", Value::Int(2)), ("ep", Value::Int(1))]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!((out.x[2] - std::f64::consts::E).abs() <= 1e-3);
    assert!((out.info.pobj - std::f64::consts::E).abs() <= 1e-3);
}

#[test]
fn test_powcone_feasible() {
    // min x0  s.t.  x1 = 1, x2 = 1, x0^0.5 x1^0.5 ≥ |x2|
    let A = CscMatrix::from(&[
        [0., 1., 0.],  //
        [0., 0., 1.],  //
        [-1., 0., 0.], //
        [0., -1., 0.], //
        [0., 0., -1.], //
    ]);
    let b = vec![1., 1., 0., 0., 0.];
    let c = vec![1., 0., 0.];
    let data = problem_data(None, &A, &b, &c);
    let cone = Value::dict([("z", Value::Int(2)), ("p", Value::from(vec![0.5]))]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!((out.x[0] - 1.).abs() <= 1e-3);
    assert!((out.info.pobj - 1.).abs() <= 1e-3);
}

#[test]
fn test_psd_feasible() {
    // min x0  s.t.  x1 = 1, [x0 x1; x1 x0] ⪰ 0
    // stored as the scaled lower triangle (x0, √2 x1, x0)
    let rt2 = f64::sqrt(2.);
    let A = CscMatrix::from(&[
        [0., 1.],   //
        [-1., 0.],  //
        [0., -rt2], //
        [-1., 0.],  //
    ]);
    let b = vec![1., 0., 0., 0.];
    let c = vec![1., 0.];
    let data = problem_data(None, &A, &b, &c);
    let cone = Value::dict([("z", Value::Int(1)), ("s", Value::from(vec![2usize]))]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&[1., 1.]) <= 1e-3);
    assert!((out.info.pobj - 1.).abs() <= 1e-3);
}

#[test]
fn test_large_sparse_lp() {
    // min Σx  s.t.  x ≥ 1, with A = -I
    let n = 3000;
    let mut A = CscMatrix::<f64>::identity(n);
    A.nzval.iter_mut().for_each(|v| *v = -1.);
    let b = vec![-1.; n];
    let c = vec![1.; n];
    let data = problem_data(None, &A, &b, &c);
    let cone = Value::dict([("l", Value::Int(n as i64))]);
    let out = one_shot(&data, &cone, &tight_settings(vec![]));

    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.x.norm_inf_diff(&vec![1.; n]) <= 1e-4);
    assert!((out.info.pobj - n as f64).abs() <= 1e-2);
}
