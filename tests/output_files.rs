#![allow(non_snake_case)]

use splitcone::{algebra::*, marshal::*, solver::*};
use std::fs::File;

fn small_lp() -> (CscMatrix<f64>, Value<'static>, Value<'static>) {
    // min x0 + x1  s.t.  x >= 1
    let A = CscMatrix::from(&[
        [-1., 0.], //
        [0., -1.], //
    ]);
    let data = Value::dict([
        ("m", Value::Int(2)),
        ("n", Value::Int(2)),
        ("Ax", Value::from(A.nzval.clone())),
        ("Ai", Value::from(A.rowval.clone())),
        ("Ap", Value::from(A.colptr.clone())),
        ("b", Value::from(vec![-1., -1.])),
        ("c", Value::from(vec![1., 1.])),
    ]);
    let cone = Value::dict([("l", Value::Int(2))]);
    (A, data, cone)
}

fn settings_with(key: &str, path: &str) -> Value<'static> {
    Value::dict([
        ("verbose", Value::Bool(false)),
        (key, Value::from(path)),
    ])
}

#[cfg(feature = "serde")]
#[test]
fn test_write_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("problem.json");
    let path = path.to_str().unwrap();
    let (A, data, cone) = small_lp();

    let mut ws = Workspace::new();
    ws.init(&data, &cone, &settings_with("write_data_filename", path))
        .unwrap();

    let mut file = File::open(path).unwrap();
    let (dumped, settings) = read_problem_json(&mut file).unwrap();
    assert_eq!(dumped.A, A);
    assert_eq!(dumped.b, vec![-1., -1.]);
    assert_eq!(dumped.c, vec![1., 1.]);
    assert_eq!(dumped.cones.linear, 2);
    assert_eq!(settings.write_data_filename.as_deref(), Some(path));

    let out = ws.solve(false, None, None, None).unwrap();
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_log_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.csv");
    let path = path.to_str().unwrap();
    let (_, data, cone) = small_lp();

    let out = solve(
        &data,
        &cone,
        &settings_with("log_csv_filename", path),
        &Value::None,
        None,
        &NoLock,
    )
    .unwrap();
    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!(out.diagnostics.is_empty());

    let text = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "iter,res_pri,res_dual,gap,pobj,dobj,scale,time");
    assert_eq!(lines.len(), out.info.iter as usize + 2);
    assert!(lines[1].starts_with("0,"));
    assert!(lines.iter().skip(1).all(|l| l.split(',').count() == 8));
}

#[test]
fn test_unwritable_output_is_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("progress.csv");
    let path = path.to_str().unwrap();
    let (_, data, cone) = small_lp();

    let mut ws = Workspace::new();
    ws.init(&data, &cone, &settings_with("log_csv_filename", path))
        .unwrap();
    let out = ws.solve(false, None, None, None).unwrap();

    // the solve itself is unaffected
    assert_eq!(out.info.status, SolverStatus::Solved);
    assert!((out.info.pobj - 2.).abs() <= 1e-3);
    assert!(matches!(
        out.diagnostics.as_slice(),
        [Diagnostic::OutputFile { path: p, .. }] if p == path
    ));

    let json_path = dir.path().join("missing").join("problem.json");
    let json_path = json_path.to_str().unwrap();
    let mut ws = Workspace::new();
    ws.init(&data, &cone, &settings_with("write_data_filename", json_path))
        .unwrap();
    let out = ws.solve(false, None, None, None).unwrap();
    assert!(matches!(
        out.diagnostics.as_slice(),
        [Diagnostic::OutputFile { path: p, .. }] if p == json_path
    ));
}
