#![allow(non_snake_case)]

use splitcone::{algebra::*, marshal::*, solver::*};

fn settings(items: &[(&str, Value<'static>)]) -> Value<'static> {
    Value::dict(items.iter().cloned())
}

#[test]
fn test_csc_view_reproduces_shape() {
    let A = CscMatrix::from(&[
        [1., 0., 3., 0.], //
        [2., 4., 0., 0.], //
        [0., 0., 5., 6.], //
    ]);
    let (x, i, p) = (
        Value::from(A.nzval.as_slice()),
        Value::from(A.rowval.as_slice()),
        Value::from(A.colptr.as_slice()),
    );
    let view = SparseMatrixView::new("A", 3, 4, &x, &i, &p).unwrap();
    assert_eq!(view.shape(), (3, 4));
    assert_eq!(view.nnz(), A.nzval.len());

    // contiguous caller data of the right type is aliased
    assert_eq!(view.values.ownership(), Ownership::Borrowed);
    assert_eq!(view.col_ptr.ownership(), Ownership::Borrowed);

    let B = view.to_csc().unwrap();
    assert_eq!(B, A);
}

#[test]
fn test_csc_view_converts_signed_indices() {
    let x = Value::from(vec![1.0, 2.0]);
    let i = Value::from(Array::from(vec![0i64, 1]));
    let p = Value::from(Array::from(vec![0i32, 1, 2]));
    let view = SparseMatrixView::new("A", 2, 2, &x, &i, &p).unwrap();
    assert_eq!(view.row_index.ownership(), Ownership::Owned);
    assert_eq!(&*view.col_ptr, &[0, 1, 2]);

    let bad = Value::from(Array::from(vec![0i64, -1]));
    let err = SparseMatrixView::new("A", 2, 2, &x, &bad, &p).unwrap_err();
    assert!(matches!(err, InterfaceError::Shape { .. }));
}

#[test]
fn test_cone_parse_is_idempotent() {
    let cone = Value::dict([
        ("z", Value::Int(2)),
        ("l", Value::Int(3)),
        ("q", Value::from(vec![3usize, 4])),
        ("s", Value::from(vec![2usize])),
        ("ep", Value::Int(1)),
        ("p", Value::from(vec![0.3, -0.5])),
        ("bl", Value::from(vec![0.0, -1.0])),
        ("bu", Value::from(vec![1.0, 1.0])),
    ]);
    let mut diags = vec![];
    let first = ConeSpec::parse(&cone, &mut diags).unwrap();
    let second = ConeSpec::parse(&cone, &mut diags).unwrap();

    assert_eq!(first.zero, second.zero);
    assert_eq!(first.linear, second.linear);
    assert_eq!(&*first.soc, &*second.soc);
    assert_eq!(&*first.psd, &*second.psd);
    assert_eq!(first.exp_primal, second.exp_primal);
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first.power), bits(&second.power));
    assert_eq!(bits(&first.box_lower), bits(&second.box_lower));
    assert_eq!(bits(&first.box_upper), bits(&second.box_upper));
    assert!(diags.is_empty());

    // 2 + 3 + box 3 + 7 + 3 + 3 + 2*3
    assert_eq!(first.total_dim(), 27);
}

#[test]
fn test_cone_legacy_free_field() {
    let mut diags = vec![];
    let both = Value::dict([("z", Value::Int(3)), ("f", Value::Int(2))]);
    assert_eq!(ConeSpec::parse(&both, &mut diags).unwrap().zero, 5);
    assert_eq!(diags.len(), 1);
    assert!(matches!(
        diags[0],
        Diagnostic::DeprecatedConeField { field: "f", merged_into: "z", value: 2 }
    ));

    let only_f = Value::dict([("f", Value::Int(2))]);
    assert_eq!(ConeSpec::parse(&only_f, &mut diags).unwrap().zero, 2);
}

#[test]
fn test_cone_box_dimension() {
    let mut diags = vec![];
    let cone = Value::dict([
        ("bl", Value::from(vec![0.0, 0.0])),
        ("bu", Value::from(vec![1.0, 1.0])),
    ]);
    assert_eq!(ConeSpec::parse(&cone, &mut diags).unwrap().box_dim(), 3);

    let unequal = Value::dict([
        ("bl", Value::from(vec![0.0, 0.0])),
        ("bu", Value::from(vec![1.0])),
    ]);
    let err = ConeSpec::parse(&unequal, &mut diags).unwrap_err();
    assert!(matches!(err, InterfaceError::ConeParse { .. }));
}

#[test]
fn test_cone_power_parameter_range() {
    let mut diags = vec![];
    for p in [0.0, 1.5, -2.0] {
        let cone = Value::dict([("p", Value::from(vec![p]))]);
        let err = ConeSpec::parse(&cone, &mut diags).unwrap_err();
        assert_eq!(err.field_name(), Some("p"));
    }
}

#[test]
fn test_settings_ranges() {
    let err = settings_from_value(&settings(&[("eps_abs", Value::Float(-1.0))])).unwrap_err();
    assert_eq!(err.field_name(), Some("eps_abs"));
    assert!(matches!(err, InterfaceError::SettingsRange(_)));

    let err = settings_from_value(&settings(&[("scale", Value::Float(0.0))])).unwrap_err();
    assert_eq!(err.field_name(), Some("scale"));

    // the quasi-definite system needs rho_x > 0; relaxation stays below 2
    for (key, v) in [("rho_x", 0.0), ("alpha", 2.0), ("alpha", 0.0)] {
        let err = settings_from_value(&settings(&[(key, Value::Float(v))])).unwrap_err();
        assert_eq!(err.field_name(), Some(key));
    }
    let s = settings_from_value(&settings(&[("alpha", Value::Float(1.99))])).unwrap();
    assert_eq!(s.alpha, 1.99);

    let s = settings_from_value(&settings(&[("acceleration_lookback", Value::Int(-5))])).unwrap();
    assert_eq!(s.acceleration_lookback, -5);

    // the first failure in declared order wins
    let err = settings_from_value(&settings(&[
        ("eps_abs", Value::Float(-1.0)),
        ("scale", Value::Float(-1.0)),
    ]))
    .unwrap_err();
    assert_eq!(err.field_name(), Some("scale"));

    let err = settings_from_value(&settings(&[("no_such_option", Value::Int(1))])).unwrap_err();
    assert!(matches!(err, InterfaceError::Type { .. }));

    assert_eq!(settings_from_value(&Value::None).unwrap(), Settings::default());
}

#[test]
fn test_wrong_length_warm_start_is_zeroed() {
    let mut diags = vec![];
    let warm = Value::dict([("x", Value::from(vec![1.0; 5]))]);
    let ws = WarmStartStore::load(&warm, 3, 2, &mut diags).unwrap();
    assert_eq!(ws.x, vec![0.0; 3]);
    assert_eq!(diags.len(), 1);
    assert!(matches!(&diags[0], Diagnostic::WarmStart(e) if e.name == "x"));
}

#[test]
fn test_cone_dimension_overflow_is_rejected() {
    let data = Value::dict([
        ("m", Value::Int(3)),
        ("n", Value::Int(1)),
        ("Ax", Value::from(vec![1.0, 1.0, 1.0])),
        ("Ai", Value::from(vec![0usize, 1, 2])),
        ("Ap", Value::from(vec![0usize, 3])),
        ("b", Value::from(vec![0.0; 3])),
        ("c", Value::from(vec![1.0])),
    ]);
    // 2 * i64::MAX + 5 wraps around to m = 3
    let big = Value::Int(i64::MAX);
    let cone = Value::dict([("q", Value::List(vec![big.clone(), big, Value::Int(5)]))]);

    let mut diags = vec![];
    let err = ProblemDescriptor::parse(&data, &cone, &mut diags).unwrap_err();
    assert!(matches!(err, InterfaceError::ConeParse { .. }));
    assert_eq!(err.field_name(), Some("cone"));
}
