// Python callables as a linear system backend

use super::value_py::{extract_vec, vec_to_py};
use crate::solver::{BackendError, CallMode, CallbackBackend, Normalization, SchedulerLock};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

/// The GIL as a scheduler lock.  Native phases run with the GIL
/// released and every callback into Python reacquires it.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct GilLock;

impl SchedulerLock for GilLock {
    fn run_detached(&self, f: &mut (dyn FnMut() + Send)) {
        Python::with_gil(|py| py.allow_threads(|| f()))
    }

    fn run_attached(&self, f: &mut dyn FnMut()) {
        Python::with_gil(|_py| f())
    }
}

fn required(cbs: &Bound<'_, PyDict>, key: &str) -> PyResult<PyObject> {
    match cbs.get_item(key)? {
        Some(f) if f.is_callable() => Ok(f.unbind()),
        Some(_) => Err(PyValueError::new_err(format!(
            "linsys_cbs entry '{key}' is not callable"
        ))),
        None => Err(PyValueError::new_err(format!(
            "linsys_cbs is missing '{key}'"
        ))),
    }
}

fn optional(cbs: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<PyObject>> {
    match cbs.get_item(key)? {
        Some(f) if f.is_none() => Ok(None),
        Some(_) => required(cbs, key).map(Some),
        None => Ok(None),
    }
}

fn failed(op: &'static str) -> impl Fn(PyErr) -> BackendError {
    move |e| BackendError::failed(op, e.to_string())
}

// a callable mapping one vector to another
fn apply_fn(
    op: &'static str,
    f: PyObject,
) -> impl FnMut(&[f64]) -> Result<Vec<f64>, BackendError> + Send + 'static {
    move |v: &[f64]| {
        Python::with_gil(|py| {
            let arg = vec_to_py(py, v)?;
            let out = f.call1(py, (arg,))?;
            extract_vec(out.bind(py))
        })
        .map_err(failed(op))
    }
}

/// Build a reentrant backend from a dict of Python callables:
///
/// * `solve_lin_sys(rhs, warm, iter) -> solution`
/// * `accum_by_a(x) -> A x`
/// * `accum_by_atrans(y) -> Aᵀ y`
/// * optionally `normalize_a(boundaries, scale) -> (d, e, mean_row_norm, mean_col_norm)`
///   together with `un_normalize_a(d, e, scale)`
pub(crate) fn callback_backend(cbs: &Bound<'_, PyDict>) -> PyResult<CallbackBackend> {
    let solve = required(cbs, "solve_lin_sys")?;
    let apply_a = required(cbs, "accum_by_a")?;
    let apply_at = required(cbs, "accum_by_atrans")?;
    let normalize = optional(cbs, "normalize_a")?;
    let un_normalize = optional(cbs, "un_normalize_a")?;

    let solve_fn = move |rhs: &[f64], warm: Option<&[f64]>, iter: usize| {
        Python::with_gil(|py| {
            let rhs = vec_to_py(py, rhs)?;
            let warm = match warm {
                Some(w) => vec_to_py(py, w)?,
                None => py.None(),
            };
            let out = solve.call1(py, (rhs, warm, iter))?;
            extract_vec(out.bind(py))
        })
        .map_err(failed("solve"))
    };

    let mut backend = CallbackBackend::new(
        CallMode::Reentrant,
        solve_fn,
        apply_fn("apply_a", apply_a),
        apply_fn("apply_at", apply_at),
    )
    .with_method("python callbacks");

    match (normalize, un_normalize) {
        (Some(normalize), Some(un_normalize)) => {
            let normalize_fn = move |boundaries: &[usize], scale: f64| {
                Python::with_gil(|py| {
                    let boundaries = PyList::new(py, boundaries)?;
                    let out = normalize.call1(py, (boundaries, scale))?;
                    let (d, e, mean_row_norm, mean_col_norm): (Bound<PyAny>, Bound<PyAny>, f64, f64) =
                        out.bind(py).extract()?;
                    Ok(Normalization {
                        d: extract_vec(&d)?,
                        e: extract_vec(&e)?,
                        mean_row_norm,
                        mean_col_norm,
                    })
                })
                .map_err(failed("normalize"))
            };
            let un_normalize_fn = move |norm: &Normalization, scale: f64| {
                Python::with_gil(|py| {
                    let d = vec_to_py(py, &norm.d)?;
                    let e = vec_to_py(py, &norm.e)?;
                    un_normalize.call1(py, (d, e, scale)).map(drop)
                })
                .map_err(failed("un_normalize"))
            };
            backend = backend.with_normalize(normalize_fn, un_normalize_fn);
        }
        (None, None) => {}
        _ => {
            return Err(PyValueError::new_err(
                "linsys_cbs must supply both 'normalize_a' and 'un_normalize_a' or neither",
            ))
        }
    }
    Ok(backend)
}
