// Conversion between Python objects and marshal::Value

use crate::marshal::{Array, ArrayData, Buffer, ElementKind, InterfaceError, Value};
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use pyo3::IntoPyObjectExt;
use std::collections::BTreeMap;

pub(crate) fn to_py_err(e: InterfaceError) -> PyErr {
    match e {
        InterfaceError::WorkspaceState(_) => PyRuntimeError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

/// Convert a Python object into an owned `Value`.
pub(crate) fn to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value<'static>> {
    if obj.is_none() {
        return Ok(Value::None);
    }
    // bool is a subclass of int
    if obj.is_instance_of::<PyBool>() {
        return Ok(Value::Bool(obj.extract()?));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Value::Int(obj.extract()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Value::Float(obj.extract()?));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Value::Str(obj.extract()?));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        return dict_to_value(dict);
    }
    if obj.hasattr("dtype")? && obj.hasattr("ndim")? {
        return array_to_value(obj);
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list.iter().map(|v| to_value(&v)).collect::<PyResult<Vec<_>>>().map(Value::List);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple.iter().map(|v| to_value(&v)).collect::<PyResult<Vec<_>>>().map(Value::List);
    }
    Err(PyTypeError::new_err(format!(
        "unsupported value of type '{}'",
        obj.get_type().name()?
    )))
}

pub(crate) fn dict_to_value(dict: &Bound<'_, PyDict>) -> PyResult<Value<'static>> {
    let mut out = BTreeMap::new();
    for (k, v) in dict.iter() {
        out.insert(k.extract::<String>()?, to_value(&v)?);
    }
    Ok(Value::Dict(out))
}

// numpy arrays and scalars, by dtype.kind
fn array_to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value<'static>> {
    let ndim: usize = obj.getattr("ndim")?.extract()?;
    if ndim == 0 {
        return to_value(&obj.call_method0("item")?);
    }
    let shape: Vec<usize> = obj.getattr("shape")?.extract()?;
    let dtype = obj.getattr("dtype")?;
    let kind: String = dtype.getattr("kind")?.extract()?;
    let itemsize: usize = dtype.getattr("itemsize")?.extract()?;
    let flat = obj.call_method1("ravel", ("C",))?.call_method0("tolist")?;

    let data = match (kind.as_str(), itemsize) {
        ("f", 4) => ArrayData::F32(Buffer::Owned(flat.extract()?)),
        ("f", _) => ArrayData::F64(Buffer::Owned(flat.extract()?)),
        ("i", 4) => ArrayData::I32(Buffer::Owned(flat.extract()?)),
        ("i", _) => ArrayData::I64(Buffer::Owned(flat.extract()?)),
        ("u", _) => ArrayData::Usize(Buffer::Owned(flat.extract()?)),
        ("b", _) => {
            let flags: Vec<bool> = flat.extract()?;
            ArrayData::I64(Buffer::Owned(flags.into_iter().map(i64::from).collect()))
        }
        _ => {
            return Err(PyTypeError::new_err(format!(
                "unsupported array element kind '{kind}'"
            )))
        }
    };
    Array::with_layout(data, shape, 1)
        .map(Value::Array)
        .map_err(to_py_err)
}

/// Convert a `Value` into a Python object.  Arrays become numpy arrays
/// when numpy is importable and lists otherwise.
pub(crate) fn to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    match value {
        Value::None => Ok(py.None()),
        Value::Bool(b) => b.into_py_any(py),
        Value::Int(i) => i.into_py_any(py),
        Value::Float(f) => f.into_py_any(py),
        Value::Str(s) => s.into_py_any(py),
        Value::List(items) => {
            let items = items
                .iter()
                .map(|v| to_py(py, v))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, items)?.into_py_any(py)
        }
        Value::Dict(map) => {
            let dict = PyDict::new(py);
            for (k, v) in map {
                dict.set_item(k, to_py(py, v)?)?;
            }
            dict.into_py_any(py)
        }
        Value::Array(a) => {
            let list = if a.kind().is_float() {
                PyList::new(py, a.as_f64("array").map_err(to_py_err)?.iter())?
            } else if a.kind() == ElementKind::Usize {
                PyList::new(py, a.as_index("array").map_err(to_py_err)?.iter())?
            } else {
                return Err(PyTypeError::new_err("unsupported array element kind"));
            };
            as_numpy(py, list)
        }
    }
}

/// A float vector as a numpy array, or a list without numpy.
pub(crate) fn vec_to_py(py: Python<'_>, v: &[f64]) -> PyResult<PyObject> {
    as_numpy(py, PyList::new(py, v)?)
}

fn as_numpy(py: Python<'_>, list: Bound<'_, PyList>) -> PyResult<PyObject> {
    match py.import("numpy") {
        Ok(np) => np.call_method1("asarray", (list,))?.into_py_any(py),
        Err(_) => list.into_py_any(py),
    }
}

/// Read a float vector from a numpy array or a sequence.
pub(crate) fn extract_vec(obj: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    if obj.hasattr("tolist")? {
        obj.call_method0("tolist")?.extract()
    } else {
        obj.extract()
    }
}
