use super::linsys_py::{callback_backend, GilLock};
use super::value_py::{dict_to_value, to_py, to_py_err, to_value};
use crate::marshal::{ResultMarshaler, Value};
use crate::solver::{LinearSystemBackend, Workspace};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::sync::{Mutex, PoisonError};

fn settings_value(settings: Option<&Bound<'_, PyDict>>) -> PyResult<Value<'static>> {
    settings.map_or(Ok(Value::None), dict_to_value)
}

fn backend_from(
    linsys_cbs: Option<&Bound<'_, PyDict>>,
) -> PyResult<Option<Box<dyn LinearSystemBackend>>> {
    linsys_cbs
        .map(|cbs| callback_backend(cbs).map(|b| Box::new(b) as Box<dyn LinearSystemBackend>))
        .transpose()
}

fn optional_value(obj: Option<&Bound<'_, PyAny>>) -> PyResult<Option<Value<'static>>> {
    obj.map(to_value).transpose()
}

#[pyclass(name = "Workspace", module = "splitcone")]
pub(crate) struct PyWorkspace {
    // backends are Send but not Sync
    inner: Mutex<Workspace>,
}

impl PyWorkspace {
    fn workspace(&mut self) -> &mut Workspace {
        self.inner.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

#[pymethods]
impl PyWorkspace {
    #[new]
    #[pyo3(signature = (data, cone, linsys_cbs=None, **settings))]
    fn new(
        data: &Bound<'_, PyAny>,
        cone: &Bound<'_, PyAny>,
        linsys_cbs: Option<&Bound<'_, PyDict>>,
        settings: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Self> {
        let data = to_value(data)?;
        let cone = to_value(cone)?;
        let settings = settings_value(settings)?;

        let mut inner = Workspace::new().with_lock(GilLock);
        match backend_from(linsys_cbs)? {
            Some(backend) => inner.init_with_backend(&data, &cone, &settings, backend),
            None => inner.init(&data, &cone, &settings),
        }
        .map_err(to_py_err)?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    #[pyo3(signature = (warm_start=false, x=None, y=None, s=None))]
    fn solve(
        &mut self,
        py: Python<'_>,
        warm_start: bool,
        x: Option<&Bound<'_, PyAny>>,
        y: Option<&Bound<'_, PyAny>>,
        s: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<PyObject> {
        let (x, y, s) = (optional_value(x)?, optional_value(y)?, optional_value(s)?);
        let out = self
            .workspace()
            .solve(warm_start, x.as_ref(), y.as_ref(), s.as_ref())
            .map_err(to_py_err)?;
        to_py(py, &ResultMarshaler::export(out))
    }

    #[pyo3(signature = (b=None, c=None))]
    fn update(&mut self, b: Option<&Bound<'_, PyAny>>, c: Option<&Bound<'_, PyAny>>) -> PyResult<()> {
        let (b, c) = (optional_value(b)?, optional_value(c)?);
        self.workspace()
            .update(b.as_ref(), c.as_ref())
            .map_err(to_py_err)
    }

    fn close(&mut self) -> PyResult<()> {
        self.workspace().close().map_err(to_py_err)
    }

    fn __repr__(&mut self) -> String {
        format!("{:?}", self.workspace())
    }
}

#[pyfunction(name = "solve")]
#[pyo3(signature = (data, cone, warm=None, linsys_cbs=None, **settings))]
pub(crate) fn solve_py(
    py: Python<'_>,
    data: &Bound<'_, PyAny>,
    cone: &Bound<'_, PyAny>,
    warm: Option<&Bound<'_, PyAny>>,
    linsys_cbs: Option<&Bound<'_, PyDict>>,
    settings: Option<&Bound<'_, PyDict>>,
) -> PyResult<PyObject> {
    let data = to_value(data)?;
    let cone = to_value(cone)?;
    let settings = settings_value(settings)?;
    let warm = optional_value(warm)?.unwrap_or_default();
    let backend = backend_from(linsys_cbs)?;

    let out = crate::solver::solve(&data, &cone, &settings, &warm, backend, &GilLock)
        .map_err(to_py_err)?;
    to_py(py, &ResultMarshaler::export(out))
}
