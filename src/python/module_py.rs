use super::*;
use pyo3::prelude::*;

#[pyfunction(name = "version")]
fn version_py() -> &'static str {
    crate::version()
}

#[pyfunction(name = "sizeof_int")]
fn sizeof_int_py() -> usize {
    crate::sizeof_int()
}

#[pyfunction(name = "sizeof_float")]
fn sizeof_float_py() -> usize {
    crate::sizeof_float()
}

// Python module and registry
#[pymodule]
#[pyo3(name = "_splitcone")]
fn splitcone_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    //module version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    //introspection
    m.add_function(wrap_pyfunction!(version_py, m)?)?;
    m.add_function(wrap_pyfunction!(sizeof_int_py, m)?)?;
    m.add_function(wrap_pyfunction!(sizeof_float_py, m)?)?;

    //one-shot solve and the persistent workspace
    m.add_function(wrap_pyfunction!(solve_py, m)?)?;
    m.add_class::<PyWorkspace>()?;

    Ok(())
}
