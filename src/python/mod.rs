//! splitcone Python interface.
//!
//! This module implements a Python extension using
//! [PyO3](https://pyo3.rs/).   To build it from `cargo`, compile the crate
//! with `--features python`.   This module has no public API.
//!
//! Python objects are converted into [`Value`](crate::marshal::Value)s,
//! numpy arrays by their `dtype.kind` and shape.  A dict of Python
//! callables passed as `linsys_cbs` is registered as a reentrant
//! [`CallbackBackend`](crate::solver::CallbackBackend), and the GIL is
//! released for every native phase of a solve.

pub(crate) mod io;
mod linsys_py;
mod module_py;
mod value_py;
mod workspace_py;

pub(crate) use workspace_py::*;
