// Writers that route solver output through Python's sys.stdout and
// sys.stderr, so that notebooks and redirected streams capture it

use pyo3::ffi::{PyObject_CallMethod, PySys_GetObject, PySys_WriteStderr, PySys_WriteStdout};
use pyo3::Python;
use std::ffi::CString;
use std::os::raw::c_char;

// PySys_Write* truncates its formatted output, so long writes are
// passed through in pieces
const MAX_CHUNK: usize = 900;

macro_rules! make_python_stdio {
    ($name:ident, $pyfunc:ident, $modname:literal) => {
        pub(crate) struct $name {}
        impl std::io::Write for $name {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                // the solve loop may run with the GIL released
                Python::with_gil(|_py| {
                    for chunk in buf.chunks(MAX_CHUNK) {
                        let text = String::from_utf8_lossy(chunk).replace('\0', "");
                        let cstr = CString::new(text.replace('%', "%%"))
                            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                        unsafe {
                            $pyfunc(cstr.as_ptr() as *const c_char);
                        }
                    }
                    Ok(buf.len())
                })
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Python::with_gil(|_py| unsafe {
                    let stream = PySys_GetObject($modname.as_ptr() as *const c_char);
                    if !stream.is_null() {
                        let result = PyObject_CallMethod(
                            stream,
                            b"flush\0".as_ptr() as *const c_char,
                            std::ptr::null(),
                        );
                        if result.is_null() {
                            pyo3::ffi::PyErr_Clear();
                        } else {
                            pyo3::ffi::Py_DecRef(result);
                        }
                    }
                });
                Ok(())
            }
        }
    };
}
make_python_stdio!(PythonStdout, PySys_WriteStdout, b"stdout\0");
make_python_stdio!(PythonStderr, PySys_WriteStderr, b"stderr\0");

pub(crate) type Stdout = PythonStdout;

pub(crate) fn stdout() -> PythonStdout {
    PythonStdout {}
}

#[allow(dead_code)]
pub(crate) fn stderr() -> PythonStderr {
    PythonStderr {}
}
