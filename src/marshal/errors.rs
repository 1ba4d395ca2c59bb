use crate::solver::{BackendError, SettingsError};
use thiserror::Error;

/// Lifecycle violations on a [`Workspace`](crate::solver::Workspace).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceStateError {
    #[error("workspace has not been initialized")]
    NotInitialized,
    #[error("workspace is already initialized")]
    AlreadyInitialized,
    #[error("workspace has been closed")]
    Closed,
}

/// A supplied warm start vector that could not be used.
///
/// This is never returned as a failure from a solve.  The affected
/// vector starts from zero and the error is reported as a
/// [`Diagnostic`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("warm start vector '{name}' ignored: {reason}")]
pub struct WarmStartError {
    pub name: &'static str,
    pub reason: String,
}

/// Errors raised at the boundary between caller data and the solver.
#[derive(Error, Debug)]
pub enum InterfaceError {
    /// wrong rank or dimension mismatch
    #[error("shape error in '{name}': {detail}")]
    Shape { name: String, detail: String },
    /// wrong element kind
    #[error("type error in '{name}': expected {expected}")]
    Type { name: String, expected: String },
    /// malformed cone field
    #[error("cone parse error in '{field}': {detail}")]
    ConeParse { field: String, detail: String },
    /// option out of range
    #[error(transparent)]
    SettingsRange(#[from] SettingsError),
    #[error(transparent)]
    WarmStart(#[from] WarmStartError),
    #[error(transparent)]
    WorkspaceState(#[from] WorkspaceStateError),
    /// a solver owned buffer could not be allocated
    #[error("failed to allocate a buffer of {0} elements")]
    Allocation(usize),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl InterfaceError {
    pub(crate) fn shape(name: impl Into<String>, detail: impl Into<String>) -> Self {
        InterfaceError::Shape {
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn type_err(name: impl Into<String>, expected: impl Into<String>) -> Self {
        InterfaceError::Type {
            name: name.into(),
            expected: expected.into(),
        }
    }

    pub(crate) fn cone(field: impl Into<String>, detail: impl Into<String>) -> Self {
        InterfaceError::ConeParse {
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// The field, option or vector name attached to the error, if any.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            InterfaceError::Shape { name, .. } => Some(name),
            InterfaceError::Type { name, .. } => Some(name),
            InterfaceError::ConeParse { field, .. } => Some(field),
            InterfaceError::SettingsRange(SettingsError::OutOfRange { name, .. }) => Some(name),
            InterfaceError::WarmStart(e) => Some(e.name),
            _ => None,
        }
    }
}

/// Non-fatal conditions found while marshaling or solving.
///
/// Each diagnostic is logged with `log::warn!` when it occurs and is also
/// returned with the solve output.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// the legacy cone field `f` was merged into `z`
    DeprecatedConeField {
        field: &'static str,
        merged_into: &'static str,
        value: usize,
    },
    WarmStart(WarmStartError),
    /// an optional output file could not be written
    OutputFile { path: String, message: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DeprecatedConeField {
                field,
                merged_into,
                value,
            } => write!(
                f,
                "cone field '{field}' is deprecated; {value} added to '{merged_into}'"
            ),
            Diagnostic::WarmStart(e) => write!(f, "{e}"),
            Diagnostic::OutputFile { path, message } => {
                write!(f, "could not write '{path}': {message}")
            }
        }
    }
}

impl Diagnostic {
    pub(crate) fn emit(self, sink: &mut Vec<Diagnostic>) {
        log::warn!("{}", self);
        sink.push(self);
    }
}

// solver owned allocations go through try_reserve so that an
// oversized request is reported rather than aborting the process

pub(crate) fn try_zeros(len: usize) -> Result<Vec<f64>, InterfaceError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| InterfaceError::Allocation(len))?;
    v.resize(len, 0.0);
    Ok(v)
}

pub(crate) fn try_copy<T: Copy>(src: &[T]) -> Result<Vec<T>, InterfaceError> {
    let mut v = Vec::new();
    v.try_reserve_exact(src.len())
        .map_err(|_| InterfaceError::Allocation(src.len()))?;
    v.extend_from_slice(src);
    Ok(v)
}

#[test]
fn test_error_field_names() {
    let e = InterfaceError::cone("box cone", "length mismatch");
    assert_eq!(e.field_name(), Some("box cone"));
    assert_eq!(
        e.to_string(),
        "cone parse error in 'box cone': length mismatch"
    );

    let e: InterfaceError = WorkspaceStateError::Closed.into();
    assert_eq!(e.field_name(), None);
    assert_eq!(e.to_string(), "workspace has been closed");
}

#[test]
fn test_try_zeros() {
    assert_eq!(try_zeros(3).unwrap(), vec![0.0; 3]);
    assert!(matches!(
        try_zeros(usize::MAX),
        Err(InterfaceError::Allocation(_))
    ));
}
