use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned by sparse matrix assembly operations.
pub enum SparseFormatError {
    /// Matrix dimension fields and/or array lengths are incompatible
    #[error("Matrix dimension fields and/or array lengths are incompatible")]
    IncompatibleDimension,
    #[error("Row value exceeds the matrix row dimension")]
    /// Row value exceeds the matrix row dimension
    BadRowval,
    #[error("Bad column pointer values")]
    /// Matrix column pointer values are defective
    BadColptr,
}

/// Error type returned by the dense factorization routines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenseFactorizationError {
    #[error("Matrix dimension fields and/or array lengths are incompatible")]
    IncompatibleDimension,
    /// A zero (or non-finite) pivot was encountered at the given column
    #[error("Zero pivot encountered at column {0}")]
    ZeroPivot(usize),
    /// LAPACK eigendecomposition returned a nonzero info code
    #[error("Eigendecomposition failed with info {0}")]
    Eigen(i32),
}
