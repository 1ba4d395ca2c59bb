#![allow(non_snake_case)]

use crate::algebra::{FloatT, SparseFormatError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::iter::zip;

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the 3 x 3 matrix
/// ```text
/// A = [1.  3.  5.]
///     [2.  0.  6.]
///     [0.  4.  7.]
/// ```
///
/// ```no_run
/// use splitcone::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    3,                                // m
///    3,                                // n
///    vec![0, 2, 4, 7],                 //colptr
///    vec![0, 1, 0, 2, 0, 1, 2],        //rowval
///    vec![1., 2., 3., 4., 5., 6., 7.], //nzval
///  );
///
/// // optional structural check
/// assert!(A.check_format().is_ok());
///
/// ```
///

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer.
    ///
    /// Ths field should have length `n+1`. The last entry corresponds
    /// to the the number of nonzeros and should agree with the lengths
    /// of the `rowval` and `nzval` fields.
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

/// Transposed view of a borrowed matrix
pub struct Adjoint<'a, M> {
    pub src: &'a M,
}

/// Symmetric view of a borrowed triu matrix
pub struct Symmetric<'a, M> {
    pub src: &'a M,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.   This constructor does __not__
    /// ensure that rows indices are all in bounds or that data is arranged
    /// such that entries within each column appear in order of increasing
    /// row index.   Use [`try_new`](CscMatrix::try_new) for a checked
    /// version.
    ///

    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// Checked `CscMatrix` constructor.  Fails if the structure would
    /// produce out of bounds accesses in any of the matrix kernels.
    pub fn try_new(
        m: usize,
        n: usize,
        colptr: Vec<usize>,
        rowval: Vec<usize>,
        nzval: Vec<T>,
    ) -> Result<Self, SparseFormatError> {
        let A = CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        };
        A.check_format()?;
        Ok(A)
    }

    /// allocate space for a sparse matrix with `nnz` elements
    ///
    /// To make an m x n matrix of zeros, use
    /// ```no_run
    /// use splitcone::algebra::CscMatrix;
    /// let m = 3;
    /// let n = 4;
    /// let A : CscMatrix<f64> = CscMatrix::spalloc(m,n,0);
    /// ```

    pub fn spalloc(m: usize, n: usize, nnz: usize) -> Self {
        let mut colptr = vec![0; n + 1];
        let rowval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        colptr[n] = nnz;

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let colptr = (0usize..=n).collect();
        let rowval = (0usize..n).collect();
        let nzval = vec![T::one(); n];

        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// matrix dimensions as an (m,n) tuple
    pub fn size(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    /// transpose
    pub fn t(&self) -> Adjoint<'_, Self> {
        Adjoint { src: self }
    }

    /// symmetric view
    pub fn sym(&self) -> Symmetric<'_, Self> {
        debug_assert!(self.is_triu());
        Symmetric { src: self }
    }

    /// Check that the matrix structure is internally consistent.
    ///
    /// Verifies array lengths, column pointer monotonicity and row index
    /// bounds.  Row ordering within columns and duplicate entries are
    /// __not__ checked.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.colptr.is_empty()
            || (self.colptr.len() - 1) != self.n
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for colptr monotonicity
        if self.colptr[0] != 0 || self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }

        //check for row values out of bounds
        if !self.rowval.iter().all(|r| r < &self.m) {
            return Err(SparseFormatError::BadRowval);
        }

        Ok(())
    }

    /// Allocates a new matrix containing only entries from the upper
    /// triangular part.  Does not assume any row ordering within columns.
    pub fn to_triu(&self) -> Self {
        assert_eq!(self.m, self.n);
        let n = self.n;
        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();

        colptr.push(0);
        for col in 0..n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            for (&row, &v) in zip(&self.rowval[rng.clone()], &self.nzval[rng]) {
                if row <= col {
                    rowval.push(row);
                    nzval.push(v);
                }
            }
            colptr.push(rowval.len());
        }
        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// True if the matrix is upper triangular
    pub fn is_triu(&self) -> bool {
        // check lower triangle for any structural entries, regardless
        // of the values that may be assigned to them
        (0..self.n).all(|col| {
            let rows = &self.rowval[self.colptr[col]..self.colptr[col + 1]];
            rows.iter().all(|&row| row <= col)
        })
    }

    /// Expand to a dense column-major array.  Duplicate entries are summed.
    pub fn to_dense(&self) -> Vec<T> {
        let mut out = vec![T::zero(); self.m * self.n];
        for col in 0..self.n {
            for k in self.colptr[col]..self.colptr[col + 1] {
                out[col * self.m + self.rowval[k]] += self.nzval[k];
            }
        }
        out
    }
}

impl<T, const M: usize, const N: usize> From<&[[T; N]; M]> for CscMatrix<T>
where
    T: FloatT,
{
    /// Build from a row-major array of dense rows, dropping zeros.
    fn from(rows: &[[T; N]; M]) -> CscMatrix<T> {
        let mut colptr = Vec::with_capacity(N + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for col in 0..N {
            for (row, r) in rows.iter().enumerate() {
                if r[col] != T::zero() {
                    rowval.push(row);
                    nzval.push(r[col]);
                }
            }
            colptr.push(rowval.len());
        }
        CscMatrix::new(M, N, colptr, rowval, nzval)
    }
}

#[test]
fn test_csc_from_dense_rows() {
    // A =
    //[1.0  ⋅   3.0]
    //[2.0 4.0   ⋅ ]
    let A = CscMatrix::from(&[
        [1., 0., 3.], //
        [2., 4., 0.], //
    ]);
    assert_eq!(A.size(), (2, 3));
    assert_eq!(A.colptr, vec![0, 2, 3, 4]);
    assert_eq!(A.rowval, vec![0, 1, 1, 0]);
    assert_eq!(A.nzval, vec![1., 2., 4., 3.]);
    assert!(A.check_format().is_ok());
}

#[test]
fn test_csc_check_format() {
    let bad_rows = CscMatrix::<f64>::try_new(2, 1, vec![0, 1], vec![2], vec![1.]);
    assert_eq!(bad_rows.unwrap_err(), SparseFormatError::BadRowval);

    let bad_colptr = CscMatrix::<f64>::try_new(2, 2, vec![0, 2, 1], vec![0], vec![1.]);
    assert_eq!(bad_colptr.unwrap_err(), SparseFormatError::BadColptr);

    let bad_len = CscMatrix::<f64>::try_new(2, 1, vec![0, 2], vec![0], vec![1.]);
    assert_eq!(bad_len.unwrap_err(), SparseFormatError::IncompatibleDimension);

    // unsorted rows are tolerated
    let unsorted = CscMatrix::<f64>::try_new(3, 1, vec![0, 2], vec![2, 0], vec![1., 2.]);
    assert!(unsorted.is_ok());
}

#[test]
fn test_csc_to_triu() {
    let A = CscMatrix::from(&[
        [4., 1., 0.], //
        [1., 5., 2.], //
        [0., 2., 6.], //
    ]);
    assert!(!A.is_triu());
    let U = A.to_triu();
    assert!(U.is_triu());
    assert_eq!(U.nnz(), 5);
    assert_eq!(U.to_dense(), vec![4., 0., 0., 1., 5., 0., 0., 2., 6.]);
}
