use super::{errors::try_copy, float_vector, index_vector, Buffer, InterfaceError, Value};
use crate::algebra::CscMatrix;

/// Caller CSC data (`values`, `row_index`, `col_ptr`) viewed as a sparse
/// matrix without copying where the layout allows.
///
/// Construction checks the structure is safe to traverse: `col_ptr` has
/// length `n+1`, starts at zero, never decreases and ends at the number of
/// nonzeros, and every row index is below `m`.  Row ordering within a
/// column and duplicate entries are the caller's responsibility.
#[derive(Debug)]
pub struct SparseMatrixView<'a> {
    pub m: usize,
    pub n: usize,
    pub values: Buffer<'a, f64>,
    pub row_index: Buffer<'a, usize>,
    pub col_ptr: Buffer<'a, usize>,
}

fn dimension(name: &str, d: i64) -> Result<usize, InterfaceError> {
    usize::try_from(d).map_err(|_| InterfaceError::shape(name, format!("negative dimension {d}")))
}

impl<'a> SparseMatrixView<'a> {
    /// Build a view of the matrix named `prefix`, with arrays
    /// `{prefix}x`, `{prefix}i` and `{prefix}p`.
    pub fn new(
        prefix: &str,
        m: i64,
        n: i64,
        values: &'a Value<'_>,
        row_index: &'a Value<'_>,
        col_ptr: &'a Value<'_>,
    ) -> Result<Self, InterfaceError> {
        let (xname, iname, pname) = (
            format!("{prefix}x"),
            format!("{prefix}i"),
            format!("{prefix}p"),
        );
        let m = dimension(prefix, m)?;
        let n = dimension(prefix, n)?;

        let values = float_vector(values, &xname)?;
        let row_index = index_vector(row_index, &iname)?;
        let col_ptr = index_vector(col_ptr, &pname)?;

        if col_ptr.len() != n + 1 {
            return Err(InterfaceError::shape(
                pname,
                format!("expected length {} (n+1), found {}", n + 1, col_ptr.len()),
            ));
        }
        if col_ptr[0] != 0 {
            return Err(InterfaceError::shape(pname, "first column pointer must be 0"));
        }
        if let Some(j) = col_ptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(InterfaceError::shape(
                pname,
                format!("column pointers decrease at column {j}"),
            ));
        }
        if row_index.len() != values.len() {
            return Err(InterfaceError::shape(
                iname,
                format!(
                    "{} row indices for {} values",
                    row_index.len(),
                    values.len()
                ),
            ));
        }
        if col_ptr[n] != values.len() {
            return Err(InterfaceError::shape(
                pname,
                format!(
                    "last column pointer is {} but there are {} values",
                    col_ptr[n],
                    values.len()
                ),
            ));
        }
        if let Some(&r) = row_index.iter().find(|&&r| r >= m) {
            return Err(InterfaceError::shape(
                iname,
                format!("row index {r} out of bounds for {m} rows"),
            ));
        }

        Ok(SparseMatrixView {
            m,
            n,
            values,
            row_index,
            col_ptr,
        })
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    /// Copy into solver owned storage.
    pub fn to_csc(&self) -> Result<CscMatrix<f64>, InterfaceError> {
        Ok(CscMatrix::new(
            self.m,
            self.n,
            try_copy(&self.col_ptr)?,
            try_copy(&self.row_index)?,
            try_copy(&self.values)?,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::marshal::Ownership;

    #[test]
    fn test_view_aliases_and_shape() {
        // [1 . 3]
        // [2 4 .]
        let x = vec![1., 2., 4., 3.];
        let i = vec![0usize, 1, 1, 0];
        let p = vec![0usize, 2, 3, 4];
        let (vx, vi, vp) = (Value::from(&x[..]), Value::from(&i[..]), Value::from(&p[..]));

        let view = SparseMatrixView::new("A", 2, 3, &vx, &vi, &vp).unwrap();
        assert_eq!(view.shape(), (2, 3));
        assert_eq!(view.nnz(), x.len());
        assert_eq!(view.values.ownership(), Ownership::Borrowed);
        assert_eq!(view.row_index.ownership(), Ownership::Borrowed);

        let csc = view.to_csc().unwrap();
        assert_eq!(csc.size(), (2, 3));
        assert_eq!(csc.nnz(), 4);
        assert!(csc.check_format().is_ok());
    }

    #[test]
    fn test_view_converts_signed_indices() {
        let vx = Value::from(vec![1.0]);
        let vi = Value::from(crate::marshal::Array::from(vec![0i32]));
        let vp = Value::List(vec![0.into(), 1.into()]);
        let view = SparseMatrixView::new("P", 1, 1, &vx, &vi, &vp).unwrap();
        assert_eq!(view.row_index.ownership(), Ownership::Owned);
        assert_eq!(view.col_ptr.ownership(), Ownership::Owned);
    }

    #[test]
    fn test_view_structural_errors() {
        let vx = Value::from(vec![1., 2.]);
        let vi = Value::from(vec![0usize, 1]);

        let short_p = Value::from(vec![0usize, 2]);
        let err = SparseMatrixView::new("A", 2, 2, &vx, &vi, &short_p).unwrap_err();
        assert_eq!(err.field_name(), Some("Ap"));

        let decreasing = Value::from(vec![0usize, 2, 1]);
        let err = SparseMatrixView::new("A", 2, 2, &vx, &vi, &decreasing).unwrap_err();
        assert_eq!(err.field_name(), Some("Ap"));

        let p = Value::from(vec![0usize, 1, 2]);
        let err = SparseMatrixView::new("A", 1, 2, &vx, &vi, &p).unwrap_err();
        assert_eq!(err.field_name(), Some("Ai"));

        let err = SparseMatrixView::new("A", -1, 2, &vx, &vi, &p).unwrap_err();
        assert!(matches!(err, InterfaceError::Shape { .. }));

        let int_vals = Value::from(vec![1usize, 2]);
        let err = SparseMatrixView::new("A", 2, 2, &int_vals, &vi, &p).unwrap_err();
        assert!(matches!(err, InterfaceError::Type { .. }));
        assert_eq!(err.field_name(), Some("Ax"));
    }

    #[test]
    fn test_view_unsorted_rows_accepted() {
        let vx = Value::from(vec![1., 2.]);
        let vi = Value::from(vec![1usize, 0]);
        let vp = Value::from(vec![0usize, 2]);
        assert!(SparseMatrixView::new("A", 2, 1, &vx, &vi, &vp).is_ok());
    }
}
