#![allow(non_snake_case)]

use crate::algebra::*;
use std::iter::zip;

impl<T: FloatT> MatrixVectorMultiply for CscMatrix<T> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_N(self, y, x, a, b);
    }
}

impl<T: FloatT> MatrixVectorMultiply for Adjoint<'_, CscMatrix<T>> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_axpby_T(self.src, y, x, a, b);
    }
}

impl<T: FloatT> SymMatrixVectorMultiply for Symmetric<'_, CscMatrix<T>> {
    type T = T;

    fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        _csc_symv(self.src, y, x, a, b);
    }
}

impl<T: FloatT> MatrixMath for CscMatrix<T> {
    type T = T;

    fn scale(&mut self, c: T) {
        self.nzval.scale(c);
    }

    fn col_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.col_norms_no_reset(norms);
    }

    fn col_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.colptr.len() - 1);

        for (i, v) in norms.iter_mut().enumerate() {
            *v = self.nzval[self.colptr[i]..self.colptr[i + 1]]
                .iter()
                .fold(*v, |m, &nzval| T::max(m, T::abs(nzval)));
        }
    }

    fn col_norms_sym_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.colptr.len() - 1);

        for i in 0..norms.len() {
            for j in self.colptr[i]..self.colptr[i + 1] {
                let tmp = T::abs(self.nzval[j]);
                let r = self.rowval[j];
                norms[i] = T::max(norms[i], tmp);
                norms[r] = T::max(norms[r], tmp);
            }
        }
    }

    fn row_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        for (row, val) in zip(&self.rowval, &self.nzval) {
            norms[*row] = T::max(norms[*row], T::abs(*val));
        }
    }

    fn lscale(&mut self, l: &[T]) {
        for (val, row) in zip(&mut self.nzval, &self.rowval) {
            *val *= l[*row];
        }
    }

    fn rscale(&mut self, r: &[T]) {
        for (col, &ri) in r.iter().enumerate().take(self.n) {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            self.nzval[first..last].scale(ri);
        }
    }

    fn lrscale(&mut self, l: &[T], r: &[T]) {
        assert_eq!(self.nzval.len(), self.colptr[self.n]);

        for (col, &ri) in r.iter().enumerate() {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            let vals = &mut self.nzval[first..last];
            let rows = &self.rowval[first..last];

            for (val, row) in zip(vals, rows) {
                *val *= l[*row] * ri;
            }
        }
    }
}

#[allow(non_snake_case)]
fn _csc_symv<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    y.scale(b);

    assert!(x.len() == A.n);
    assert!(y.len() == A.n);
    assert!(A.n == A.m);

    for (col, &xcol) in x.iter().enumerate() {
        let first = A.colptr[col];
        let last = A.colptr[col + 1];
        let rows = &A.rowval[first..last];
        let nzvals = &A.nzval[first..last];

        for (&row, &Aij) in zip(rows, nzvals) {
            y[row] += a * Aij * xcol;

            if row != col {
                //don't double up on the diagonal
                y[col] += a * Aij * x[row];
            }
        }
    }
}

// sparse matrix-vector multiply, no transpose
#[allow(non_snake_case)]
fn _csc_axpby_N<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    //first do the b*y part
    if b == T::zero() {
        y.fill(T::zero());
    } else if b != T::one() {
        y.scale(b);
    }

    // if a is zero, we're done
    if a == T::zero() {
        return;
    }

    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.m);

    //y += a*A*x
    for (j, xj) in x.iter().enumerate() {
        for i in A.colptr[j]..A.colptr[j + 1] {
            y[A.rowval[i]] += a * A.nzval[i] * *xj;
        }
    }
}

// sparse matrix-vector multiply, transposed
#[allow(non_snake_case)]
fn _csc_axpby_T<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    //first do the b*y part
    if b == T::zero() {
        y.fill(T::zero());
    } else if b != T::one() {
        y.scale(b);
    }

    // if a is zero, we're done
    if a == T::zero() {
        return;
    }

    assert_eq!(x.len(), A.m);
    assert_eq!(y.len(), A.n);

    //y += a*A'*x
    for (j, yj) in y.iter_mut().enumerate() {
        for k in A.colptr[j]..A.colptr[j + 1] {
            *yj += a * A.nzval[k] * x[A.rowval[k]];
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> CscMatrix<f64> {
        // A =
        //[1.0  ⋅   3.0]
        //[2.0 4.0   ⋅ ]
        CscMatrix::from(&[
            [1., 0., 3.], //
            [2., 4., 0.], //
        ])
    }

    #[test]
    fn test_gemv() {
        let A = test_matrix();
        let x = vec![1., 2., 3.];
        let mut y = vec![1., 1.];
        A.gemv(&mut y, &x, 2., -1.);
        assert_eq!(y, vec![2. * 10. - 1., 2. * 10. - 1.]);

        let mut z = vec![0.; 3];
        A.t().gemv(&mut z, &[1., -1.], 1., 0.);
        assert_eq!(z, vec![-1., -4., 3.]);
    }

    #[test]
    fn test_symv() {
        let P = CscMatrix::from(&[
            [4., 1.], //
            [0., 2.], //
        ]);
        let x = vec![1., 2.];
        let mut y = vec![0.; 2];
        P.sym().symv(&mut y, &x, 1., 0.);
        assert_eq!(y, vec![6., 5.]);
        assert_eq!(x.dot(&y), 16.);
    }

    #[test]
    fn test_norms_and_scaling() {
        let mut A = test_matrix();
        let mut cn = vec![0.; 3];
        let mut rn = vec![0.; 2];
        A.col_norms(&mut cn);
        A.row_norms(&mut rn);
        assert_eq!(cn, vec![2., 4., 3.]);
        assert_eq!(rn, vec![3., 4.]);

        A.lrscale(&[1., 0.5], &[2., 1., 1.]);
        assert_eq!(A.to_dense(), vec![2., 2., 0., 2., 3., 0.]);
    }
}
