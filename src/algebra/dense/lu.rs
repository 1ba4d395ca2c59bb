#![allow(non_snake_case)]

use crate::algebra::{DenseFactorizationError, FloatT};

/// Solve the dense system `A x = b` by Gaussian elimination with partial
/// pivoting, overwriting `b` with `x`.  `A` is overwritten.
pub fn solve_in_place<T: FloatT>(
    A: &mut [T],
    n: usize,
    b: &mut [T],
) -> Result<(), DenseFactorizationError> {
    if A.len() != n * n || b.len() != n {
        return Err(DenseFactorizationError::IncompatibleDimension);
    }

    for col in 0..n {
        let mut piv = col;
        for row in (col + 1)..n {
            if A[col * n + row].abs() > A[col * n + piv].abs() {
                piv = row;
            }
        }
        let pval = A[col * n + piv];
        if pval == T::zero() || !pval.is_finite() {
            return Err(DenseFactorizationError::ZeroPivot(col));
        }
        if piv != col {
            for k in 0..n {
                A.swap(k * n + col, k * n + piv);
            }
            b.swap(col, piv);
        }

        for row in (col + 1)..n {
            let f = A[col * n + row] / pval;
            if f == T::zero() {
                continue;
            }
            for k in col..n {
                let v = A[k * n + col];
                A[k * n + row] -= f * v;
            }
            let bc = b[col];
            b[row] -= f * bc;
        }
    }

    for col in (0..n).rev() {
        let mut v = b[col];
        for k in (col + 1)..n {
            v -= A[k * n + col] * b[k];
        }
        b[col] = v / A[col * n + col];
    }
    Ok(())
}

#[test]
fn test_solve_in_place() {
    // A = [0 1; 2 1] needs a row swap
    let mut A: Vec<f64> = vec![0., 2., 1., 1.];
    let mut b: Vec<f64> = vec![1., 4.];
    solve_in_place(&mut A, 2, &mut b).unwrap();
    assert!((b[0] - 1.5).abs() < 1e-14);
    assert!((b[1] - 1.).abs() < 1e-14);
}

#[test]
fn test_solve_in_place_singular() {
    let mut A: Vec<f64> = vec![1., 2., 2., 4.];
    let mut b: Vec<f64> = vec![1., 1.];
    assert_eq!(
        solve_in_place(&mut A, 2, &mut b),
        Err(DenseFactorizationError::ZeroPivot(1))
    );
}
