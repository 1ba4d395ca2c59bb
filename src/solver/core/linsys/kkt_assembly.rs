#![allow(non_snake_case)]

use crate::algebra::*;

// Positions of the problem data within the assembled KKT matrix.
#[derive(Debug, Clone)]
pub(crate) struct KktDataMap {
    // entry k of P, or None for entries below the diagonal
    pub P: Vec<Option<usize>>,
    // entry k of A
    pub A: Vec<usize>,
    // diagonal of the upper left block
    pub diagP: Vec<usize>,
    // diagonal of the lower right block
    pub diagD: Vec<usize>,
}

/// Upper triangle of
///
/// ```text
/// [ P + rho_x I      Aᵀ      ]
/// [      A       -(1/scale) I ]
/// ```
///
/// with every diagonal entry present and repeated entries of `P` or `A`
/// merged into a single position.  Values are filled separately by
/// [`fill_kkt_values`].
pub(crate) fn assemble_kkt_pattern(P: &CscMatrix<f64>, A: &CscMatrix<f64>) -> (CscMatrix<f64>, KktDataMap) {
    let (m, n) = A.size();
    let dim = m + n;

    // entries of A grouped by row, each row in column order
    let mut rowptr = vec![0; m + 1];
    for &r in &A.rowval {
        rowptr[r + 1] += 1;
    }
    for i in 0..m {
        rowptr[i + 1] += rowptr[i];
    }
    let mut next = rowptr.clone();
    // (entry index, column) pairs
    let mut byrow = vec![(0, 0); A.nnz()];
    for col in 0..n {
        for k in A.colptr[col]..A.colptr[col + 1] {
            let r = A.rowval[k];
            byrow[next[r]] = (k, col);
            next[r] += 1;
        }
    }

    let mut map = KktDataMap {
        P: vec![None; P.nnz()],
        A: vec![0; A.nnz()],
        diagP: vec![0; n],
        diagD: vec![0; m],
    };

    let mut colptr = Vec::with_capacity(dim + 1);
    let mut rowval = Vec::with_capacity(P.nnz() + A.nnz() + dim);
    // column in which each row was last placed, and where
    let mut mark = vec![usize::MAX; dim];
    let mut slot = vec![0; dim];

    let mut place = |row: usize, col: usize, rowval: &mut Vec<usize>| -> usize {
        if mark[row] != col {
            mark[row] = col;
            slot[row] = rowval.len();
            rowval.push(row);
        }
        slot[row]
    };

    colptr.push(0);
    for col in 0..n {
        for k in P.colptr[col]..P.colptr[col + 1] {
            let row = P.rowval[k];
            if row <= col {
                map.P[k] = Some(place(row, col, &mut rowval));
            }
        }
        map.diagP[col] = place(col, col, &mut rowval);
        colptr.push(rowval.len());
    }
    for i in 0..m {
        let col = n + i;
        for &(k, row) in &byrow[rowptr[i]..rowptr[i + 1]] {
            map.A[k] = place(row, col, &mut rowval);
        }
        map.diagD[i] = place(col, col, &mut rowval);
        colptr.push(rowval.len());
    }

    let nnz = rowval.len();
    let K = CscMatrix::new(dim, dim, colptr, rowval, vec![0.0; nnz]);
    (K, map)
}

/// Write the current values of `P`, `A`, `rho_x` and `scale` into `K`.
pub(crate) fn fill_kkt_values(
    K: &mut CscMatrix<f64>,
    map: &KktDataMap,
    P: &CscMatrix<f64>,
    A: &CscMatrix<f64>,
    rho_x: f64,
    scale: f64,
) {
    let vals = &mut K.nzval;
    vals.fill(0.0);
    for (dst, &v) in map.P.iter().zip(&P.nzval) {
        if let Some(d) = *dst {
            vals[d] += v;
        }
    }
    for &d in &map.diagP {
        vals[d] += rho_x;
    }
    for (&d, &v) in map.A.iter().zip(&A.nzval) {
        vals[d] += v;
    }
    for &d in &map.diagD {
        vals[d] = -scale.recip();
    }
}
