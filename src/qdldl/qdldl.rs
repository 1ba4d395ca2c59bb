#![allow(non_snake_case)]
use crate::algebra::*;
use derive_builder::Builder;
use std::cmp::{max, min};
use std::iter::zip;
use thiserror::Error;

/// Error codes returned by [`LdlFactorization`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LdlError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix has a zero column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Factorization produced a zero pivot at column {0}")]
    ZeroPivot(usize),
    #[error("Invalid permutation vector")]
    InvalidPermutation,
    #[error("Fill reducing ordering failed")]
    Ordering,
}

/// Options for [`LdlFactorization`]
#[derive(Builder, Debug, Clone)]
pub struct LdlSettings<T: FloatT> {
    /// multiplier on the default AMD dense row threshold
    #[builder(default = "1.0")]
    pub amd_dense_scale: f64,
    /// user supplied ordering.  AMD is used when absent.
    #[builder(default = "None", setter(strip_option))]
    pub perm: Option<Vec<usize>>,
    /// expected pivot signs, in the original ordering
    #[builder(default = "None", setter(strip_option))]
    pub Dsigns: Option<Vec<i8>>,
    #[builder(default = "true")]
    pub regularize_enable: bool,
    #[builder(default = "(1e-12).as_T()")]
    pub regularize_eps: T,
    #[builder(default = "(1e-7).as_T()")]
    pub regularize_delta: T,
}

impl<T> Default for LdlSettings<T>
where
    T: FloatT,
{
    fn default() -> Self {
        Self {
            amd_dense_scale: 1.0,
            perm: None,
            Dsigns: None,
            regularize_enable: true,
            regularize_eps: (1e-12).as_T(),
            regularize_delta: (1e-7).as_T(),
        }
    }
}

/// `LDLᵀ` factors of a symmetric quasi-definite matrix
#[derive(Debug)]
pub struct LdlFactorization<T = f64> {
    /// fill reducing permutation
    pub perm: Vec<usize>,
    /// strictly lower triangular factor
    pub L: CscMatrix<T>,
    pub D: Vec<T>,
    pub Dinv: Vec<T>,
    work: LdlWorkspace<T>,
}

#[derive(Debug)]
struct LdlWorkspace<T> {
    etree: Vec<usize>,
    Lnz: Vec<usize>,
    iwork: Vec<usize>,
    bwork: Vec<bool>,
    fwork: Vec<T>,

    positive_inertia: usize,
    regularize_count: usize,

    // permuted upper triangle that is actually factored
    triuA: CscMatrix<T>,
    // position of each input entry within triuA
    AtoPAPt: Vec<usize>,

    Dsigns: Vec<i8>,
    regularize_enable: bool,
    regularize_eps: T,
    regularize_delta: T,
}

impl<T> LdlFactorization<T>
where
    T: FloatT,
{
    /// Symbolic and numeric factorization of the upper triangular `A`.
    pub fn new(A: &CscMatrix<T>, opts: Option<LdlSettings<T>>) -> Result<Self, LdlError> {
        check_structure(A)?;
        let opts = opts.unwrap_or_default();
        let n = A.n;

        let (perm, iperm) = match opts.perm {
            Some(p) => {
                let ip = invperm(&p)?;
                (p, ip)
            }
            None => amd_ordering(A, opts.amd_dense_scale)?,
        };

        let (triuA, AtoPAPt) = permute_symmetric(A, &iperm);

        let mut Dsigns = vec![1_i8; n];
        if let Some(ds) = opts.Dsigns {
            if ds.len() != n {
                return Err(LdlError::IncompatibleDimension);
            }
            permute(&mut Dsigns, &ds, &perm);
        }

        let mut etree = vec![0; n];
        let mut Lnz = vec![0; n];
        let mut iwork = vec![0; 3 * n];
        elimination_tree(&triuA.colptr, &triuA.rowval, &mut iwork, &mut Lnz, &mut etree);

        let work = LdlWorkspace {
            etree,
            Lnz,
            iwork,
            bwork: vec![false; n],
            fwork: vec![T::zero(); n],
            positive_inertia: 0,
            regularize_count: 0,
            triuA,
            AtoPAPt,
            Dsigns,
            regularize_enable: opts.regularize_enable,
            regularize_eps: opts.regularize_eps,
            regularize_delta: opts.regularize_delta,
        };

        let sumLnz = work.Lnz.iter().sum();
        let mut ldl = Self {
            perm,
            L: CscMatrix::spalloc(n, n, sumLnz),
            D: vec![T::zero(); n],
            Dinv: vec![T::zero(); n],
            work,
        };
        ldl.refactor()?;
        Ok(ldl)
    }

    /// number of positive pivots in the most recent factorization
    pub fn positive_inertia(&self) -> usize {
        self.work.positive_inertia
    }

    /// number of pivots replaced by regularization
    pub fn regularize_count(&self) -> usize {
        self.work.regularize_count
    }

    /// nonzeros in the strictly lower triangular factor
    pub fn nnz(&self) -> usize {
        self.L.nnz()
    }

    /// Solve `Ax = b` in place.
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.D.len());

        let tmp = &mut self.work.fwork;
        permute(tmp, b, &self.perm);
        lsolve(&self.L.colptr, &self.L.rowval, &self.L.nzval, tmp);
        zip(tmp.iter_mut(), &self.Dinv).for_each(|(x, d)| *x *= *d);
        ltsolve(&self.L.colptr, &self.L.rowval, &self.L.nzval, tmp);
        ipermute(b, tmp, &self.perm);
    }

    /// Overwrite selected entries of the factored matrix.  `indices` refer
    /// to entry positions in the matrix originally passed to [`new`](Self::new).
    pub fn update_values(&mut self, indices: &[usize], values: &[T]) {
        let nzval = &mut self.work.triuA.nzval;
        let AtoPAPt = &self.work.AtoPAPt;
        for (&idx, &v) in zip(indices, values) {
            nzval[AtoPAPt[idx]] = v;
        }
    }

    /// Overwrite every entry of the factored matrix, in input order.
    pub fn set_values(&mut self, values: &[T]) {
        assert_eq!(values.len(), self.work.AtoPAPt.len());
        let nzval = &mut self.work.triuA.nzval;
        for (&dst, &v) in zip(&self.work.AtoPAPt, values) {
            nzval[dst] = v;
        }
    }

    /// Numeric refactorization with the current values.
    pub fn refactor(&mut self) -> Result<(), LdlError> {
        let work = &mut self.work;
        let A = &work.triuA;
        let reg = Regularizer {
            signs: &work.Dsigns,
            enable: work.regularize_enable,
            eps: work.regularize_eps,
            delta: work.regularize_delta,
        };
        let (pos, nreg) = factor_inner(
            A,
            &mut self.L,
            &mut self.D,
            &mut self.Dinv,
            &work.Lnz,
            &work.etree,
            &mut work.bwork,
            &mut work.iwork,
            &mut work.fwork,
            &reg,
        )?;
        work.positive_inertia = pos;
        work.regularize_count = nreg;
        Ok(())
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), LdlError> {
    if A.m != A.n || A.check_format().is_err() {
        return Err(LdlError::IncompatibleDimension);
    }
    if !A.is_triu() {
        return Err(LdlError::NotUpperTriangular);
    }
    // every column needs at least its diagonal
    if !A.colptr.windows(2).all(|c| c[0] < c[1]) {
        return Err(LdlError::EmptyColumn);
    }
    Ok(())
}

fn amd_ordering<T: FloatT>(
    A: &CscMatrix<T>,
    dense_scale: f64,
) -> Result<(Vec<usize>, Vec<usize>), LdlError> {
    let mut control = amd::Control::default();
    control.dense *= dense_scale;
    let (perm, iperm, _info) =
        amd::order(A.n, &A.colptr, &A.rowval, &control).map_err(|_| LdlError::Ordering)?;
    Ok((perm, iperm))
}

const UNKNOWN: usize = usize::MAX;

// elimination tree and column counts of L
fn elimination_tree(
    Ap: &[usize],
    Ai: &[usize],
    work: &mut [usize],
    Lnz: &mut [usize],
    etree: &mut [usize],
) {
    let n = Lnz.len();
    work.fill(0);
    Lnz.fill(0);
    etree.fill(UNKNOWN);

    for j in 0..n {
        work[j] = j;
        for &row in &Ai[Ap[j]..Ap[j + 1]] {
            let mut i = row;
            while work[i] != j {
                if etree[i] == UNKNOWN {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                work[i] = j;
                i = etree[i];
            }
        }
    }
}

struct Regularizer<'a, T> {
    signs: &'a [i8],
    enable: bool,
    eps: T,
    delta: T,
}

impl<T: FloatT> Regularizer<'_, T> {
    // returns true if the pivot was replaced
    fn apply(&self, d: &mut T, k: usize) -> bool {
        if !self.enable {
            return false;
        }
        let sign: T = if self.signs[k] < 0 { -T::one() } else { T::one() };
        if *d * sign < self.eps {
            *d = self.delta * sign;
            true
        } else {
            false
        }
    }
}

// Up-looking factorization.  Each row of L is found by a sparse
// triangular solve along the elimination tree.
#[allow(clippy::too_many_arguments)]
fn factor_inner<T: FloatT>(
    A: &CscMatrix<T>,
    L: &mut CscMatrix<T>,
    D: &mut [T],
    Dinv: &mut [T],
    Lnz: &[usize],
    etree: &[usize],
    y_markers: &mut [bool],
    iwork: &mut [usize],
    y_vals: &mut [T],
    reg: &Regularizer<'_, T>,
) -> Result<(usize, usize), LdlError> {
    let n = A.n;
    let (Ap, Ai, Ax) = (&A.colptr, &A.rowval, &A.nzval);
    let (y_idx, rest) = iwork.split_at_mut(n);
    let (elim_buffer, next_colspace) = rest.split_at_mut(n);

    let mut positive = 0;
    let mut nreg = 0;

    L.colptr[0] = 0;
    let mut acc = 0;
    for (p, &cnt) in zip(&mut L.colptr[1..], Lnz) {
        acc += cnt;
        *p = acc;
    }
    next_colspace.copy_from_slice(&L.colptr[..n]);

    y_markers.fill(false);
    y_vals.fill(T::zero());
    D.fill(T::zero());

    for k in 0..n {
        let mut nnz_y = 0;

        // nonzero pattern of row k of L
        for i in Ap[k]..Ap[k + 1] {
            let bidx = Ai[i];
            if bidx == k {
                D[k] = Ax[i];
                continue;
            }
            y_vals[bidx] = Ax[i];

            if !y_markers[bidx] {
                y_markers[bidx] = true;
                elim_buffer[0] = bidx;
                let mut nnz_e = 1;
                let mut next = etree[bidx];
                while next != UNKNOWN && next < k {
                    if y_markers[next] {
                        break;
                    }
                    y_markers[next] = true;
                    elim_buffer[nnz_e] = next;
                    nnz_e += 1;
                    next = etree[next];
                }
                while nnz_e != 0 {
                    nnz_e -= 1;
                    y_idx[nnz_y] = elim_buffer[nnz_e];
                    nnz_y += 1;
                }
            }
        }

        // numeric values of row k
        for i in (0..nnz_y).rev() {
            let cidx = y_idx[i];
            let tmp_idx = next_colspace[cidx];
            let y_cidx = y_vals[cidx];

            for j in L.colptr[cidx]..tmp_idx {
                y_vals[L.rowval[j]] -= L.nzval[j] * y_cidx;
            }

            L.nzval[tmp_idx] = y_cidx * Dinv[cidx];
            D[k] -= y_cidx * L.nzval[tmp_idx];
            L.rowval[tmp_idx] = k;
            next_colspace[cidx] += 1;

            y_vals[cidx] = T::zero();
            y_markers[cidx] = false;
        }

        if reg.apply(&mut D[k], k) {
            nreg += 1;
        }
        if D[k] == T::zero() || !D[k].is_finite() {
            return Err(LdlError::ZeroPivot(k));
        }
        if D[k] > T::zero() {
            positive += 1;
        }
        Dinv[k] = T::recip(D[k]);
    }

    Ok((positive, nreg))
}

// solves (L+I)x = b in place
fn lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        for (&row, &v) in zip(&Li[Lp[i]..Lp[i + 1]], &Lx[Lp[i]..Lp[i + 1]]) {
            x[row] -= v * xi;
        }
    }
}

// solves (L+I)ᵀx = b in place
fn ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let s = zip(&Li[Lp[i]..Lp[i + 1]], &Lx[Lp[i]..Lp[i + 1]])
            .fold(T::zero(), |s, (&row, &v)| s + v * x[row]);
        x[i] -= s;
    }
}

fn invperm(p: &[usize]) -> Result<Vec<usize>, LdlError> {
    let mut seen = vec![false; p.len()];
    let mut ip = vec![0; p.len()];
    for (i, &j) in p.iter().enumerate() {
        if j >= p.len() || seen[j] {
            return Err(LdlError::InvalidPermutation);
        }
        seen[j] = true;
        ip[j] = i;
    }
    Ok(ip)
}

fn permute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, x).for_each(|(&p, x)| *x = b[p]);
}

fn ipermute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    zip(p, b).for_each(|(&p, &b)| x[p] = b);
}

// Upper triangle of PAPᵀ from the upper triangle of A, together with
// the position of every input entry in the output.
fn permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.n;
    let nnz = A.nnz();
    let mut P = CscMatrix::<T>::spalloc(n, n, nnz);
    let mut AtoPAPt = vec![0; nnz];

    let mut counts = vec![0; n];
    for colA in 0..n {
        let colP = iperm[colA];
        for &rowA in &A.rowval[A.colptr[colA]..A.colptr[colA + 1]] {
            counts[max(iperm[rowA], colP)] += 1;
        }
    }

    P.colptr[0] = 0;
    let mut acc = 0;
    for (p, &c) in zip(&mut P.colptr[1..], &counts) {
        acc += c;
        *p = acc;
    }
    let mut next = P.colptr[..n].to_vec();

    for colA in 0..n {
        let colP = iperm[colA];
        for k in A.colptr[colA]..A.colptr[colA + 1] {
            let rowP = iperm[A.rowval[k]];
            let col = max(colP, rowP);
            let dst = next[col];
            P.rowval[dst] = min(colP, rowP);
            P.nzval[dst] = A.nzval[k];
            AtoPAPt[k] = dst;
            next[col] += 1;
        }
    }
    (P, AtoPAPt)
}
