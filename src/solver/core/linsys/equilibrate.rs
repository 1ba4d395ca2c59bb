use super::Normalization;
use crate::algebra::*;

// Ruiz equilibration of the matrix [P Aᵀ; A 0], used by the built-in
// backends to implement `normalize`.

const EQUILIBRATE_MAX_ITER: usize = 10;
const EQUILIBRATE_MIN_SCALING: f64 = 1e-4;
const EQUILIBRATE_MAX_SCALING: f64 = 1e4;

/// Equilibrate `P` (triu) and `A` in place, returning the scalings.
///
/// After the Ruiz passes the row scalings of every block past the first
/// entry of `boundaries` are replaced by their mean, so that each
/// non-separable cone is scaled uniformly.  `A` is finally multiplied by
/// `scale`.
pub fn ruiz_equilibrate(
    P: &mut CscMatrix<f64>,
    A: &mut CscMatrix<f64>,
    boundaries: &[usize],
    scale: f64,
) -> Normalization {
    let (m, n) = A.size();
    let mut d = vec![1.0; n];
    let mut e = vec![1.0; m];
    let mut dwork = vec![0.0; n];
    let mut ework = vec![0.0; m];

    for _ in 0..EQUILIBRATE_MAX_ITER {
        kkt_col_norms(P, A, &mut dwork, &mut ework);

        dwork.scalarop(limit_scaling);
        ework.scalarop(limit_scaling);
        dwork.rsqrt();
        ework.rsqrt();

        P.lrscale(&dwork, &dwork);
        A.lrscale(&ework, &dwork);
        d.hadamard(&dwork);
        e.hadamard(&ework);
    }

    // fix scalings in cones for which elementwise
    // scaling can't be applied
    if rectify_blocks(&mut ework, &e, boundaries) {
        A.lscale(&ework);
        e.hadamard(&ework);
    }

    if scale != 1.0 {
        A.scale(scale);
    }

    let (mean_row_norm, mean_col_norm) = mean_norms(A);
    Normalization {
        d,
        e,
        mean_row_norm,
        mean_col_norm,
    }
}

/// Reverse [`ruiz_equilibrate`] on `P` and `A`.
pub fn undo_equilibration(
    P: &mut CscMatrix<f64>,
    A: &mut CscMatrix<f64>,
    norm: &Normalization,
    scale: f64,
) {
    let mut dinv = norm.d.clone();
    let mut einv = norm.e.clone();
    dinv.recip();
    einv.recip();

    if scale != 1.0 {
        A.scale(scale.recip());
    }
    A.lrscale(&einv, &dinv);
    P.lrscale(&dinv, &dinv);
}

fn kkt_col_norms(P: &CscMatrix<f64>, A: &CscMatrix<f64>, norm_lhs: &mut [f64], norm_rhs: &mut [f64]) {
    norm_lhs.fill(0.0);
    P.col_norms_sym_no_reset(norm_lhs); // P is triu
    A.col_norms_no_reset(norm_lhs); // incrementally from P norms
    A.row_norms(norm_rhs); // same as column norms of A'
}

fn limit_scaling(s: f64) -> f64 {
    s.clip(
        EQUILIBRATE_MIN_SCALING,
        EQUILIBRATE_MAX_SCALING,
        1.0,
        EQUILIBRATE_MAX_SCALING,
    )
}

// replace the scaling within each non-separable block by the block mean.
// δ receives the correction factors.  Returns true if any block was touched.
fn rectify_blocks(δ: &mut [f64], e: &[f64], boundaries: &[usize]) -> bool {
    δ.fill(1.0);
    let mut changed = false;
    let mut start = boundaries.first().copied().unwrap_or(0);

    for &len in boundaries.iter().skip(1) {
        let stop = (start + len).min(e.len());
        if stop > start {
            let block = &e[start..stop];
            let mean = block.mean();
            for (δi, &ei) in δ[start..stop].iter_mut().zip(block) {
                *δi = mean / ei;
            }
            changed = true;
        }
        start = stop;
    }
    changed
}

fn mean_norms(A: &CscMatrix<f64>) -> (f64, f64) {
    let (m, n) = A.size();
    let mut rows = vec![0.0; m];
    let mut cols = vec![0.0; n];
    A.row_norms(&mut rows);
    A.col_norms(&mut cols);
    (rows.mean(), cols.mean())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ruiz_roundtrip_and_rectify() {
        let A0 = CscMatrix::from(&[
            [100., 0.],  //
            [0., 0.01],  //
            [1., 3.],    //
            [2., 0.5],   //
        ]);
        let P0 = CscMatrix::from(&[
            [4., 1.], //
            [0., 9.], //
        ]);
        let (mut A, mut P) = (A0.clone(), P0.clone());

        // one separable row pair, then a block of two rows
        let norm = ruiz_equilibrate(&mut P, &mut A, &[2, 2], 1.0);
        assert_eq!(norm.d.len(), 2);
        assert_eq!(norm.e.len(), 4);
        assert!((norm.e[2] - norm.e[3]).abs() < 1e-12);
        assert!(norm.d.iter().chain(norm.e.iter()).all(|&v| v > 0.));

        // scaled rows are better balanced than the originals
        let mut rows = vec![0.; 4];
        A.row_norms(&mut rows);
        assert!(rows.maximum() / rows.minimum() < 1e4);

        undo_equilibration(&mut P, &mut A, &norm, 1.0);
        for (a, b) in A.nzval.iter().zip(A0.nzval.iter()) {
            assert!((a - b).abs() < 1e-10 * b.abs().max(1.));
        }
        for (a, b) in P.nzval.iter().zip(P0.nzval.iter()) {
            assert!((a - b).abs() < 1e-10 * b.abs().max(1.));
        }
    }

    #[test]
    fn test_ruiz_applies_scale() {
        let mut A = CscMatrix::<f64>::identity(2);
        let mut P = CscMatrix::<f64>::spalloc(2, 2, 0);
        let norm = ruiz_equilibrate(&mut P, &mut A, &[2], 3.0);
        assert!((norm.mean_row_norm - 3.).abs() < 1e-12);
        undo_equilibration(&mut P, &mut A, &norm, 3.0);
        assert_eq!(A.nzval, vec![1., 1.]);
    }
}
