use super::*;
use crate::algebra::*;

const CG_BEST_TOL: f64 = 1e-12;
const CG_TOL_FACTOR: f64 = 0.1;
const CG_TOL_RATE: f64 = 1.5;

/// Indirect backend using preconditioned conjugate gradients.
///
/// The `y` block is eliminated, leaving the positive definite system
/// `(P + rho_x I + scale AᵀA) x = r_x + scale Aᵀ r_y`, after which
/// `y = scale (A x - r_y)`.  The CG tolerance tightens with the iteration
/// index.
#[derive(Debug)]
pub struct IndirectBackend {
    A: CscMatrix<f64>,
    P: CscMatrix<f64>,
    rho_x: f64,
    scale: f64,
    // Jacobi preconditioner, inverted
    precond: Vec<f64>,
    work: CgWork,
    total_cg_iters: usize,
    initialized: bool,
}

#[derive(Debug, Default)]
struct CgWork {
    b: Vec<f64>,
    x: Vec<f64>,
    r: Vec<f64>,
    z: Vec<f64>,
    p: Vec<f64>,
    Mp: Vec<f64>,
    tmp_m: Vec<f64>,
}

impl CgWork {
    fn resize(&mut self, n: usize, m: usize) {
        for v in [
            &mut self.b,
            &mut self.x,
            &mut self.r,
            &mut self.z,
            &mut self.p,
            &mut self.Mp,
        ] {
            v.resize(n, 0.0);
        }
        self.tmp_m.resize(m, 0.0);
    }
}

impl Default for IndirectBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IndirectBackend {
    pub fn new() -> Self {
        Self {
            A: CscMatrix::spalloc(0, 0, 0),
            P: CscMatrix::spalloc(0, 0, 0),
            rho_x: 0.0,
            scale: 1.0,
            precond: Vec::new(),
            work: CgWork::default(),
            total_cg_iters: 0,
            initialized: false,
        }
    }

    /// total CG iterations over all solves
    pub fn total_cg_iters(&self) -> usize {
        self.total_cg_iters
    }

    fn update_preconditioner(&mut self) {
        let n = self.A.n;
        self.precond.clear();
        self.precond.resize(n, self.rho_x);

        for col in 0..n {
            for k in self.P.colptr[col]..self.P.colptr[col + 1] {
                if self.P.rowval[k] == col {
                    self.precond[col] += self.P.nzval[k];
                }
            }
            let rng = self.A.colptr[col]..self.A.colptr[col + 1];
            self.precond[col] += self.scale * self.A.nzval[rng].sumsq();
        }
        self.precond.recip();
    }
}

// y = (P + rho_x I + scale AᵀA) x
fn reduced_operator(
    P: &CscMatrix<f64>,
    A: &CscMatrix<f64>,
    rho_x: f64,
    scale: f64,
    x: &[f64],
    y: &mut [f64],
    tmp_m: &mut [f64],
) {
    P.sym().symv(y, x, 1.0, 0.0);
    y.axpby(rho_x, x, 1.0);
    A.gemv(tmp_m, x, 1.0, 0.0);
    A.t().gemv(y, tmp_m, scale, 1.0);
}

impl LinearSystemBackend for IndirectBackend {
    fn method(&self) -> String {
        "sparse-cg".to_string()
    }

    fn init(&mut self, data: &LinSysData<'_>) -> Result<(), BackendError> {
        let (m, n) = data.A.size();
        self.A = data.A.clone();
        self.P = match data.P {
            Some(P) => P.clone(),
            None => CscMatrix::spalloc(n, n, 0),
        };
        self.rho_x = data.rho_x;
        self.scale = data.scale;
        self.work.resize(n, m);
        self.update_preconditioner();
        self.initialized = true;
        Ok(())
    }

    fn solve(
        &mut self,
        rhs: &mut [f64],
        warm: Option<&[f64]>,
        iter: usize,
    ) -> Result<(), BackendError> {
        if !self.initialized {
            return Err(BackendError::failed("solve", "backend used before init"));
        }
        let (m, n) = self.A.size();
        if rhs.len() != n + m {
            return Err(BackendError::failed("solve", "right hand side has the wrong length"));
        }

        let (P, A, rho_x, scale) = (&self.P, &self.A, self.rho_x, self.scale);
        let w = &mut self.work;
        let (rx, ry) = rhs.split_at_mut(n);

        // b = r_x + scale Aᵀ r_y
        w.b.copy_from(rx);
        A.t().gemv(&mut w.b, ry, scale, 1.0);

        match warm {
            Some(guess) if guess.len() == n + m => {
                w.x.copy_from(&guess[..n]);
            }
            _ => w.x.fill(0.0),
        }

        // r = b - M x
        reduced_operator(P, A, rho_x, scale, &w.x, &mut w.r, &mut w.tmp_m);
        w.r.axpby(1.0, &w.b, -1.0);

        let tol = f64::max(
            CG_BEST_TOL,
            CG_TOL_FACTOR * w.b.norm() / ((iter + 1) as f64).powf(CG_TOL_RATE),
        );
        let max_cg_iters = 10 * n.max(1);

        w.z.waxpby(1.0, &w.r, 0.0, &w.r);
        w.z.hadamard(&self.precond);
        w.p.copy_from(&w.z);
        let mut rz = w.r.dot(&w.z);

        let mut k = 0;
        while k < max_cg_iters && w.r.norm() > tol {
            reduced_operator(P, A, rho_x, scale, &w.p, &mut w.Mp, &mut w.tmp_m);
            let pMp = w.p.dot(&w.Mp);
            if pMp <= 0.0 || !pMp.is_finite() {
                return Err(BackendError::failed("solve", "conjugate gradient breakdown"));
            }
            let alpha = rz / pMp;
            w.x.axpby(alpha, &w.p, 1.0);
            w.r.axpby(-alpha, &w.Mp, 1.0);

            w.z.waxpby(1.0, &w.r, 0.0, &w.r);
            w.z.hadamard(&self.precond);
            let rz_next = w.r.dot(&w.z);
            let beta = rz_next / rz;
            rz = rz_next;
            w.p.axpby(1.0, &w.z, beta);
            k += 1;
        }
        self.total_cg_iters += k;

        // y = scale (A x - r_y)
        A.gemv(ry, &w.x, scale, -scale);
        rx.copy_from(&w.x);
        Ok(())
    }

    fn apply_a(&mut self, x: &[f64], y: &mut [f64]) -> Result<(), BackendError> {
        self.A.gemv(y, x, 1.0, 0.0);
        Ok(())
    }

    fn apply_at(&mut self, y: &[f64], x: &mut [f64]) -> Result<(), BackendError> {
        self.A.t().gemv(x, y, 1.0, 0.0);
        Ok(())
    }

    fn normalize(
        &mut self,
        boundaries: &[usize],
        scale: f64,
    ) -> Result<Option<Normalization>, BackendError> {
        let norm = ruiz_equilibrate(&mut self.P, &mut self.A, boundaries, scale);
        self.update_preconditioner();
        Ok(Some(norm))
    }

    fn un_normalize(&mut self, norm: &Normalization, scale: f64) -> Result<(), BackendError> {
        undo_equilibration(&mut self.P, &mut self.A, norm, scale);
        self.update_preconditioner();
        Ok(())
    }

    fn update_scale(&mut self, scale: f64) -> Result<bool, BackendError> {
        self.scale = scale;
        self.update_preconditioner();
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indirect_matches_direct() {
        let A = CscMatrix::from(&[
            [1., 2., 0.],  //
            [0., 1., -1.], //
            [3., 0., 1.],  //
            [0., 0., 2.],  //
        ]);
        let P = CscMatrix::from(&[
            [2., 1., 0.], //
            [0., 4., 0.], //
            [0., 0., 1.], //
        ]);
        let data = LinSysData { A: &A, P: Some(&P), rho_x: 1e-6, scale: 0.3 };

        let mut direct = DirectBackend::new();
        let mut indirect = IndirectBackend::new();
        direct.init(&data).unwrap();
        indirect.init(&data).unwrap();

        let rhs = vec![1., -1., 2., 0.5, 3., -2., 1.];
        let mut sol_d = rhs.clone();
        let mut sol_i = rhs.clone();
        direct.solve(&mut sol_d, None, 0).unwrap();
        // late iteration index gives the tightest tolerance
        indirect.solve(&mut sol_i, None, 1_000_000).unwrap();

        assert!(sol_d.norm_inf_diff(&sol_i) < 1e-8);
        assert!(indirect.total_cg_iters() > 0);
    }

    #[test]
    fn test_indirect_apply() {
        let A = CscMatrix::from(&[
            [1., 2.], //
            [0., 3.], //
        ]);
        let data = LinSysData { A: &A, P: None, rho_x: 1e-6, scale: 1.0 };
        let mut backend = IndirectBackend::new();
        backend.init(&data).unwrap();
        let mut y = vec![0.; 2];
        backend.apply_a(&[1., 1.], &mut y).unwrap();
        assert_eq!(y, vec![3., 3.]);
        let mut x = vec![0.; 2];
        backend.apply_at(&[1., 1.], &mut x).unwrap();
        assert_eq!(x, vec![1., 5.]);
    }
}
