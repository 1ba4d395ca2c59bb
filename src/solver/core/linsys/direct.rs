use super::kkt_assembly::*;
use super::*;
use crate::algebra::*;
use crate::qdldl::*;

/// Direct backend built on a sparse `LDLᵀ` factorization of the
/// quasi-definite system.
///
/// The KKT pattern and its fill reducing ordering are computed once at
/// initialization.  Normalization and scale updates rewrite the numeric
/// values in place and refactor.
#[derive(Debug)]
pub struct DirectBackend {
    A: CscMatrix<f64>,
    P: CscMatrix<f64>,
    rho_x: f64,
    scale: f64,
    kkt: Option<KktSystem>,
}

#[derive(Debug)]
struct KktSystem {
    K: CscMatrix<f64>,
    map: KktDataMap,
    ldl: LdlFactorization<f64>,
}

impl DirectBackend {
    pub fn new() -> Self {
        Self {
            A: CscMatrix::spalloc(0, 0, 0),
            P: CscMatrix::spalloc(0, 0, 0),
            rho_x: 0.0,
            scale: 1.0,
            kkt: None,
        }
    }

    /// nonzeros in the strictly lower triangular factor, or zero before
    /// initialization
    pub fn factor_nnz(&self) -> usize {
        self.kkt.as_ref().map_or(0, |kkt| kkt.ldl.nnz())
    }

    fn kkt_mut(&mut self, op: &'static str) -> Result<&mut KktSystem, BackendError> {
        self.kkt
            .as_mut()
            .ok_or_else(|| BackendError::failed(op, "backend used before init"))
    }

    // rewrite every KKT value from the current data and refactor
    fn refactor(&mut self, op: &'static str) -> Result<(), BackendError> {
        let (P, A, rho_x, scale) = (&self.P, &self.A, self.rho_x, self.scale);
        let kkt = self
            .kkt
            .as_mut()
            .ok_or_else(|| BackendError::failed(op, "backend used before init"))?;
        fill_kkt_values(&mut kkt.K, &kkt.map, P, A, rho_x, scale);
        kkt.ldl.set_values(&kkt.K.nzval);
        kkt.ldl
            .refactor()
            .map_err(|e| BackendError::failed(op, e.to_string()))
    }
}

impl Default for DirectBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSystemBackend for DirectBackend {
    fn method(&self) -> String {
        "sparse-ldl".to_string()
    }

    fn init(&mut self, data: &LinSysData<'_>) -> Result<(), BackendError> {
        let n = data.A.n;
        self.A = data.A.clone();
        self.P = match data.P {
            Some(P) => P.clone(),
            None => CscMatrix::spalloc(n, n, 0),
        };
        self.rho_x = data.rho_x;
        self.scale = data.scale;

        let (mut K, map) = assemble_kkt_pattern(&self.P, &self.A);
        fill_kkt_values(&mut K, &map, &self.P, &self.A, self.rho_x, self.scale);

        let (m, n) = self.A.size();
        let mut Dsigns = vec![1_i8; n + m];
        Dsigns[n..].fill(-1);
        let opts = LdlSettingsBuilder::default()
            .Dsigns(Dsigns)
            .build()
            .map_err(|e| BackendError::failed("init", e.to_string()))?;
        let ldl = LdlFactorization::new(&K, Some(opts))
            .map_err(|e| BackendError::failed("init", e.to_string()))?;

        self.kkt = Some(KktSystem { K, map, ldl });
        Ok(())
    }

    fn solve(
        &mut self,
        rhs: &mut [f64],
        _warm: Option<&[f64]>,
        _iter: usize,
    ) -> Result<(), BackendError> {
        let kkt = self.kkt_mut("solve")?;
        if rhs.len() != kkt.K.n {
            return Err(BackendError::failed("solve", "right hand side has the wrong length"));
        }
        kkt.ldl.solve(rhs);
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
        self.refactor("normalize")?;
        Ok(Some(norm))
    }

    fn un_normalize(&mut self, norm: &Normalization, scale: f64) -> Result<(), BackendError> {
        undo_equilibration(&mut self.P, &mut self.A, norm, scale);
        self.refactor("un_normalize")
    }

    fn update_scale(&mut self, scale: f64) -> Result<bool, BackendError> {
        self.scale = scale;
        let kkt = self.kkt_mut("update_scale")?;
        // only the lower right diagonal depends on the scale
        let vals = vec![-scale.recip(); kkt.map.diagD.len()];
        for (&d, &v) in kkt.map.diagD.iter().zip(&vals) {
            kkt.K.nzval[d] = v;
        }
        kkt.ldl.update_values(&kkt.map.diagD, &vals);
        kkt.ldl
            .refactor()
            .map_err(|e| BackendError::failed("update_scale", e.to_string()))?;
        Ok(true)
    }
}
