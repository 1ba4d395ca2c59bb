use super::*;

type SolveFn = Box<dyn FnMut(&[f64], Option<&[f64]>, usize) -> Result<Vec<f64>, BackendError> + Send>;
type ApplyFn = Box<dyn FnMut(&[f64]) -> Result<Vec<f64>, BackendError> + Send>;
type InitFn = Box<dyn FnMut(&LinSysData<'_>) -> Result<(), BackendError> + Send>;
type NormalizeFn = Box<dyn FnMut(&[usize], f64) -> Result<Normalization, BackendError> + Send>;
type UnNormalizeFn = Box<dyn FnMut(&Normalization, f64) -> Result<(), BackendError> + Send>;

/// A backend assembled from closures, typically supplied by a host
/// language.
///
/// The closures return freshly allocated vectors, which are checked for
/// length before being copied into solver memory.  A mismatch is reported
/// as [`BackendError::Contract`].
pub struct CallbackBackend {
    mode: CallMode,
    method: String,
    dims: Option<(usize, usize)>,
    init_fn: Option<InitFn>,
    solve_fn: SolveFn,
    apply_a_fn: ApplyFn,
    apply_at_fn: ApplyFn,
    normalize_fn: Option<NormalizeFn>,
    un_normalize_fn: Option<UnNormalizeFn>,
}

impl CallbackBackend {
    pub fn new(
        mode: CallMode,
        solve: impl FnMut(&[f64], Option<&[f64]>, usize) -> Result<Vec<f64>, BackendError> + Send + 'static,
        apply_a: impl FnMut(&[f64]) -> Result<Vec<f64>, BackendError> + Send + 'static,
        apply_at: impl FnMut(&[f64]) -> Result<Vec<f64>, BackendError> + Send + 'static,
    ) -> Self {
        Self {
            mode,
            method: "callback".to_string(),
            dims: None,
            init_fn: None,
            solve_fn: Box::new(solve),
            apply_a_fn: Box::new(apply_a),
            apply_at_fn: Box::new(apply_at),
            normalize_fn: None,
            un_normalize_fn: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_init(
        mut self,
        init: impl FnMut(&LinSysData<'_>) -> Result<(), BackendError> + Send + 'static,
    ) -> Self {
        self.init_fn = Some(Box::new(init));
        self
    }

    pub fn with_normalize(
        mut self,
        normalize: impl FnMut(&[usize], f64) -> Result<Normalization, BackendError> + Send + 'static,
        un_normalize: impl FnMut(&Normalization, f64) -> Result<(), BackendError> + Send + 'static,
    ) -> Self {
        self.normalize_fn = Some(Box::new(normalize));
        self.un_normalize_fn = Some(Box::new(un_normalize));
        self
    }

    fn dims(&self, op: &'static str) -> Result<(usize, usize), BackendError> {
        self.dims
            .ok_or_else(|| BackendError::failed(op, "backend used before init"))
    }
}

fn check_len(op: &'static str, expected: usize, found: usize) -> Result<(), BackendError> {
    if expected != found {
        return Err(BackendError::Contract { op, expected, found });
    }
    Ok(())
}

impl LinearSystemBackend for CallbackBackend {
    fn call_mode(&self) -> CallMode {
        self.mode
    }

    fn method(&self) -> String {
        self.method.clone()
    }

    fn init(&mut self, data: &LinSysData<'_>) -> Result<(), BackendError> {
        if let Some(init) = self.init_fn.as_mut() {
            init(data)?;
        }
        self.dims = Some(data.A.size());
        Ok(())
    }

    fn solve(
        &mut self,
        rhs: &mut [f64],
        warm: Option<&[f64]>,
        iter: usize,
    ) -> Result<(), BackendError> {
        self.dims("solve")?;
        let out = (self.solve_fn)(rhs, warm, iter)?;
        check_len("solve", rhs.len(), out.len())?;
        rhs.copy_from_slice(&out);
        Ok(())
    }

    fn apply_a(&mut self, x: &[f64], y: &mut [f64]) -> Result<(), BackendError> {
        let (m, _) = self.dims("apply_a")?;
        let out = (self.apply_a_fn)(x)?;
        check_len("apply_a", m, out.len())?;
        y.copy_from_slice(&out);
        Ok(())
    }

    fn apply_at(&mut self, y: &[f64], x: &mut [f64]) -> Result<(), BackendError> {
        let (_, n) = self.dims("apply_at")?;
        let out = (self.apply_at_fn)(y)?;
        check_len("apply_at", n, out.len())?;
        x.copy_from_slice(&out);
        Ok(())
    }

    fn normalize(
        &mut self,
        boundaries: &[usize],
        scale: f64,
    ) -> Result<Option<Normalization>, BackendError> {
        let (m, n) = self.dims("normalize")?;
        let Some(normalize) = self.normalize_fn.as_mut() else {
            return Ok(None);
        };
        let norm = normalize(boundaries, scale)?;
        check_len("normalize", n, norm.d.len())?;
        check_len("normalize", m, norm.e.len())?;
        Ok(Some(norm))
    }

    fn un_normalize(&mut self, norm: &Normalization, scale: f64) -> Result<(), BackendError> {
        match self.un_normalize_fn.as_mut() {
            Some(un_normalize) => un_normalize(norm, scale),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_callback_length_contract() {
        let A = CscMatrix::<f64>::identity(2);
        let data = LinSysData { A: &A, P: None, rho_x: 1e-6, scale: 0.1 };

        let mut backend = CallbackBackend::new(
            CallMode::NativeSafe,
            |rhs, _, _| Ok(rhs[1..].to_vec()),
            |x| Ok(x.to_vec()),
            |_| Ok(vec![0.; 5]),
        );

        let mut rhs = vec![1.; 4];
        assert!(matches!(
            backend.solve(&mut rhs, None, 0),
            Err(BackendError::Failed { op: "solve", .. })
        ));

        backend.init(&data).unwrap();
        assert_eq!(
            backend.solve(&mut rhs, None, 0),
            Err(BackendError::Contract { op: "solve", expected: 4, found: 3 })
        );

        let mut y = vec![0.; 2];
        backend.apply_a(&[3., 4.], &mut y).unwrap();
        assert_eq!(y, vec![3., 4.]);

        let mut x = vec![0.; 2];
        assert_eq!(
            backend.apply_at(&[1., 1.], &mut x),
            Err(BackendError::Contract { op: "apply_at", expected: 2, found: 5 })
        );

        // no normalization closures
        assert_eq!(backend.normalize(&[2], 1.0), Ok(None));
    }

    #[test]
    fn test_callback_normalize_checks_lengths() {
        let A = CscMatrix::<f64>::identity(2);
        let data = LinSysData { A: &A, P: None, rho_x: 1e-6, scale: 0.1 };

        let mut backend = CallbackBackend::new(
            CallMode::NativeSafe,
            |rhs, _, _| Ok(rhs.to_vec()),
            |x| Ok(x.to_vec()),
            |y| Ok(y.to_vec()),
        )
        .with_normalize(
            |_, _| {
                Ok(Normalization {
                    d: vec![1.; 2],
                    e: vec![1.; 3],
                    mean_row_norm: 1.,
                    mean_col_norm: 1.,
                })
            },
            |_, _| Ok(()),
        );
        backend.init(&data).unwrap();
        assert_eq!(
            backend.normalize(&[2], 1.0),
            Err(BackendError::Contract { op: "normalize", expected: 2, found: 3 })
        );
    }
}
