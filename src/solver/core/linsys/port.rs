use super::*;
use std::time::{Duration, Instant};

/// A registered backend together with its calling convention and solve
/// timer.
///
/// All calls from the solver core go through the port, which holds the
/// host lock around calls into a [`Reentrant`](CallMode::Reentrant)
/// backend and times every `solve`.
pub struct BackendPort {
    backend: Box<dyn LinearSystemBackend>,
    mode: CallMode,
    timer: LinSysTimer,
}

impl std::fmt::Debug for BackendPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendPort")
            .field("method", &self.backend.method())
            .field("mode", &self.mode)
            .field("timer", &self.timer)
            .finish()
    }
}

impl BackendPort {
    /// Register a backend.  The call mode is read once here.
    pub fn new(backend: Box<dyn LinearSystemBackend>) -> Self {
        let mode = backend.call_mode();
        Self {
            backend,
            mode,
            timer: LinSysTimer::new(),
        }
    }

    pub fn mode(&self) -> CallMode {
        self.mode
    }

    pub fn method(&self) -> String {
        self.backend.method()
    }

    /// Backend solve time accumulated since the previous report.
    pub fn take_timing_report(&mut self) -> Duration {
        self.timer.take_report()
    }

    fn call<R>(
        &mut self,
        op: &'static str,
        lock: &dyn SchedulerLock,
        f: impl FnOnce(&mut dyn LinearSystemBackend) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        match self.mode {
            CallMode::NativeSafe => f(self.backend.as_mut()),
            CallMode::Reentrant => {
                let backend = self.backend.as_mut();
                let mut f = Some(f);
                let mut out = None;
                lock.run_attached(&mut || {
                    if let Some(f) = f.take() {
                        out = Some(f(&mut *backend));
                    }
                });
                out.unwrap_or_else(|| {
                    Err(BackendError::failed(op, "the scheduler lock did not run the call"))
                })
            }
        }
    }

    pub fn init(&mut self, lock: &dyn SchedulerLock, data: &LinSysData<'_>) -> Result<(), BackendError> {
        self.call("init", lock, |b| b.init(data))
    }

    pub fn solve(
        &mut self,
        lock: &dyn SchedulerLock,
        rhs: &mut [f64],
        warm: Option<&[f64]>,
        iter: usize,
    ) -> Result<(), BackendError> {
        let start = Instant::now();
        let result = self.call("solve", lock, |b| b.solve(rhs, warm, iter));
        self.timer.accumulate(start.elapsed());
        result
    }

    pub fn apply_a(&mut self, lock: &dyn SchedulerLock, x: &[f64], y: &mut [f64]) -> Result<(), BackendError> {
        self.call("apply_a", lock, |b| b.apply_a(x, y))
    }

    pub fn apply_at(&mut self, lock: &dyn SchedulerLock, y: &[f64], x: &mut [f64]) -> Result<(), BackendError> {
        self.call("apply_at", lock, |b| b.apply_at(y, x))
    }

    pub fn normalize(
        &mut self,
        lock: &dyn SchedulerLock,
        boundaries: &[usize],
        scale: f64,
    ) -> Result<Option<Normalization>, BackendError> {
        self.call("normalize", lock, |b| b.normalize(boundaries, scale))
    }

    pub fn un_normalize(
        &mut self,
        lock: &dyn SchedulerLock,
        norm: &Normalization,
        scale: f64,
    ) -> Result<(), BackendError> {
        self.call("un_normalize", lock, |b| b.un_normalize(norm, scale))
    }

    pub fn update_scale(&mut self, lock: &dyn SchedulerLock, scale: f64) -> Result<bool, BackendError> {
        self.call("update_scale", lock, |b| b.update_scale(scale))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // counts attached calls
    #[derive(Default)]
    struct CountingLock {
        attached: AtomicUsize,
    }

    impl SchedulerLock for CountingLock {
        fn run_detached(&self, f: &mut (dyn FnMut() + Send)) {
            f()
        }
        fn run_attached(&self, f: &mut dyn FnMut()) {
            self.attached.fetch_add(1, Ordering::SeqCst);
            f()
        }
    }

    // a lock that refuses to run anything
    struct DeadLock;

    impl SchedulerLock for DeadLock {
        fn run_detached(&self, _f: &mut (dyn FnMut() + Send)) {}
        fn run_attached(&self, _f: &mut dyn FnMut()) {}
    }

    fn identity_backend(mode: CallMode) -> CallbackBackend {
        CallbackBackend::new(
            mode,
            |rhs, _warm, _iter| Ok(rhs.to_vec()),
            |x| Ok(x.to_vec()),
            |y| Ok(y.to_vec()),
        )
    }

    #[test]
    fn test_reentrant_calls_are_attached() {
        let A = CscMatrix::<f64>::identity(2);
        let data = LinSysData { A: &A, P: None, rho_x: 1e-6, scale: 0.1 };
        let lock = CountingLock::default();

        let mut port = BackendPort::new(Box::new(identity_backend(CallMode::Reentrant)));
        port.init(&lock, &data).unwrap();
        let mut rhs = vec![1., 2., 3., 4.];
        port.solve(&lock, &mut rhs, None, 0).unwrap();
        let mut y = vec![0.; 2];
        port.apply_a(&lock, &[1., 2.], &mut y).unwrap();
        assert_eq!(lock.attached.load(Ordering::SeqCst), 3);

        let mut port = BackendPort::new(Box::new(identity_backend(CallMode::NativeSafe)));
        let lock = CountingLock::default();
        port.init(&lock, &data).unwrap();
        port.solve(&lock, &mut rhs, None, 0).unwrap();
        assert_eq!(lock.attached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lock_that_never_runs_is_an_error() {
        let A = CscMatrix::<f64>::identity(1);
        let data = LinSysData { A: &A, P: None, rho_x: 1e-6, scale: 0.1 };
        let mut port = BackendPort::new(Box::new(identity_backend(CallMode::Reentrant)));
        assert!(matches!(
            port.init(&DeadLock, &data),
            Err(BackendError::Failed { op: "init", .. })
        ));
    }

    #[test]
    fn test_solve_time_is_reported_once() {
        let A = CscMatrix::<f64>::identity(1);
        let data = LinSysData { A: &A, P: None, rho_x: 1e-6, scale: 0.1 };
        let mut port = BackendPort::new(Box::new(identity_backend(CallMode::NativeSafe)));
        port.init(&NoLock, &data).unwrap();
        let mut rhs = vec![1., 1.];
        port.solve(&NoLock, &mut rhs, None, 0).unwrap();
        port.solve(&NoLock, &mut rhs, None, 1).unwrap();
        let _first = port.take_timing_report();
        assert_eq!(port.take_timing_report(), Duration::ZERO);
    }
}
