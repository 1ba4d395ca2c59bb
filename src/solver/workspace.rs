use super::core::admm::AdmmEngine;
use super::core::linsys::*;
use super::info_print::print_configuration;
use super::{Info, ProblemData, Settings, Solution, SolveOutput};
use crate::io::{ConfigurablePrintTarget, PrintTarget};
use crate::marshal::*;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

/// A persistent solver instance.
///
/// A workspace parses and validates a problem once, keeps the initialized
/// linear system backend alive and reuses its solution buffers across
/// repeated calls to [`solve`](Workspace::solve) and
/// [`update`](Workspace::update).
///
/// ```no_run
/// use splitcone::marshal::Value;
/// use splitcone::solver::Workspace;
///
/// // min x  s.t.  x >= 1
/// let data = Value::dict([
///     ("m", Value::Int(1)),
///     ("n", Value::Int(1)),
///     ("Ax", Value::from(vec![-1.0])),
///     ("Ai", Value::from(vec![0usize])),
///     ("Ap", Value::from(vec![0usize, 1])),
///     ("b", Value::from(vec![-1.0])),
///     ("c", Value::from(vec![1.0])),
/// ]);
/// let cone = Value::dict([("l", Value::Int(1))]);
/// let settings = Value::dict([("verbose", Value::Bool(false))]);
///
/// let mut ws = Workspace::new();
/// ws.init(&data, &cone, &settings).unwrap();
/// let out = ws.solve(false, None, None, None).unwrap();
/// assert!((out.x[0] - 1.0).abs() < 1e-3);
/// ws.close().unwrap();
/// ```
pub struct Workspace {
    state: State,
    lock: Box<dyn SchedulerLock + Send>,
    printer: PrintTarget,
}

enum State {
    Uninitialized,
    Initialized(Box<Instance>),
    Closed,
}

// everything owned by an initialized workspace
struct Instance {
    data: ProblemData,
    settings: Settings,
    engine: AdmmEngine,
    solution: Solution,
    info: Info,
    // diagnostics raised during init, returned with the next solve
    pending: Vec<Diagnostic>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Uninitialized => "uninitialized",
            State::Initialized(_) => "initialized",
            State::Closed => "closed",
        };
        f.debug_struct("Workspace")
            .field("state", &state)
            .field("printer", &self.printer)
            .finish()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// An uninitialized workspace without a scheduler lock.
    pub fn new() -> Self {
        Self {
            state: State::Uninitialized,
            lock: Box::new(NoLock),
            printer: PrintTarget::default(),
        }
    }

    /// Use `lock` for the native and reentrant phases of every solve.
    pub fn with_lock(mut self, lock: impl SchedulerLock + Send + 'static) -> Self {
        self.lock = Box::new(lock);
        self
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Initialized(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Status and metrics of the most recent solve.
    pub fn info(&self) -> Result<&Info, InterfaceError> {
        match &self.state {
            State::Initialized(inst) => Ok(&inst.info),
            State::Uninitialized => Err(WorkspaceStateError::NotInitialized.into()),
            State::Closed => Err(WorkspaceStateError::Closed.into()),
        }
    }

    /// Parse and validate a problem and initialize the built-in backend
    /// selected by the `use_indirect` option.
    pub fn init(&mut self, data: &Value, cone: &Value, settings: &Value) -> Result<(), InterfaceError> {
        self.init_inner(data, cone, settings, None)
    }

    /// As [`init`](Workspace::init), with a caller supplied backend.
    pub fn init_with_backend(
        &mut self,
        data: &Value,
        cone: &Value,
        settings: &Value,
        backend: Box<dyn LinearSystemBackend>,
    ) -> Result<(), InterfaceError> {
        self.init_inner(data, cone, settings, Some(backend))
    }

    fn init_inner(
        &mut self,
        data: &Value,
        cone: &Value,
        settings: &Value,
        backend: Option<Box<dyn LinearSystemBackend>>,
    ) -> Result<(), InterfaceError> {
        match self.state {
            State::Uninitialized => {}
            State::Initialized(_) => return Err(WorkspaceStateError::AlreadyInitialized.into()),
            State::Closed => return Err(WorkspaceStateError::Closed.into()),
        }

        // nothing is stored until every step has succeeded
        let instance = Instance::setup(data, cone, settings, backend, &*self.lock)?;
        log::debug!(
            "workspace initialized: n = {}, m = {}, linear system = {}",
            instance.data.n(),
            instance.data.m(),
            instance.engine.port.method()
        );
        self.state = State::Initialized(Box::new(instance));
        Ok(())
    }

    fn instance_mut(state: &mut State) -> Result<&mut Instance, InterfaceError> {
        match state {
            State::Initialized(inst) => Ok(inst),
            State::Uninitialized => Err(WorkspaceStateError::NotInitialized.into()),
            State::Closed => Err(WorkspaceStateError::Closed.into()),
        }
    }

    /// Solve the current problem.
    ///
    /// With `warm_start` false the iteration starts from zero.  Otherwise
    /// each supplied vector of the right shape is used as the starting
    /// point, a supplied vector of the wrong shape starts from zero with a
    /// diagnostic, and an omitted vector continues from the previous
    /// solution.
    pub fn solve(
        &mut self,
        warm_start: bool,
        x: Option<&Value>,
        y: Option<&Value>,
        s: Option<&Value>,
    ) -> Result<SolveOutput, InterfaceError> {
        let Workspace {
            state,
            lock,
            printer,
        } = self;
        let inst = Self::instance_mut(state)?;
        let mut diagnostics = std::mem::take(&mut inst.pending);
        let pending = diagnostics.len();

        let mut attempt = || -> Result<Solution, InterfaceError> {
            let (n, m) = (inst.data.n(), inst.data.m());
            if warm_start {
                let ws = WarmStartStore::from_parts(x, y, s, n, m, &mut diagnostics)?;
                if ws.was_supplied("x") {
                    inst.solution.x.copy_from_slice(&ws.x);
                }
                if ws.was_supplied("y") {
                    inst.solution.y.copy_from_slice(&ws.y);
                }
                if ws.was_supplied("s") {
                    inst.solution.s.copy_from_slice(&ws.s);
                }
            } else {
                inst.solution.x.fill(0.0);
                inst.solution.y.fill(0.0);
                inst.solution.s.fill(0.0);
            }

            inst.run(&**lock, printer, &mut diagnostics)?;

            Ok(Solution {
                x: try_copy(&inst.solution.x)?,
                y: try_copy(&inst.solution.y)?,
                s: try_copy(&inst.solution.s)?,
            })
        };

        match attempt() {
            Ok(solution) => Ok(SolveOutput::new(solution, inst.info.clone(), diagnostics)),
            Err(e) => {
                // init diagnostics are still owed to the caller
                diagnostics.truncate(pending);
                inst.pending = diagnostics;
                Err(e)
            }
        }
    }

    /// Replace `b` and/or `c` without re-parsing the matrices or cones.
    pub fn update(&mut self, b: Option<&Value>, c: Option<&Value>) -> Result<(), InterfaceError> {
        let inst = Self::instance_mut(&mut self.state)?;
        let (n, m) = (inst.data.n(), inst.data.m());

        let b = b.filter(|v| !v.is_none());
        let c = c.filter(|v| !v.is_none());
        let b = b.map(|v| sized_vector(v, "b", m)).transpose()?;
        let c = c.map(|v| sized_vector(v, "c", n)).transpose()?;

        if let Some(b) = &b {
            inst.data.b.copy_from_slice(b);
        }
        if let Some(c) = &c {
            inst.data.c.copy_from_slice(c);
        }
        inst.engine.update_vectors(b.as_deref(), c.as_deref());
        log::debug!(
            "workspace updated: b {}, c {}",
            if b.is_some() { "replaced" } else { "unchanged" },
            if c.is_some() { "replaced" } else { "unchanged" },
        );
        Ok(())
    }

    /// Release the backend and solution buffers.
    ///
    /// Every later operation fails with [`WorkspaceStateError::Closed`].
    pub fn close(&mut self) -> Result<(), InterfaceError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Initialized(mut inst) => {
                let result = inst.engine.close(&*self.lock);
                drop(inst);
                log::debug!("workspace closed");
                Ok(result?)
            }
            State::Uninitialized => {
                self.state = State::Uninitialized;
                Err(WorkspaceStateError::NotInitialized.into())
            }
            State::Closed => Err(WorkspaceStateError::Closed.into()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.is_initialized() {
            if let Err(e) = self.close() {
                log::warn!("error while closing workspace: {e}");
            }
        }
    }
}

impl ConfigurablePrintTarget for Workspace {
    fn print_to_stdout(&mut self) {
        self.printer.print_to_stdout()
    }
    fn print_to_file(&mut self, file: File) {
        self.printer.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.printer.print_to_stream(stream)
    }
    fn print_to_buffer(&mut self) {
        self.printer.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.printer.get_print_buffer()
    }
}

impl Instance {
    fn setup(
        data: &Value,
        cone: &Value,
        settings: &Value,
        backend: Option<Box<dyn LinearSystemBackend>>,
        lock: &dyn SchedulerLock,
    ) -> Result<Self, InterfaceError> {
        let start = Instant::now();
        let mut pending = Vec::new();

        let settings = settings_from_value(settings)?;
        let descriptor = ProblemDescriptor::parse(data, cone, &mut pending)?;
        let data = descriptor.to_problem_data()?;

        if let Some(path) = &settings.write_data_filename {
            write_data_file(path, &data, &settings, &mut pending);
        }

        let backend = backend.unwrap_or_else(|| default_backend(&settings));
        let engine = run_detached(lock, || AdmmEngine::new(&data, &settings, backend, lock))?;
        let solution = Solution::try_zeros(data.n(), data.m())?;

        let mut info = Info::new();
        info.setup_time = start.elapsed().as_secs_f64();

        Ok(Instance {
            data,
            settings,
            engine,
            solution,
            info,
            pending,
        })
    }

    // run the iteration from the point in `self.solution`
    fn run(
        &mut self,
        lock: &dyn SchedulerLock,
        printer: &mut PrintTarget,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), InterfaceError> {
        let Instance {
            data,
            settings,
            engine,
            solution,
            info,
            ..
        } = self;

        if let Err(e) = print_configuration(printer, settings, data, &engine.port.method()) {
            log::warn!("verbose output failed: {e}");
        }

        run_detached(lock, || {
            engine.solve(
                lock,
                settings,
                &mut *solution,
                &mut *info,
                &mut *printer,
                &mut *diagnostics,
            )
        })?;

        log::debug!(
            "solve finished with status '{}' after {} iterations",
            info.status,
            info.iter
        );
        Ok(())
    }
}

// run `f` once with the lock released and hand back its result
fn run_detached<R: Send>(
    lock: &dyn SchedulerLock,
    f: impl FnOnce() -> Result<R, BackendError> + Send,
) -> Result<R, BackendError> {
    let mut f = Some(f);
    let mut out = None;
    lock.run_detached(&mut || {
        if let Some(f) = f.take() {
            out = Some(f());
        }
    });
    out.unwrap_or_else(|| {
        Err(BackendError::failed(
            "solve",
            "the scheduler lock did not run the native phase",
        ))
    })
}

fn default_backend(settings: &Settings) -> Box<dyn LinearSystemBackend> {
    if settings.use_indirect {
        Box::new(IndirectBackend::new())
    } else {
        Box::new(DirectBackend::new())
    }
}

fn sized_vector(v: &Value, name: &'static str, len: usize) -> Result<Vec<f64>, InterfaceError> {
    let buf = float_vector(v, name)?;
    if buf.len() != len {
        return Err(InterfaceError::shape(
            name,
            format!("expected length {}, found {}", len, buf.len()),
        ));
    }
    try_copy(&buf)
}

fn write_data_file(path: &str, data: &ProblemData, settings: &Settings, diagnostics: &mut Vec<Diagnostic>) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "serde")] {
            let result = File::create(path)
                .and_then(|mut file| super::json::write_problem_json(&mut file, data, settings));
            if let Err(e) = result {
                Diagnostic::OutputFile {
                    path: path.to_string(),
                    message: e.to_string(),
                }
                .emit(diagnostics);
            }
        } else {
            let _ = (data, settings);
            Diagnostic::OutputFile {
                path: path.to_string(),
                message: "problem data output requires the 'serde' feature".to_string(),
            }
            .emit(diagnostics);
        }
    }
}

/// Solve a problem once.
///
/// `warm` is either `Value::None` or a dict with optional keys `x`, `y`
/// and `s`.  Omitted warm start vectors are zero.  The built-in backend
/// selected by `use_indirect` is used unless `backend` is given.
pub fn solve(
    data: &Value,
    cone: &Value,
    settings: &Value,
    warm: &Value,
    backend: Option<Box<dyn LinearSystemBackend>>,
    lock: &dyn SchedulerLock,
) -> Result<SolveOutput, InterfaceError> {
    let mut inst = Instance::setup(data, cone, settings, backend, lock)?;
    let mut diagnostics = std::mem::take(&mut inst.pending);

    let ws = WarmStartStore::load(warm, inst.data.n(), inst.data.m(), &mut diagnostics)?;
    inst.solution = Solution {
        x: ws.x,
        y: ws.y,
        s: ws.s,
    };

    let mut printer = PrintTarget::default();
    inst.run(lock, &mut printer, &mut diagnostics)?;
    inst.engine.close(lock)?;

    let Instance { solution, info, .. } = inst;
    Ok(SolveOutput::new(solution, info, diagnostics))
}
