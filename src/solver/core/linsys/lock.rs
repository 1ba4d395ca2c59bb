/// The host environment's cooperative scheduling lock.
///
/// Native phases of a solve run inside [`run_detached`](Self::run_detached)
/// with the lock released.  Every call into a
/// [`Reentrant`](super::CallMode::Reentrant) backend is wrapped in
/// [`run_attached`](Self::run_attached), so that a solve alternates between
/// lock free and lock held phases.
pub trait SchedulerLock: Sync {
    /// run `f` with the lock released
    fn run_detached(&self, f: &mut (dyn FnMut() + Send));

    /// run `f` with the lock held
    fn run_attached(&self, f: &mut dyn FnMut());
}

/// Lock for hosts without a scheduler lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

impl SchedulerLock for NoLock {
    fn run_detached(&self, f: &mut (dyn FnMut() + Send)) {
        f()
    }

    fn run_attached(&self, f: &mut dyn FnMut()) {
        f()
    }
}
