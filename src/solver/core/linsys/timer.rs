use std::time::Duration;

/// Accumulated time spent in backend solves.
///
/// The total is consumed when read: [`take_report`](Self::take_report)
/// returns the time since the previous report and resets it.
#[derive(Debug, Default, Clone)]
pub struct LinSysTimer {
    total: Duration,
    calls: usize,
}

impl LinSysTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.calls += 1;
    }

    /// number of solves since the last report
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn take_report(&mut self) -> Duration {
        self.calls = 0;
        std::mem::take(&mut self.total)
    }
}
