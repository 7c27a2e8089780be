use lode_core::Observer;

use crate::traits::{CanStopEarly, HasTime, IsWarning};

/// Stops a driver at the first event past a time horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopAt {
    horizon: f64,
}

impl StopAt {
    #[must_use]
    pub fn new(horizon: f64) -> Self {
        Self { horizon }
    }
}

impl<E: HasTime, A: CanStopEarly> Observer<E, A> for StopAt {
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.time() > self.horizon).then(A::stop_early)
    }
}

impl<E: HasTime, A: CanStopEarly> Observer<E, A> for &mut StopAt {
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}

/// Stops a driver once it has reported `limit` warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningLimit {
    limit: usize,
    seen: usize,
}

impl WarningLimit {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit, seen: 0 }
    }

    /// Returns the warnings seen so far.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.seen
    }
}

impl<E: IsWarning, A: CanStopEarly> Observer<E, A> for WarningLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        if !event.is_warning() {
            return None;
        }
        self.seen += 1;
        (self.seen >= self.limit).then(A::stop_early)
    }
}

impl<E: IsWarning, A: CanStopEarly> Observer<E, A> for &mut WarningLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}
