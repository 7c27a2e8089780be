//! Capability traits for generic observers.
//!
//! These traits abstract over event and action types so an observer can be
//! written once and used with any driver that emits compatible events.
//!
//! # Event traits
//!
//! - [`HasTime`] — events that happen at a point in integration time
//! - [`IsWarning`] — events that may report a recoverable solver condition
//!
//! # Action traits
//!
//! - [`CanStopEarly`] — actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use lode_core::Observer;
//! use lode_observers::traits::{CanStopEarly, HasTime};
//!
//! struct Horizon {
//!     end: f64,
//! }
//!
//! impl<E: HasTime, A: CanStopEarly> Observer<E, A> for Horizon {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.time() > self.end).then(A::stop_early)
//!     }
//! }
//! ```

use lode_solvers::integration::session;

/// An event that happens at a point in integration time.
pub trait HasTime {
    /// Returns the time at which the event occurred.
    fn time(&self) -> f64;
}

/// An event that may report a recoverable solver condition.
pub trait IsWarning {
    /// Returns whether this event is a warning.
    fn is_warning(&self) -> bool;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the driver early.
    fn stop_early() -> Self;
}

impl HasTime for session::Event<'_> {
    fn time(&self) -> f64 {
        session::Event::time(self)
    }
}

impl IsWarning for session::Event<'_> {
    fn is_warning(&self) -> bool {
        session::Event::is_warning(self)
    }
}

impl CanStopEarly for session::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
