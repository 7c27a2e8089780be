//! The session driver: one initial value problem, many output intervals.
//!
//! # Algorithm
//!
//! For each pair of consecutive output times `(t_in, t_out)`:
//!
//! 1. If an event handler is enabled, consult it at `t_in` and tell the
//!    solver not to step past `t_out`.
//! 2. Call the solver service and interpret its status code:
//!    - success at `t_out` completes the interval;
//!    - success short of `t_out` continues from where the solver stopped;
//!    - excessive precision scales every tolerance by the escalation factor
//!      and retries the interval;
//!    - error-test or convergence failures retry with tolerances unchanged;
//!    - a step-limit or vanished-component status ends the session early;
//!    - a root crossing is offered to the event handler, and ends the session
//!      unless the handler changes the state and restarts;
//!    - anything else is fatal.
//! 3. Append a row at the time reached, with auxiliary outputs evaluated once
//!    at the new state.
//!
//! Retries are bounded per interval by [`Config::retry_ceiling`], or by
//! [`Config::event_retry_ceiling`] when an event handler is enabled. The count
//! resets when an interval completes or an event restarts integration.
//!
//! When a session ends early the trajectory still holds a final row at the
//! time actually reached, and [`Solution::status`] says whether a root or an
//! error stopped it. Fatal statuses discard the trajectory and return
//! [`Error::FatalInput`].
//!
//! # Observer Events
//!
//! - [`Event::Interval`] — a row was appended (index 0 is the initial row)
//! - [`Event::Warning`] — a recoverable solver condition
//! - [`Event::Escalated`] — tolerances were scaled up
//! - [`Event::Root`] — the solver stopped on a root crossing
//! - [`Event::EventApplied`] — an event handler changed the state
//!
//! Observers can return [`Action::StopEarly`] to end the session after any
//! event.

mod action;
mod config;
mod drive;
mod error;
mod event;
mod setup;
mod solution;
mod state;


pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::{Event, Trigger};
pub use setup::Setup;
pub use solution::{Reason, Solution, Status};

use lode_core::{Evaluator, EventHandler, Observer, Problem, SolverService};

/// Integrates `problem` through every output time with `service`.
///
/// The observer receives an [`Event`] for every row and solver condition.
/// See the [module docs](self) for the control flow.
///
/// # Errors
///
/// Returns an error, discarding the partial trajectory, if the solver reports
/// a fatal status, a callback or the event handler fails, or the sparsity
/// pattern does not fit the workspace.
pub fn solve<S, H, Obs>(
    service: &mut S,
    evaluator: &mut Evaluator<'_>,
    events: H,
    problem: &Problem,
    setup: &Setup,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    S: SolverService,
    H: EventHandler,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    drive::drive(service, evaluator, events, problem, setup, config, observer)
}

/// Integrates `problem` without observer support.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_unobserved<S, H>(
    service: &mut S,
    evaluator: &mut Evaluator<'_>,
    events: H,
    problem: &Problem,
    setup: &Setup,
    config: &Config,
) -> Result<Solution, Error>
where
    S: SolverService,
    H: EventHandler,
{
    solve(service, evaluator, events, problem, setup, config, ())
}
