use std::{convert::Infallible, error::Error as StdError};

use crate::RootRecord;

/// Why the session is consulting an [`EventHandler`].
#[derive(Debug, Clone, Copy)]
pub enum Cause<'a> {
    /// The session reached the start of an output interval.
    Boundary,
    /// The solver stopped on a root crossing.
    Root(&'a RootRecord),
}

/// What an [`EventHandler`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// No event applies; the state is unchanged.
    Unchanged,
    /// An event changed the state; integration restarts from it.
    Restart,
    /// An event applies and the session should end here.
    Halt,
}

/// Applies discrete events to the state between solver calls.
///
/// A session with an enabled handler consults it at every interval boundary
/// and, if [`EventHandler::handles_roots`] is true, whenever the solver stops
/// on a root crossing. A root crossing that the handler answers with
/// [`Resume::Unchanged`] is a terminal root and ends the session early.
pub trait EventHandler {
    type Error: StdError + Send + Sync + 'static;

    /// Returns whether the session should consult this handler at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Returns whether root crossings are attributed to this handler.
    fn handles_roots(&self) -> bool {
        false
    }

    /// Possibly mutates `state` at `time`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be evaluated; the session aborts.
    fn maybe_apply(
        &mut self,
        cause: Cause<'_>,
        time: f64,
        state: &mut [f64],
    ) -> Result<Resume, Self::Error>;
}

/// No events: the handler is disabled and never consulted.
impl EventHandler for () {
    type Error = Infallible;

    fn is_enabled(&self) -> bool {
        false
    }

    fn maybe_apply(&mut self, _: Cause<'_>, _: f64, _: &mut [f64]) -> Result<Resume, Infallible> {
        Ok(Resume::Unchanged)
    }
}

impl<H: EventHandler + ?Sized> EventHandler for &mut H {
    type Error = H::Error;

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn handles_roots(&self) -> bool {
        (**self).handles_roots()
    }

    fn maybe_apply(
        &mut self,
        cause: Cause<'_>,
        time: f64,
        state: &mut [f64],
    ) -> Result<Resume, Self::Error> {
        (**self).maybe_apply(cause, time, state)
    }
}

/// Events scheduled at fixed times, each setting one state component.
///
/// When the session reaches a boundary at or past an event's time, the event
/// fires once and replaces (or adds to) the targeted component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    entries: Vec<Scheduled>,
    #[cfg_attr(feature = "serde-derive", serde(skip))]
    next: usize,
}

/// One scheduled change.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Scheduled {
    pub time: f64,
    pub component: usize,
    pub value: f64,
    pub method: Method,
}

/// How a scheduled value is combined with the current component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(rename_all = "lowercase"))]
pub enum Method {
    Replace,
    Add,
    Multiply,
}

impl Schedule {
    /// Creates a schedule, sorting entries by time.
    #[must_use]
    pub fn new(mut entries: Vec<Scheduled>) -> Self {
        entries.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { entries, next: 0 }
    }

    /// Returns how many entries have fired.
    #[must_use]
    pub fn fired(&self) -> usize {
        self.next
    }
}

/// Error raised when a scheduled entry targets a missing component.
#[derive(Debug, thiserror::Error)]
#[error("scheduled event at t={time} targets component {component} of {len}")]
pub struct ScheduleError {
    pub time: f64,
    pub component: usize,
    pub len: usize,
}

impl EventHandler for Schedule {
    type Error = ScheduleError;

    fn maybe_apply(
        &mut self,
        cause: Cause<'_>,
        time: f64,
        state: &mut [f64],
    ) -> Result<Resume, ScheduleError> {
        if matches!(cause, Cause::Root(_)) {
            return Ok(Resume::Unchanged);
        }

        let mut resume = Resume::Unchanged;
        while let Some(entry) = self.entries.get(self.next) {
            if entry.time > time {
                break;
            }
            let len = state.len();
            let slot = state.get_mut(entry.component).ok_or(ScheduleError {
                time: entry.time,
                component: entry.component,
                len,
            })?;
            *slot = match entry.method {
                Method::Replace => entry.value,
                Method::Add => *slot + entry.value,
                Method::Multiply => *slot * entry.value,
            };
            self.next += 1;
            resume = Resume::Restart;
        }
        Ok(resume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn entry(time: f64, component: usize, value: f64, method: Method) -> Scheduled {
        Scheduled {
            time,
            component,
            value,
            method,
        }
    }

    #[test]
    fn unit_handler_is_disabled() {
        let mut handler = ();
        assert!(!handler.is_enabled());
        assert_eq!(
            handler.maybe_apply(Cause::Boundary, 0.0, &mut [1.0]).unwrap(),
            Resume::Unchanged
        );
    }

    #[test]
    fn schedule_fires_due_entries_once() {
        let mut schedule = Schedule::new(vec![
            entry(2.0, 0, 10.0, Method::Add),
            entry(1.0, 1, 5.0, Method::Replace),
        ]);
        let mut state = [1.0, 1.0];

        let first = schedule.maybe_apply(Cause::Boundary, 0.5, &mut state).unwrap();
        assert_eq!(first, Resume::Unchanged);

        let second = schedule.maybe_apply(Cause::Boundary, 1.0, &mut state).unwrap();
        assert_eq!(second, Resume::Restart);
        assert_relative_eq!(state[1], 5.0);

        let third = schedule.maybe_apply(Cause::Boundary, 3.0, &mut state).unwrap();
        assert_eq!(third, Resume::Restart);
        assert_relative_eq!(state[0], 11.0);

        let fourth = schedule.maybe_apply(Cause::Boundary, 4.0, &mut state).unwrap();
        assert_eq!(fourth, Resume::Unchanged);
        assert_eq!(schedule.fired(), 2);
    }

    #[test]
    fn schedule_ignores_roots() {
        let mut schedule = Schedule::new(vec![entry(0.0, 0, 2.0, Method::Multiply)]);
        let roots = RootRecord::new(1);

        let resume = schedule
            .maybe_apply(Cause::Root(&roots), 1.0, &mut [1.0])
            .unwrap();

        assert_eq!(resume, Resume::Unchanged);
        assert!(!schedule.handles_roots());
    }

    #[test]
    fn schedule_rejects_missing_component() {
        let mut schedule = Schedule::new(vec![entry(0.0, 3, 2.0, Method::Replace)]);
        let err = schedule
            .maybe_apply(Cause::Boundary, 0.0, &mut [1.0])
            .unwrap_err();
        assert_eq!(err.component, 3);
    }
}
