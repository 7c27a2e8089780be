use log::Level;

use lode_core::Observer;
use lode_solvers::integration::session::{Action, Event, Trigger};

/// Forwards session events to the `log` facade.
///
/// Warnings are logged at [`Level::Warn`], roots and applied events at
/// [`Level::Info`], and rows at a configurable level (default
/// [`Level::Debug`]). The observer never stops a session.
#[derive(Debug, Clone)]
pub struct LogObserver {
    target: String,
    rows: Level,
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new("lode::session")
    }
}

impl LogObserver {
    /// Creates an observer that logs under `target`.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            rows: Level::Debug,
        }
    }

    /// Sets the level used for trajectory rows.
    #[must_use]
    pub fn rows_at(mut self, level: Level) -> Self {
        self.rows = level;
        self
    }

    /// Returns the level an event is logged at.
    #[must_use]
    pub fn level(&self, event: &Event<'_>) -> Level {
        match event {
            Event::Interval { .. } => self.rows,
            Event::Warning { .. } | Event::Escalated { .. } => Level::Warn,
            Event::Root { .. } | Event::EventApplied { .. } => Level::Info,
        }
    }
}

impl Observer<Event<'_>, Action> for LogObserver {
    fn observe(&mut self, event: &Event<'_>) -> Option<Action> {
        let level = self.level(event);
        let target = self.target.as_str();
        match event {
            Event::Interval { index, row } => {
                log::log!(target: target, level, "row {index}: t={} y={:?}", row.time, row.state);
            }
            Event::Warning {
                time,
                verdict,
                retries,
            } => {
                log::log!(
                    target: target,
                    level,
                    "t={time}: {} (status {}, retry {retries})",
                    verdict.message,
                    verdict.code
                );
            }
            Event::Escalated {
                time,
                factor,
                cumulative,
                ..
            } => {
                log::log!(
                    target: target,
                    level,
                    "t={time}: tolerances scaled by {factor} ({cumulative} overall)"
                );
            }
            Event::Root { time, roots } => {
                log::log!(target: target, level, "t={time}: root crossing {roots:?}");
            }
            Event::EventApplied { time, trigger } => {
                let cause = match trigger {
                    Trigger::Boundary => "boundary",
                    Trigger::Root => "root",
                };
                log::log!(target: target, level, "t={time}: event applied at {cause}");
            }
        }
        None
    }
}
