use lode_core::{Row, Tolerances};

use crate::integration::Verdict;

/// What prompted an event handler to change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Boundary,
    Root,
}

/// Events emitted by the session driver.
///
/// Interval 0 is the initial row; intervals `1..n` follow each requested
/// output time the session reaches, including a final partial row when the
/// session stops early.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A trajectory row was appended.
    Interval {
        /// Index of the output time this row belongs to.
        index: usize,
        row: &'a Row,
    },

    /// The solver reported a recoverable condition.
    Warning {
        time: f64,
        verdict: Verdict,
        /// Solver calls already spent on the current interval.
        retries: usize,
    },

    /// Tolerances were scaled up after an excessive-precision status.
    Escalated {
        time: f64,
        factor: f64,
        /// Product of every factor applied so far.
        cumulative: f64,
        tolerances: &'a Tolerances,
    },

    /// The solver stopped on a root crossing.
    Root { time: f64, roots: &'a [usize] },

    /// An event handler changed the state and integration restarts.
    EventApplied { time: f64, trigger: Trigger },
}

impl Event<'_> {
    /// Returns the session time at which the event occurred.
    #[must_use]
    pub fn time(&self) -> f64 {
        match self {
            Self::Interval { row, .. } => row.time,
            Self::Warning { time, .. }
            | Self::Escalated { time, .. }
            | Self::Root { time, .. }
            | Self::EventApplied { time, .. } => *time,
        }
    }

    /// Returns whether the event reports a solver warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}
