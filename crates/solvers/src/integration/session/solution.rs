use lode_core::{Diagnostics, Tolerances, Trajectory};

use crate::integration::Outcome;

/// Why a session stopped on an error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The per-call step budget ran out.
    StepLimit,

    /// A component vanished under pure relative error control.
    VanishedComponent,

    /// The retry ceiling was reached; `last` is the final outcome seen.
    RetriesExhausted { last: Outcome },
}

/// Indicates how the session terminated.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Every requested output time was reached.
    Complete,

    /// A root crossing no event handler claimed ended the session.
    StoppedOnRoot { time: f64, roots: Vec<usize> },

    /// The solver could not reach the next output time.
    StoppedOnError(Reason),

    /// The event handler asked to end the session at a boundary.
    Halted { time: f64 },

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of an integration session.
#[derive(Debug, Clone)]
pub struct Solution {
    /// How the session terminated.
    pub status: Status,

    /// Rows for every output time reached, plus a final row at the time
    /// actually reached when the session stopped early.
    pub trajectory: Trajectory,

    /// Last status code and workspace statistics.
    pub diagnostics: Diagnostics,

    /// Tolerances in force at the end, after any escalation.
    pub tolerances: Tolerances,

    /// Number of output intervals completed.
    pub intervals: usize,

    /// Number of times tolerances were escalated.
    pub escalations: usize,
}

impl Solution {
    /// Returns whether the session ended before the last output time.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.trajectory.is_partial()
    }

    /// Returns the triggering root indices if the session stopped on a root.
    #[must_use]
    pub fn stopped_on_root(&self) -> Option<&[usize]> {
        match &self.status {
            Status::StoppedOnRoot { roots, .. } => Some(roots),
            _ => None,
        }
    }
}
