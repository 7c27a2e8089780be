use thiserror::Error;

use crate::{ToleranceError, Tolerances};

/// Errors raised when an initial value problem is malformed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProblemError {
    #[error("initial state is empty")]
    EmptyState,

    #[error("at least one output time is required")]
    NoTimes,

    #[error("output times must strictly increase (t[{index}] = {time} after {previous})")]
    TimesNotIncreasing {
        index: usize,
        previous: f64,
        time: f64,
    },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error(transparent)]
    Tolerance(#[from] ToleranceError),
}

/// An initial value problem: where to start, when to report, how accurately.
///
/// The first output time is the initial time; the session produces one row per
/// output time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde-derive",
    serde(try_from = "ProblemFile", into = "ProblemFile")
)]
pub struct Problem {
    initial: Vec<f64>,
    times: Vec<f64>,
    tolerances: Tolerances,
}

impl Problem {
    /// Creates a validated problem.
    ///
    /// # Errors
    ///
    /// Returns an error if the state is empty, times are missing or do not
    /// strictly increase, any value is non-finite, or the tolerances do not
    /// fit the state length.
    pub fn new(
        initial: Vec<f64>,
        times: Vec<f64>,
        tolerances: Tolerances,
    ) -> Result<Self, ProblemError> {
        if initial.is_empty() {
            return Err(ProblemError::EmptyState);
        }
        if times.is_empty() {
            return Err(ProblemError::NoTimes);
        }
        if initial.iter().any(|y| !y.is_finite()) {
            return Err(ProblemError::NonFinite("initial state"));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(ProblemError::NonFinite("output times"));
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ProblemError::TimesNotIncreasing {
                index: index + 1,
                previous: times[index],
                time: times[index + 1],
            });
        }
        tolerances.validate(initial.len())?;

        Ok(Self {
            initial,
            times,
            tolerances,
        })
    }

    #[must_use]
    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Returns the number of equations.
    #[must_use]
    pub fn equations(&self) -> usize {
        self.initial.len()
    }

    /// Splits the problem into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, Tolerances) {
        (self.initial, self.times, self.tolerances)
    }
}

/// Unvalidated problem as read from a settings file.
#[cfg(feature = "serde-derive")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct ProblemFile {
    initial: Vec<f64>,
    times: Vec<f64>,
    tolerances: Tolerances,
}

#[cfg(feature = "serde-derive")]
impl From<Problem> for ProblemFile {
    fn from(problem: Problem) -> Self {
        let (initial, times, tolerances) = problem.into_parts();
        Self {
            initial,
            times,
            tolerances,
        }
    }
}

#[cfg(feature = "serde-derive")]
impl TryFrom<ProblemFile> for Problem {
    type Error = ProblemError;

    fn try_from(file: ProblemFile) -> Result<Self, ProblemError> {
        Problem::new(file.initial, file.times, file.tolerances)
    }
}
