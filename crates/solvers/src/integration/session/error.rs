use std::error::Error as StdError;

use lode_core::{AdapterError, ProblemError};

use crate::sparsity::SparsityError;

/// Errors that abort a session.
///
/// Any of these discards the trajectory built so far.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("solver status {code} at t={time}: {message}")]
    FatalInput {
        code: i32,
        message: &'static str,
        time: f64,
    },

    #[error("evaluation error: {0}")]
    Evaluation(#[from] AdapterError),

    #[error("event error: {0}")]
    Event(#[source] Box<dyn StdError + Send + Sync>),

    #[error("invalid problem: {0}")]
    Problem(#[from] ProblemError),

    #[error("sparsity error: {0}")]
    Sparsity(#[from] SparsityError),
}

impl Error {
    pub(crate) fn event<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Event(Box::new(err))
    }
}
