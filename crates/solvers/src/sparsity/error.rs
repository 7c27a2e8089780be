use thiserror::Error;

/// Errors raised while building or installing a sparsity pattern.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SparsityError {
    /// The entry buffer filled up before every variable was listed.
    #[error("sparsity buffer exhausted at state variable {state} (capacity {capacity} entries)")]
    BufferExhausted { capacity: usize, state: usize },

    /// An offset or index does not fit the integer workspace.
    #[error("sparsity value {0} does not fit the integer workspace")]
    Overflow(usize),

    /// The grid and the state vector disagree on the variable count.
    #[error("grid describes {grid} state variables, problem has {equations}")]
    Mismatch { grid: usize, equations: usize },

    /// A workspace does not hold a readable pattern.
    #[error("workspace holds no sparsity pattern for {equations} variables")]
    Missing { equations: usize },
}
