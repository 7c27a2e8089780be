use lode_core::{SolverKind, WorkspaceSize};

use crate::sparsity::Grid;

/// Per-session choices: which solver variant, how large its workspace is,
/// and what the caller seeds into it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Setup {
    kind: SolverKind,
    #[cfg_attr(feature = "serde-derive", serde(default))]
    workspace: Option<WorkspaceSize>,
    #[cfg_attr(feature = "serde-derive", serde(default))]
    grid: Option<Grid>,
    #[cfg_attr(feature = "serde-derive", serde(default))]
    int_inputs: Vec<i32>,
    #[cfg_attr(feature = "serde-derive", serde(default))]
    real_inputs: Vec<f64>,
}

impl Setup {
    /// Creates a setup for `kind` with a default-sized workspace.
    #[must_use]
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            workspace: None,
            grid: None,
            int_inputs: Vec::new(),
            real_inputs: Vec::new(),
        }
    }

    /// Uses an explicit workspace size instead of the default.
    #[must_use]
    pub fn with_workspace(mut self, size: WorkspaceSize) -> Self {
        self.workspace = Some(size);
        self
    }

    /// Attaches the grid whose sparsity pattern a sparse solver reads.
    #[must_use]
    pub fn with_grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Seeds the front of the integer and real workspace buffers.
    ///
    /// Slots [`slot::INT_INPUTS`] and [`slot::REAL_INPUTS`] carry optional
    /// inputs such as the step budget and maximum step size.
    ///
    /// [`slot::INT_INPUTS`]: lode_core::workspace::slot::INT_INPUTS
    /// [`slot::REAL_INPUTS`]: lode_core::workspace::slot::REAL_INPUTS
    #[must_use]
    pub fn with_inputs(mut self, int_inputs: Vec<i32>, real_inputs: Vec<f64>) -> Self {
        self.int_inputs = int_inputs;
        self.real_inputs = real_inputs;
        self
    }

    #[must_use]
    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    #[must_use]
    pub fn int_inputs(&self) -> &[i32] {
        &self.int_inputs
    }

    #[must_use]
    pub fn real_inputs(&self) -> &[f64] {
        &self.real_inputs
    }

    /// Returns the workspace size for a system of `equations` with `roots`
    /// root functions.
    ///
    /// An explicit size wins. Otherwise the size follows what each solver
    /// variant needs for its history arrays and jacobian storage, and always
    /// covers the diagnostic slots.
    #[must_use]
    pub fn workspace_size(&self, equations: usize, roots: usize) -> WorkspaceSize {
        if let Some(size) = self.workspace {
            return size;
        }

        let n = equations;
        let (int_len, real_len) = match self.kind {
            SolverKind::Switching => (20 + n, 22 + n * (n + 9).max(16)),
            SolverKind::RootFinding => (20 + n, 22 + n * (n + 9).max(16) + 3 * roots),
            SolverKind::Stiff => (20 + n, 22 + 9 * n + n * n),
            SolverKind::VariableCoefficient => (30 + n, 22 + 9 * n + 2 * n * n),
            SolverKind::SparseStiff => {
                let per_row = self
                    .grid
                    .as_ref()
                    .map_or(n, |g| 1 + 2 * g.dimensionality() + g.species());
                let entries = n.saturating_mul(per_row);
                (31 + n + entries + 4, 20 + 16 * n + 2 * entries)
            }
        };

        WorkspaceSize {
            int_len: int_len.max(23),
            real_len: real_len.max(16),
        }
    }
}
