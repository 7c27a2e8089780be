use crate::{Evaluator, Tolerances, Workspace, evaluator::AdapterError};

/// The solver variants a service can provide.
///
/// The variant decides how some status codes are read (only
/// [`SolverKind::RootFinding`] reports root crossings) and whether a sparsity
/// pattern is installed into the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(rename_all = "kebab-case"))]
pub enum SolverKind {
    /// Switches automatically between stiff and non-stiff methods.
    Switching,
    /// Stiff multistep method with a dense or banded jacobian.
    Stiff,
    /// Stiff multistep method with a sparse jacobian.
    SparseStiff,
    /// Switching method that also monitors root functions.
    RootFinding,
    /// Variable-coefficient multistep method.
    VariableCoefficient,
}

impl SolverKind {
    /// Returns whether this variant reports root crossings.
    #[must_use]
    pub fn finds_roots(self) -> bool {
        matches!(self, Self::RootFinding)
    }

    /// Returns whether this variant reads a sparsity pattern from the workspace.
    #[must_use]
    pub fn is_sparse(self) -> bool {
        matches!(self, Self::SparseStiff)
    }
}

/// How a call relates to the previous one in the same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// First call, or first call after the state was changed externally.
    Start,
    /// Continue from where the previous call stopped.
    Continue,
    /// Continue, but tolerances or other inputs changed since the last call.
    Reconfigured,
}

/// How far a service may step relative to the requested output time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    /// Reach the output time, possibly stepping past it and interpolating.
    Normal,
    /// Reach the output time without ever stepping past the critical time.
    Critical(f64),
}

/// Flags marking which root functions changed sign.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootRecord {
    flags: Vec<bool>,
}

impl RootRecord {
    /// Creates a record with `count` cleared flags.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            flags: vec![false; count],
        }
    }

    /// Marks root function `index` as crossed. Out-of-range indices are ignored.
    pub fn mark(&mut self, index: usize) {
        if let Some(flag) = self.flags.get_mut(index) {
            *flag = true;
        }
    }

    pub fn clear(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = false);
    }

    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Returns the indices of the crossed root functions.
    #[must_use]
    pub fn triggered(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i))
            .collect()
    }

    #[must_use]
    pub fn any(&self) -> bool {
        self.flags.iter().any(|f| *f)
    }
}

/// One request to advance a state from `t_in` toward `t_out`.
#[derive(Debug)]
pub struct Request<'a> {
    pub kind: SolverKind,
    pub t_in: f64,
    pub t_out: f64,
    pub state: &'a mut [f64],
    pub tolerances: &'a Tolerances,
    pub mode: CallMode,
    pub task: Task,
    /// Whether the workspace carries caller-provided optional inputs.
    pub optional_inputs: bool,
    /// Root flags the service sets when it stops on a crossing.
    pub roots: &'a mut RootRecord,
}

/// What a service reports after one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    /// The time the state was advanced to.
    pub time: f64,
    /// The raw status code.
    pub status: i32,
}

/// An external integrator that advances a state over one output interval.
///
/// Services are opaque: they own their stepping algorithm and report the
/// outcome as a raw status code, which the session driver interprets. The
/// state in the request is updated in place, and the workspace carries the
/// service's persistent buffers between calls.
pub trait SolverService {
    /// Advances `request.state` from `request.t_in` toward `request.t_out`.
    ///
    /// # Errors
    ///
    /// Returns an error only when an evaluation callback fails. Numerical
    /// trouble is reported through [`Advance::status`].
    fn advance(
        &mut self,
        request: Request<'_>,
        evaluator: &mut Evaluator<'_>,
        workspace: &mut Workspace,
    ) -> Result<Advance, AdapterError>;
}

impl<S: SolverService + ?Sized> SolverService for &mut S {
    fn advance(
        &mut self,
        request: Request<'_>,
        evaluator: &mut Evaluator<'_>,
        workspace: &mut Workspace,
    ) -> Result<Advance, AdapterError> {
        (**self).advance(request, evaluator, workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggered_lists_marked_roots() {
        let mut roots = RootRecord::new(4);
        roots.mark(1);
        roots.mark(3);
        roots.mark(9);

        assert!(roots.any());
        assert_eq!(roots.triggered(), vec![1, 3]);

        roots.clear();
        assert!(!roots.any());
        assert!(roots.triggered().is_empty());
    }

    #[test]
    fn only_root_finding_reports_roots() {
        assert!(SolverKind::RootFinding.finds_roots());
        assert!(!SolverKind::Switching.finds_roots());
        assert!(SolverKind::SparseStiff.is_sparse());
        assert!(!SolverKind::Stiff.is_sparse());
    }
}
