use lode_core::{
    CallMode, DiagnosticLayout, Evaluator, Problem, ProblemError, RootRecord, Row, SolverKind, Tolerances,
    Trajectory, Workspace,
};

use crate::sparsity::layout;

use super::{Error, Setup, Solution, Status};

/// Everything one session owns between solver calls.
pub(super) struct State {
    pub(super) kind: SolverKind,
    pub(super) time: f64,
    end: f64,
    pub(super) y: Vec<f64>,
    pub(super) tolerances: Tolerances,
    pub(super) workspace: Workspace,
    pub(super) roots: RootRecord,
    pub(super) mode: CallMode,
    pub(super) optional_inputs: bool,
    pub(super) status: i32,
    pub(super) retries: usize,
    pub(super) escalations: usize,
    pub(super) intervals: usize,
    pub(super) trajectory: Trajectory,
    dy: Vec<f64>,
    aux: Vec<f64>,
}

impl State {
    /// Allocates the workspace, seeds it, and installs a sparsity pattern if
    /// the solver variant reads one.
    pub(super) fn new(
        problem: &Problem,
        setup: &Setup,
        evaluator: &Evaluator<'_>,
    ) -> Result<Self, Error> {
        let (Some(&start), Some(&end)) = (problem.times().first(), problem.times().last())
        else {
            return Err(ProblemError::NoTimes.into());
        };
        let equations = problem.equations();
        let root_count = evaluator.root_count();

        let mut workspace = Workspace::new(setup.workspace_size(equations, root_count));
        workspace.seed(setup.int_inputs(), setup.real_inputs());
        let optional_inputs = workspace.has_optional_inputs();

        match setup.grid() {
            Some(grid) if setup.kind().is_sparse() => {
                let pattern = layout::install_grid(grid, equations, &mut workspace)?;
                log::debug!(
                    "installed sparsity pattern: {} variables, {} entries",
                    pattern.len(),
                    pattern.nnz()
                );
            }
            Some(_) => log::debug!("grid ignored by {:?} solver", setup.kind()),
            None => {}
        }

        Ok(Self {
            kind: setup.kind(),
            time: start,
            end,
            y: problem.initial().to_vec(),
            tolerances: problem.tolerances().clone(),
            workspace,
            roots: RootRecord::new(root_count),
            mode: CallMode::Start,
            optional_inputs,
            status: 0,
            retries: 0,
            escalations: 0,
            intervals: 0,
            trajectory: Trajectory::with_requested(problem.times().len()),
            dy: vec![0.0; equations],
            aux: vec![0.0; evaluator.aux_count()],
        })
    }

    /// Appends a row at the current time and state.
    ///
    /// Auxiliary outputs are evaluated once here, only if the evaluator
    /// declares any.
    pub(super) fn push_row(&mut self, evaluator: &mut Evaluator<'_>) -> Result<(), Error> {
        if !self.aux.is_empty() {
            evaluator.derivative(self.time, &self.y, &mut self.dy, &mut self.aux)?;
        }
        let pushed = self.trajectory.push(Row {
            time: self.time,
            state: self.y.clone(),
            aux: self.aux.clone(),
        });
        if !pushed {
            log::warn!("trajectory full, row at t={} dropped", self.time);
        }
        Ok(())
    }

    pub(super) fn last_row(&self) -> Option<&Row> {
        self.trajectory.last()
    }

    pub(super) fn into_solution(mut self, status: Status, layout: &DiagnosticLayout) -> Solution {
        let finished =
            self.trajectory.len() >= self.trajectory.requested() && self.time >= self.end;
        if status != Status::Complete && !finished {
            self.trajectory.mark_partial();
        }
        Solution {
            status,
            diagnostics: self.workspace.snapshot(self.status, layout),
            trajectory: self.trajectory,
            tolerances: self.tolerances,
            intervals: self.intervals,
            escalations: self.escalations,
        }
    }
}
