//! A fixed-step classical Runge-Kutta solver service.
//!
//! [`Rk4`] advances a state with the four-stage method
//!
//! ```text
//! k1 = f(t, y)
//! k2 = f(t + h/2, y + h/2 k1)
//! k3 = f(t + h/2, y + h/2 k2)
//! k4 = f(t + h, y + h k3)
//! y' = y + h/6 (k1 + 2 k2 + 2 k3 + k4)
//! ```
//!
//! It ignores tolerances, never steps past the output time, and reports the
//! same status codes as the adaptive services the session driver expects:
//! 2 on success, −1 when the step budget runs out, −3 for an empty or
//! backward interval, and 3 when a root function changes sign during a
//! [`SolverKind::RootFinding`] call. Roots are located by bisection on the
//! step that contains them.
//!
//! A located root leaves the state just past the crossing. When the next call
//! restarts from that time, the roots that crossed are masked for its first
//! step so the same crossing is not reported again.
//!
//! Workspace slots [`slot::MAX_STEP`] and [`slot::MAX_STEPS`] override the
//! configured step size and per-call step budget. Statistics are written to
//! the usual diagnostic slots.

use lode_core::{
    AdapterError, Advance, CallMode, Evaluator, Request, SolverKind, SolverService, Workspace,
    workspace::slot,
};
use thiserror::Error;

use super::status::ROOT_SENTINEL;

const SUCCESS: i32 = 2;
const STEP_LIMIT: i32 = -1;
const ILLEGAL_INPUT: i32 = -3;

/// Bisection iterations used to locate a root within one step.
const ROOT_ITERS: usize = 60;

/// Errors that can occur when configuring an [`Rk4`] service.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("step must be finite and positive")]
    Step,

    #[error("step budget must be at least 1")]
    Budget,
}

/// Fixed-step classical Runge-Kutta service.
#[derive(Debug, Clone, PartialEq)]
pub struct Rk4 {
    step: f64,
    budget: usize,
    scratch: Scratch,
    crossing: Option<Crossing>,
}

/// The last root crossing reported, kept to mask it on restart.
#[derive(Debug, Clone, PartialEq)]
struct Crossing {
    time: f64,
    roots: Vec<usize>,
}

impl Default for Rk4 {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-2, 500).unwrap()
    }
}

impl Rk4 {
    /// Creates a service with a default step size and per-call step budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is not finite and positive, or the budget
    /// is zero.
    pub fn new(step: f64, budget: usize) -> Result<Self, ConfigError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::Step);
        }
        if budget == 0 {
            return Err(ConfigError::Budget);
        }
        Ok(Self {
            step,
            budget,
            scratch: Scratch::default(),
            crossing: None,
        })
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }
}

impl SolverService for Rk4 {
    fn advance(
        &mut self,
        request: Request<'_>,
        evaluator: &mut Evaluator<'_>,
        workspace: &mut Workspace,
    ) -> Result<Advance, AdapterError> {
        let Request {
            kind,
            t_in,
            t_out,
            state,
            mode,
            roots,
            ..
        } = request;

        if t_in.is_nan() || t_out.is_nan() || t_out <= t_in || state.is_empty() {
            log::warn!("rk4: illegal interval [{t_in}, {t_out}]");
            return Ok(Advance {
                time: t_in,
                status: ILLEGAL_INPUT,
            });
        }

        let h = match workspace.real_at(slot::MAX_STEP) {
            h if h > 0.0 => h,
            _ => self.step,
        };
        let budget = usize::try_from(workspace.int_at(slot::MAX_STEPS))
            .ok()
            .filter(|&b| b > 0)
            .unwrap_or(self.budget);

        let watch_roots = kind == SolverKind::RootFinding && evaluator.root_count() > 0;
        let scratch = &mut self.scratch;
        scratch.resize(state.len(), evaluator.aux_count(), evaluator.root_count());
        scratch.masked.fill(false);
        if let Some(crossing) = self.crossing.take() {
            if mode == CallMode::Start && crossing.time == t_in {
                log::debug!("rk4: masking roots {:?} at restart", crossing.roots);
                for i in crossing.roots {
                    if let Some(masked) = scratch.masked.get_mut(i) {
                        *masked = true;
                    }
                }
            }
        }
        let mut stats = Stats::default();

        if watch_roots {
            evaluator.roots(t_in, state, &mut scratch.g_prev)?;
        }

        let mut t = t_in;
        let snap = 4.0 * f64::EPSILON * t_out.abs().max(1.0);
        while t < t_out {
            if stats.steps >= budget {
                log::warn!("rk4: {budget} steps taken before reaching t={t_out}");
                stats.record(workspace, t, h);
                return Ok(Advance {
                    time: t,
                    status: STEP_LIMIT,
                });
            }

            // Step ends sit at whole multiples of h past t_in.
            #[allow(clippy::cast_precision_loss)]
            let next = (t_in + (stats.steps + 1) as f64 * h).min(t_out);
            let next = if t_out - next <= snap { t_out } else { next };
            let dt = next - t;

            scratch.y0.copy_from_slice(state);
            scratch.step(evaluator, t, dt, state, &mut stats)?;
            stats.steps += 1;
            stats.last = dt;

            if watch_roots {
                evaluator.roots(next, state, &mut scratch.g_next)?;
                if scratch.crossed(&scratch.g_next).next().is_some() {
                    let time = scratch.locate_root(evaluator, t, dt, state, &mut stats)?;
                    let crossed: Vec<usize> = scratch.crossed(&scratch.g_next).collect();
                    for &i in &crossed {
                        roots.mark(i);
                    }
                    self.crossing = Some(Crossing {
                        time,
                        roots: crossed,
                    });
                    stats.record(workspace, time, h);
                    return Ok(Advance {
                        time,
                        status: ROOT_SENTINEL,
                    });
                }
                scratch.g_prev.copy_from_slice(&scratch.g_next);
                scratch.masked.fill(false);
            }

            t = next;
        }

        stats.record(workspace, t, h);
        Ok(Advance {
            time: t,
            status: SUCCESS,
        })
    }
}

/// Counters for one call, added to the workspace totals.
#[derive(Debug, Default)]
struct Stats {
    steps: usize,
    derivative_calls: usize,
    last: f64,
}

impl Stats {
    fn record(&self, workspace: &mut Workspace, time: f64, next: f64) {
        let add = |workspace: &mut Workspace, index: usize, n: usize| {
            let n = i32::try_from(n).unwrap_or(i32::MAX);
            let total = workspace.int_at(index).saturating_add(n);
            workspace.set_int(index, total);
        };
        add(workspace, slot::STEPS_TAKEN, self.steps);
        add(workspace, slot::DERIVATIVE_CALLS, self.derivative_calls);
        workspace.set_real(slot::LAST_STEP, self.last);
        workspace.set_real(slot::NEXT_STEP, next);
        workspace.set_real(slot::CURRENT_TIME, time);
    }
}

/// Stage and root buffers reused across calls.
#[derive(Debug, Clone, Default, PartialEq)]
struct Scratch {
    y0: Vec<f64>,
    tmp: Vec<f64>,
    k: [Vec<f64>; 4],
    aux: Vec<f64>,
    g_prev: Vec<f64>,
    g_next: Vec<f64>,
    masked: Vec<bool>,
}

impl Scratch {
    fn resize(&mut self, n: usize, aux: usize, roots: usize) {
        self.y0.resize(n, 0.0);
        self.tmp.resize(n, 0.0);
        for k in &mut self.k {
            k.resize(n, 0.0);
        }
        self.aux.resize(aux, 0.0);
        self.g_prev.resize(roots, 0.0);
        self.g_next.resize(roots, 0.0);
        self.masked.resize(roots, false);
    }

    /// Takes one step of size `h` from `(t, self.y0)` into `y`.
    fn step(
        &mut self,
        evaluator: &mut Evaluator<'_>,
        t: f64,
        h: f64,
        y: &mut [f64],
        stats: &mut Stats,
    ) -> Result<(), AdapterError> {
        let Self { y0, tmp, k, aux, .. } = self;
        let [k1, k2, k3, k4] = k;

        evaluator.derivative(t, y0, k1, aux)?;

        stage(tmp, y0, k1, 0.5 * h);
        evaluator.derivative(t + 0.5 * h, tmp, k2, aux)?;

        stage(tmp, y0, k2, 0.5 * h);
        evaluator.derivative(t + 0.5 * h, tmp, k3, aux)?;

        stage(tmp, y0, k3, h);
        evaluator.derivative(t + h, tmp, k4, aux)?;

        for (i, yi) in y.iter_mut().enumerate() {
            *yi = y0[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }
        stats.derivative_calls += 4;
        Ok(())
    }

    /// Indices of unmasked root functions that changed sign or reached zero
    /// since `self.g_prev`.
    fn crossed<'a>(&'a self, after: &'a [f64]) -> impl Iterator<Item = usize> + 'a {
        self.g_prev
            .iter()
            .zip(after)
            .zip(&self.masked)
            .enumerate()
            .filter(|(_, ((b, a), masked))| {
                !**masked && **b != 0.0 && (**a == 0.0 || b.signum() != a.signum())
            })
            .map(|(i, _)| i)
    }

    /// Narrows a crossing inside the step `(t, t + h]` taken from `self.y0`.
    ///
    /// Leaves `y` at the first point found past the crossing, `self.g_next`
    /// holding the root functions there, and returns its time.
    fn locate_root(
        &mut self,
        evaluator: &mut Evaluator<'_>,
        t: f64,
        h: f64,
        y: &mut [f64],
        stats: &mut Stats,
    ) -> Result<f64, AdapterError> {
        let mut lo = 0.0;
        let mut hi = h;
        let mut g_mid = vec![0.0; self.g_prev.len()];
        let scale = t.abs().max(1.0);

        for _ in 0..ROOT_ITERS {
            if hi - lo <= 4.0 * f64::EPSILON * scale {
                break;
            }
            let mid = 0.5 * (lo + hi);
            self.step(evaluator, t, mid, y, stats)?;
            evaluator.roots(t + mid, y, &mut g_mid)?;
            if self.crossed(&g_mid).next().is_some() {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        self.step(evaluator, t, hi, y, stats)?;
        evaluator.roots(t + hi, y, &mut self.g_next)?;
        Ok(t + hi)
    }
}

/// Sets `out = y + h * k`.
fn stage(out: &mut [f64], y: &[f64], k: &[f64], h: f64) {
    for ((o, yi), ki) in out.iter_mut().zip(y).zip(k) {
        *o = yi + h * ki;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use lode_core::{
        CallMode, Native, RootRecord, Task, Tolerances, WorkspaceSize, workspace::slot,
    };

    fn workspace() -> Workspace {
        Workspace::new(WorkspaceSize {
            int_len: 24,
            real_len: 16,
        })
    }

    fn advance(
        service: &mut Rk4,
        kind: SolverKind,
        evaluator: &mut Evaluator<'_>,
        ws: &mut Workspace,
        y: &mut [f64],
        roots: &mut RootRecord,
        (t_in, t_out): (f64, f64),
    ) -> Advance {
        let tolerances = Tolerances::new(1e-6, 1e-8);
        let request = Request {
            kind,
            t_in,
            t_out,
            state: y,
            tolerances: &tolerances,
            mode: CallMode::Start,
            task: Task::Normal,
            optional_inputs: false,
            roots,
        };
        service.advance(request, evaluator, ws).unwrap()
    }

    #[test]
    fn exponential_decay() {
        let mut service = Rk4::default();
        let mut evaluator: Evaluator<'_> = Native::new(|_, y, dy, _| dy[0] = -y[0]).into();
        let mut ws = workspace();
        let mut y = [1.0];

        let out = advance(
            &mut service,
            SolverKind::Switching,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut RootRecord::new(0),
            (0.0, 1.0),
        );

        assert_eq!(out.status, 2);
        assert_relative_eq!(out.time, 1.0);
        assert_relative_eq!(y[0], (-1.0_f64).exp(), epsilon = 1e-9);
        assert_eq!(ws.int_at(slot::STEPS_TAKEN), 100);
        assert_eq!(ws.int_at(slot::DERIVATIVE_CALLS), 400);
        assert_relative_eq!(ws.real_at(slot::CURRENT_TIME), 1.0);
    }

    #[test]
    fn workspace_step_overrides_default() {
        let mut service = Rk4::default();
        let mut evaluator: Evaluator<'_> = Native::new(|t, _, dy, _| dy[0] = 2.0 * t).into();
        let mut ws = workspace();
        ws.set_real(slot::MAX_STEP, 0.25);
        let mut y = [0.0];

        let out = advance(
            &mut service,
            SolverKind::Stiff,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut RootRecord::new(0),
            (0.0, 1.0),
        );

        assert_eq!(out.status, 2);
        assert_eq!(ws.int_at(slot::STEPS_TAKEN), 4);
        assert_relative_eq!(ws.real_at(slot::LAST_STEP), 0.25);
        // RK4 integrates polynomials of low degree exactly.
        assert_relative_eq!(y[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn step_budget_returns_progress() {
        let mut service = Rk4::default();
        let mut evaluator: Evaluator<'_> = Native::new(|_, _, dy, _| dy[0] = 1.0).into();
        let mut ws = workspace();
        ws.set_int(slot::MAX_STEPS, 10);
        let mut y = [0.0];

        let out = advance(
            &mut service,
            SolverKind::Switching,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut RootRecord::new(0),
            (0.0, 1.0),
        );

        assert_eq!(out.status, -1);
        assert_relative_eq!(out.time, 0.1, epsilon = 1e-12);
        assert_relative_eq!(y[0], 0.1, epsilon = 1e-12);
        assert_eq!(ws.int_at(slot::STEPS_TAKEN), 10);
    }

    #[test]
    fn backward_interval_is_illegal() {
        let mut service = Rk4::default();
        let mut evaluator: Evaluator<'_> = Native::new(|_, _, dy, _| dy[0] = 1.0).into();

        let out = advance(
            &mut service,
            SolverKind::Switching,
            &mut evaluator,
            &mut workspace(),
            &mut [0.0],
            &mut RootRecord::new(0),
            (1.0, 1.0),
        );

        assert_eq!(out.status, -3);
    }

    #[test]
    fn locates_root_by_bisection() {
        let mut service = Rk4::new(0.3, 500).unwrap();
        let mut evaluator: Evaluator<'_> = Native::new(|_, _, dy, _| dy[0] = -1.0)
            .with_roots(2, |_, y, g| {
                g[0] = y[0] + 5.0;
                g[1] = y[0];
            })
            .into();
        let mut ws = workspace();
        let mut y = [1.0];
        let mut roots = RootRecord::new(2);

        let out = advance(
            &mut service,
            SolverKind::RootFinding,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut roots,
            (0.0, 3.0),
        );

        assert_eq!(out.status, 3);
        assert_relative_eq!(out.time, 1.0, epsilon = 1e-9);
        assert_eq!(roots.triggered(), vec![1]);
        assert!(y[0] <= 0.0);
    }

    #[test]
    fn restart_after_a_root_does_not_report_it_again() {
        let mut service = Rk4::new(0.3, 500).unwrap();
        let mut evaluator: Evaluator<'_> = Native::new(|_, y, dy, _| {
            dy[0] = y[1];
            dy[1] = 0.0;
        })
        .with_roots(1, |_, y, g| g[0] = y[0])
        .into();
        let mut ws = workspace();
        let mut y = [1.0, -1.0];
        let mut roots = RootRecord::new(1);

        let hit = advance(
            &mut service,
            SolverKind::RootFinding,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut roots,
            (0.0, 3.0),
        );
        assert_eq!(hit.status, 3);
        assert!(y[0] <= 0.0);

        // Only the direction changes; the position stays just past the root.
        y[1] = 1.0;
        roots.clear();
        let out = advance(
            &mut service,
            SolverKind::RootFinding,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut roots,
            (hit.time, 3.0),
        );

        assert_eq!(out.status, 2);
        assert!(!roots.any());
        assert_relative_eq!(y[0], 3.0 - hit.time, epsilon = 1e-9);
    }

    #[test]
    fn masked_roots_are_watched_again_after_one_step() {
        let mut service = Rk4::new(0.25, 500).unwrap();
        let mut evaluator: Evaluator<'_> = Native::new(|_, y, dy, _| {
            dy[0] = y[1];
            dy[1] = 0.0;
        })
        .with_roots(1, |_, y, g| g[0] = y[0] * (y[0] - 1.0))
        .into();
        let mut ws = workspace();
        let mut y = [0.5, -1.0];
        let mut roots = RootRecord::new(1);

        let hit = advance(
            &mut service,
            SolverKind::RootFinding,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut roots,
            (0.0, 3.0),
        );
        assert_relative_eq!(hit.time, 0.5, epsilon = 1e-9);

        y[1] = 1.0;
        roots.clear();
        let out = advance(
            &mut service,
            SolverKind::RootFinding,
            &mut evaluator,
            &mut ws,
            &mut y,
            &mut roots,
            (hit.time, 3.0),
        );

        assert_eq!(out.status, 3);
        assert_relative_eq!(out.time, 1.5, epsilon = 1e-9);
        assert_eq!(roots.triggered(), vec![0]);
    }

    #[test]
    fn roots_ignored_by_other_kinds() {
        let mut service = Rk4::default();
        let mut evaluator: Evaluator<'_> = Native::new(|_, _, dy, _| dy[0] = -1.0)
            .with_roots(1, |_, y, g| g[0] = y[0])
            .into();
        let mut roots = RootRecord::new(1);

        let out = advance(
            &mut service,
            SolverKind::Switching,
            &mut evaluator,
            &mut workspace(),
            &mut [1.0],
            &mut roots,
            (0.0, 3.0),
        );

        assert_eq!(out.status, 2);
        assert!(!roots.any());
    }

    #[test]
    fn rejects_bad_config() {
        assert_eq!(Rk4::new(0.0, 10), Err(ConfigError::Step));
        assert_eq!(Rk4::new(f64::NAN, 10), Err(ConfigError::Step));
        assert_eq!(Rk4::new(0.1, 0), Err(ConfigError::Budget));
    }
}
