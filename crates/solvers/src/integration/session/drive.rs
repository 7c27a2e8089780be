use lode_core::{
    CallMode, Cause, Evaluator, EventHandler, Observer, Problem, Request, Resume, SolverService,
    Task, workspace::slot,
};

use crate::integration::{Outcome, Verdict, interpret};

use super::{
    Action, Config, Error, Event, Setup, Solution, Status, Trigger, solution::Reason, state::State,
};

/// The output time an interval aims for and how the solver may approach it.
#[derive(Clone, Copy)]
struct Target {
    t_out: f64,
    task: Task,
    ceiling: usize,
}

/// How the solver calls for one interval ended.
enum Finish {
    /// The output time was reached.
    Reached,
    /// The session ends here with a row at the time reached.
    Stop(Status),
}

pub(super) fn drive<S, H, Obs>(
    service: &mut S,
    evaluator: &mut Evaluator<'_>,
    mut events: H,
    problem: &Problem,
    setup: &Setup,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    S: SolverService,
    H: EventHandler,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let times = problem.times();
    let events_enabled = events.is_enabled();
    let ceiling = config.ceiling(events_enabled);
    let layout = config.diagnostics();

    let mut state = State::new(problem, setup, evaluator)?;

    log::info!(
        "session start: {:?}, {} equations, {} output times, {:?} tolerances",
        setup.kind(),
        problem.equations(),
        times.len(),
        state.tolerances.mode()
    );

    state.push_row(evaluator)?;
    if stop_requested(&mut observer, &state, 0) {
        return Ok(state.into_solution(Status::StoppedByObserver, layout));
    }

    for (index, window) in times.windows(2).enumerate() {
        let t_out = window[1];
        state.retries = 0;

        let task = if events_enabled {
            state.workspace.set_real(slot::CRITICAL_TIME, t_out);
            match events
                .maybe_apply(Cause::Boundary, state.time, &mut state.y)
                .map_err(Error::event)?
            {
                Resume::Unchanged => {}
                Resume::Restart => {
                    state.mode = CallMode::Start;
                    let event = Event::EventApplied {
                        time: state.time,
                        trigger: Trigger::Boundary,
                    };
                    if let Some(Action::StopEarly) = observer.observe(&event) {
                        return Ok(state.into_solution(Status::StoppedByObserver, layout));
                    }
                }
                Resume::Halt => {
                    log::info!("event handler halted the session at t={}", state.time);
                    let status = Status::Halted { time: state.time };
                    return Ok(state.into_solution(status, layout));
                }
            }
            Task::Critical(t_out)
        } else {
            Task::Normal
        };

        let target = Target {
            t_out,
            task,
            ceiling,
        };
        let finish = advance_interval(
            service,
            evaluator,
            &mut events,
            &mut observer,
            &mut state,
            target,
            config,
        )?;

        state.push_row(evaluator)?;

        match finish {
            Finish::Reached => {
                state.intervals += 1;
                log::debug!("reached t={} ({} of {})", state.time, index + 1, times.len() - 1);
                if stop_requested(&mut observer, &state, index + 1) {
                    return Ok(state.into_solution(Status::StoppedByObserver, layout));
                }
            }
            Finish::Stop(status) => {
                log::warn!(
                    "session stopped early at t={} before reaching t={t_out}: {status:?}",
                    state.time
                );
                // The observer still sees the final row; its answer cannot
                // change the outcome.
                stop_requested(&mut observer, &state, index + 1);
                return Ok(state.into_solution(status, layout));
            }
        }
    }

    log::info!(
        "session complete at t={} after {} escalations",
        state.time,
        state.escalations
    );
    Ok(state.into_solution(Status::Complete, layout))
}

/// Calls the solver until it reaches the target or the interval must end.
fn advance_interval<S, H, Obs>(
    service: &mut S,
    evaluator: &mut Evaluator<'_>,
    events: &mut H,
    observer: &mut Obs,
    state: &mut State,
    target: Target,
    config: &Config,
) -> Result<Finish, Error>
where
    S: SolverService,
    H: EventHandler,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let Target {
        t_out,
        task,
        ceiling,
    } = target;

    loop {
        let advance = service.advance(
            Request {
                kind: state.kind,
                t_in: state.time,
                t_out,
                state: &mut state.y,
                tolerances: &state.tolerances,
                mode: state.mode,
                task,
                optional_inputs: state.optional_inputs,
                roots: &mut state.roots,
            },
            evaluator,
            &mut state.workspace,
        )?;
        state.time = advance.time;
        state.status = advance.status;

        let verdict = interpret(advance.status, state.kind);

        match verdict.outcome {
            Outcome::Success if state.time >= t_out => {
                state.mode = CallMode::Continue;
                return Ok(Finish::Reached);
            }
            Outcome::Success => state.mode = CallMode::Continue,

            Outcome::FatalInput => {
                log::error!("{} (status {})", verdict.message, verdict.code);
                return Err(Error::FatalInput {
                    code: verdict.code,
                    message: verdict.message,
                    time: state.time,
                });
            }

            Outcome::StepLimit => {
                if warn(observer, state, verdict) {
                    return Ok(Finish::Stop(Status::StoppedByObserver));
                }
                return Ok(Finish::Stop(Status::StoppedOnError(Reason::StepLimit)));
            }

            Outcome::VanishedComponent => {
                if warn(observer, state, verdict) {
                    return Ok(Finish::Stop(Status::StoppedByObserver));
                }
                return Ok(Finish::Stop(Status::StoppedOnError(
                    Reason::VanishedComponent,
                )));
            }

            Outcome::ExcessivePrecision
            | Outcome::ErrorTestFailures
            | Outcome::ConvergenceFailures => {
                if warn(observer, state, verdict) {
                    return Ok(Finish::Stop(Status::StoppedByObserver));
                }
                if verdict.scale_tolerances {
                    let factor = config.escalation_factor();
                    if state.tolerances.escalate(factor) {
                        state.escalations += 1;
                    }
                    let event = Event::Escalated {
                        time: state.time,
                        factor,
                        cumulative: factor
                            .powi(i32::try_from(state.escalations).unwrap_or(i32::MAX)),
                        tolerances: &state.tolerances,
                    };
                    if let Some(Action::StopEarly) = observer.observe(&event) {
                        return Ok(Finish::Stop(Status::StoppedByObserver));
                    }
                    state.mode = CallMode::Reconfigured;
                } else {
                    state.mode = CallMode::Continue;
                }
            }

            Outcome::RootFound => {
                let roots = state.roots.triggered();
                log::info!("root crossing at t={}: {roots:?}", state.time);
                let event = Event::Root {
                    time: state.time,
                    roots: &roots,
                };
                if let Some(Action::StopEarly) = observer.observe(&event) {
                    return Ok(Finish::Stop(Status::StoppedByObserver));
                }

                let resume = if events.is_enabled() && events.handles_roots() {
                    events
                        .maybe_apply(Cause::Root(&state.roots), state.time, &mut state.y)
                        .map_err(Error::event)?
                } else {
                    Resume::Unchanged
                };

                if resume != Resume::Restart {
                    return Ok(Finish::Stop(Status::StoppedOnRoot {
                        time: state.time,
                        roots,
                    }));
                }

                state.roots.clear();
                state.retries = 0;
                state.mode = CallMode::Start;
                let event = Event::EventApplied {
                    time: state.time,
                    trigger: Trigger::Root,
                };
                if let Some(Action::StopEarly) = observer.observe(&event) {
                    return Ok(Finish::Stop(Status::StoppedByObserver));
                }
                if state.time >= t_out {
                    return Ok(Finish::Reached);
                }
                continue;
            }
        }

        state.retries += 1;
        if state.retries >= ceiling {
            log::warn!(
                "giving up on the interval ending at t={t_out} after {} solver calls",
                state.retries
            );
            return Ok(Finish::Stop(Status::StoppedOnError(
                Reason::RetriesExhausted {
                    last: verdict.outcome,
                },
            )));
        }
    }
}

/// Logs a solver warning and reports it to the observer.
///
/// Returns whether the observer asked to stop.
fn warn<Obs>(observer: &mut Obs, state: &State, verdict: Verdict) -> bool
where
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    log::warn!(
        "t={}: {} (status {}, call {})",
        state.time,
        verdict.message,
        verdict.code,
        state.retries + 1
    );
    let event = Event::Warning {
        time: state.time,
        verdict,
        retries: state.retries,
    };
    matches!(observer.observe(&event), Some(Action::StopEarly))
}

/// Emits the latest row and returns whether the observer asked to stop.
fn stop_requested<Obs>(observer: &mut Obs, state: &State, index: usize) -> bool
where
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    state.last_row().is_some_and(|row| {
        let event = Event::Interval { index, row };
        matches!(observer.observe(&event), Some(Action::StopEarly))
    })
}
