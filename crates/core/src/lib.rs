//! Core traits and types for driving ODE solver sessions.
//!
//! This crate defines the shared abstractions that the session driver, solver
//! services, and observers build on:
//!
//! - [`Problem`] — initial state, output times, and tolerances
//! - [`Evaluator`] — the caller's equations, as native or interpreted callbacks
//! - [`SolverService`] — an opaque integrator that advances one interval
//! - [`Workspace`] — the per-session integer and real buffers a service uses
//! - [`EventHandler`] — discrete state changes at boundaries and root crossings
//! - [`Observer`] — receives session events and optionally returns actions
//! - [`Trajectory`] — the rows a session produces

pub mod evaluator;
mod event;
mod observer;
mod problem;
mod service;
mod tolerance;
mod trajectory;
pub mod workspace;

pub use evaluator::{AdapterError, Banding, CallbackError, Evaluator, Interpreted, Native, Rates};
pub use event::{Cause, EventHandler, Method, Resume, Schedule, ScheduleError, Scheduled};
pub use observer::Observer;
pub use problem::{Problem, ProblemError};
pub use service::{Advance, CallMode, Request, RootRecord, SolverKind, SolverService, Task};
pub use tolerance::{Tolerance, ToleranceError, ToleranceMode, Tolerances};
pub use trajectory::{Row, Trajectory};
pub use workspace::{DiagnosticLayout, Diagnostics, Workspace, WorkspaceSize};
