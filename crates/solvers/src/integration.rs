//! Integration sessions: advancing an initial value problem through a list of
//! output times with an external [`SolverService`].
//!
//! # Modules
//!
//! - [`session`] — the driver: retries, tolerance escalation, events, roots
//! - [`rk4`] — a fixed-step classical Runge-Kutta service
//!
//! The [`interpret`] function maps a service's raw status code onto an
//! [`Outcome`] that the driver acts on.
//!
//! [`SolverService`]: lode_core::SolverService

mod status;

pub use status::{Outcome, Verdict, interpret};

pub mod rk4;
pub mod session;
