//! Reusable observers for Lode integration sessions.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with the session driver's events.
//!
//! # Modules
//!
//! - [`traits`] — capability traits ([`HasTime`], [`IsWarning`],
//!   [`CanStopEarly`])
//! - [`LogObserver`] — forwards session events to the `log` facade
//! - [`Recorder`] — keeps an owned record of every event
//! - [`StopAt`] and [`WarningLimit`] — generic stop conditions
//!
//! [`Observer`]: lode_core::Observer
//! [`HasTime`]: traits::HasTime
//! [`IsWarning`]: traits::IsWarning
//! [`CanStopEarly`]: traits::CanStopEarly

mod logging;
mod recorder;
mod stop;
pub mod traits;

pub use logging::LogObserver;
pub use recorder::{Record, Recorder};
pub use stop::{StopAt, WarningLimit};
