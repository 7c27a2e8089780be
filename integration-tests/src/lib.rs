//! Shared models and scenario files for end-to-end session tests.

use serde::Deserialize;
use thiserror::Error;

use lode_core::{Native, Problem, ProblemError, Schedule, Scheduled, Tolerances};
use lode_solvers::integration::session::{Config, Setup};

/// Gravitational acceleration used by the falling-ball model.
pub const GRAVITY: f64 = 9.81;

/// `dy/dt = -rate * y` for every component.
pub fn decay<'a>(rate: f64) -> Native<'a> {
    Native::new(move |_t, y, dy, _aux| {
        for (d, yi) in dy.iter_mut().zip(y) {
            *d = -rate * yi;
        }
    })
}

/// A ball in free fall: `y = [height, velocity]`, with a root at the ground.
pub fn falling_ball<'a>() -> Native<'a> {
    Native::new(|_t, y, dy, _aux| {
        dy[0] = y[1];
        dy[1] = -GRAVITY;
    })
    .with_roots(1, |_t, y, g| g[0] = y[0])
}

/// A settings file describing one complete session.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub initial: Vec<f64>,
    pub times: Vec<f64>,
    pub tolerances: Tolerances,
    pub setup: Setup,
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub events: Vec<Scheduled>,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid TOML scenario")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON scenario")]
    Json(#[from] serde_json::Error),

    #[error("invalid problem")]
    Problem(#[from] ProblemError),
}

impl Scenario {
    /// Parses a scenario from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scenario.
    pub fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }

    /// Parses a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scenario.
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds the validated problem.
    ///
    /// # Errors
    ///
    /// Returns an error if the state, times, or tolerances are invalid.
    pub fn problem(&self) -> Result<Problem, ScenarioError> {
        Ok(Problem::new(
            self.initial.clone(),
            self.times.clone(),
            self.tolerances.clone(),
        )?)
    }

    /// Returns the scheduled events as a handler.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.events.clone())
    }
}
