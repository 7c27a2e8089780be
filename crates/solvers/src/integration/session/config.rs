use lode_core::DiagnosticLayout;
use thiserror::Error;

/// Configuration for the session driver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde-derive",
    serde(try_from = "ConfigFile", into = "ConfigFile")
)]
pub struct Config {
    escalation_factor: f64,
    retry_ceiling: usize,
    event_retry_ceiling: usize,
    diagnostics: DiagnosticLayout,
}

/// Errors that can occur when validating a session config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("escalation_factor must be finite and at least 1")]
    EscalationFactor,

    #[error("retry ceilings must be at least 1")]
    RetryCeiling,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(10.0, 10, 50).unwrap()
    }
}

impl Config {
    /// Creates a new config with validated limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the escalation factor is below one or non-finite,
    /// or if either retry ceiling is zero.
    pub fn new(
        escalation_factor: f64,
        retry_ceiling: usize,
        event_retry_ceiling: usize,
    ) -> Result<Self, ConfigError> {
        if !escalation_factor.is_finite() || escalation_factor < 1.0 {
            return Err(ConfigError::EscalationFactor);
        }
        if retry_ceiling == 0 || event_retry_ceiling == 0 {
            return Err(ConfigError::RetryCeiling);
        }

        Ok(Self {
            escalation_factor,
            retry_ceiling,
            event_retry_ceiling,
            diagnostics: DiagnosticLayout::default(),
        })
    }

    /// Replaces the workspace slots captured in the diagnostic snapshot.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticLayout) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the factor applied to every tolerance on excessive precision.
    #[must_use]
    pub fn escalation_factor(&self) -> f64 {
        self.escalation_factor
    }

    /// Returns the solver calls allowed per interval without events.
    #[must_use]
    pub fn retry_ceiling(&self) -> usize {
        self.retry_ceiling
    }

    /// Returns the solver calls allowed per interval with an active event handler.
    #[must_use]
    pub fn event_retry_ceiling(&self) -> usize {
        self.event_retry_ceiling
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticLayout {
        &self.diagnostics
    }

    /// Returns the ceiling that applies to a session.
    pub(super) fn ceiling(&self, events_enabled: bool) -> usize {
        if events_enabled {
            self.event_retry_ceiling
        } else {
            self.retry_ceiling
        }
    }
}

/// Unvalidated config as read from a settings file.
#[cfg(feature = "serde-derive")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    escalation_factor: f64,
    retry_ceiling: usize,
    event_retry_ceiling: usize,
    diagnostics: DiagnosticLayout,
}

#[cfg(feature = "serde-derive")]
impl Default for ConfigFile {
    fn default() -> Self {
        Config::default().into()
    }
}

#[cfg(feature = "serde-derive")]
impl From<Config> for ConfigFile {
    fn from(config: Config) -> Self {
        Self {
            escalation_factor: config.escalation_factor,
            retry_ceiling: config.retry_ceiling,
            event_retry_ceiling: config.event_retry_ceiling,
            diagnostics: config.diagnostics,
        }
    }
}

#[cfg(feature = "serde-derive")]
impl TryFrom<ConfigFile> for Config {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, ConfigError> {
        Ok(Config::new(file.escalation_factor, file.retry_ceiling, file.event_retry_ceiling)?
            .with_diagnostics(file.diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.escalation_factor(), 10.0);
        assert_eq!(config.ceiling(false), 10);
        assert_eq!(config.ceiling(true), 50);
    }

    #[test]
    fn rejects_shrinking_factor() {
        assert_eq!(Config::new(0.5, 10, 50), Err(ConfigError::EscalationFactor));
        assert_eq!(
            Config::new(f64::INFINITY, 10, 50),
            Err(ConfigError::EscalationFactor)
        );
    }

    #[test]
    fn rejects_zero_ceiling() {
        assert_eq!(Config::new(10.0, 0, 50), Err(ConfigError::RetryCeiling));
        assert_eq!(Config::new(10.0, 10, 0), Err(ConfigError::RetryCeiling));
    }
}
