use thiserror::Error;

/// A tolerance given either once for every component or once per component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(untagged))]
pub enum Tolerance {
    Scalar(f64),
    PerComponent(Vec<f64>),
}

impl Tolerance {
    /// Returns the tolerance that applies to component `index`.
    ///
    /// A per-component tolerance shorter than `index` yields `None`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::PerComponent(values) => values.get(index).copied(),
        }
    }

    /// Returns every stored value.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::PerComponent(values) => values,
        }
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    fn scale(&mut self, factor: f64) {
        match self {
            Self::Scalar(value) => *value *= factor,
            Self::PerComponent(values) => values.iter_mut().for_each(|v| *v *= factor),
        }
    }
}

impl From<f64> for Tolerance {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Tolerance {
    fn from(values: Vec<f64>) -> Self {
        Self::PerComponent(values)
    }
}

/// How relative and absolute tolerances are shaped.
///
/// The discriminants are the codes a solver service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceMode {
    /// Scalar relative, scalar absolute.
    ScalarScalar = 1,
    /// Scalar relative, per-component absolute.
    ScalarVector = 2,
    /// Per-component relative, scalar absolute.
    VectorScalar = 3,
    /// Per-component relative and absolute.
    VectorVector = 4,
}

/// Errors raised when tolerances do not fit the problem.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToleranceError {
    #[error("{which} tolerance has {len} components but the problem has {equations} equations")]
    Length {
        which: &'static str,
        len: usize,
        equations: usize,
    },

    #[error("{which} tolerance must be finite and non-negative, got {value}")]
    Value { which: &'static str, value: f64 },
}

/// Relative and absolute error tolerances for one session.
///
/// Tolerances only ever grow during a session: [`Tolerances::escalate`] is the
/// single mutation and it rejects factors below one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde-derive",
    serde(try_from = "TolerancesFile", into = "TolerancesFile")
)]
pub struct Tolerances {
    relative: Tolerance,
    absolute: Tolerance,
}

impl Tolerances {
    /// Creates tolerances from relative and absolute parts.
    pub fn new(relative: impl Into<Tolerance>, absolute: impl Into<Tolerance>) -> Self {
        Self {
            relative: relative.into(),
            absolute: absolute.into(),
        }
    }

    /// Checks the tolerances against an equation count.
    ///
    /// # Errors
    ///
    /// Returns an error if a per-component tolerance has the wrong length or
    /// any value is negative or non-finite.
    pub fn validate(&self, equations: usize) -> Result<(), ToleranceError> {
        for (which, tol) in self.parts() {
            if let Tolerance::PerComponent(values) = tol {
                if values.len() != equations {
                    return Err(ToleranceError::Length {
                        which,
                        len: values.len(),
                        equations,
                    });
                }
            }
        }
        self.check_values()
    }

    /// Checks that every value is finite and non-negative.
    fn check_values(&self) -> Result<(), ToleranceError> {
        for (which, tol) in self.parts() {
            if let Some(&value) = tol.values().iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(ToleranceError::Value { which, value });
            }
        }
        Ok(())
    }

    fn parts(&self) -> [(&'static str, &Tolerance); 2] {
        [("relative", &self.relative), ("absolute", &self.absolute)]
    }

    #[must_use]
    pub fn relative(&self) -> &Tolerance {
        &self.relative
    }

    #[must_use]
    pub fn absolute(&self) -> &Tolerance {
        &self.absolute
    }

    /// Returns the shape code of this pair.
    #[must_use]
    pub fn mode(&self) -> ToleranceMode {
        match (self.relative.is_scalar(), self.absolute.is_scalar()) {
            (true, true) => ToleranceMode::ScalarScalar,
            (true, false) => ToleranceMode::ScalarVector,
            (false, true) => ToleranceMode::VectorScalar,
            (false, false) => ToleranceMode::VectorVector,
        }
    }

    /// Multiplies every relative and absolute component by `factor`.
    ///
    /// Factors below one (or non-finite) are ignored so tolerances never
    /// shrink. Returns whether the tolerances changed.
    pub fn escalate(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor < 1.0 {
            return false;
        }
        self.relative.scale(factor);
        self.absolute.scale(factor);
        true
    }
}

/// Unvalidated tolerances as read from a settings file.
#[cfg(feature = "serde-derive")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct TolerancesFile {
    relative: Tolerance,
    absolute: Tolerance,
}

#[cfg(feature = "serde-derive")]
impl From<Tolerances> for TolerancesFile {
    fn from(tol: Tolerances) -> Self {
        Self {
            relative: tol.relative,
            absolute: tol.absolute,
        }
    }
}

#[cfg(feature = "serde-derive")]
impl TryFrom<TolerancesFile> for Tolerances {
    type Error = ToleranceError;

    fn try_from(file: TolerancesFile) -> Result<Self, ToleranceError> {
        let tol = Tolerances::new(file.relative, file.absolute);
        tol.check_values()?;
        Ok(tol)
    }
}
