//! Evaluation adapters: how a solver service reaches the caller's equations.
//!
//! An [`Evaluator`] is chosen once per session and invoked uniformly after
//! that. It comes in two variants:
//!
//! - [`Native`] callbacks write straight into the solver's buffers and cannot
//!   fail. They may carry a forcing hook that runs before each derivative call.
//! - [`Interpreted`] callbacks return freshly allocated vectors, may fail, and
//!   have their results length-checked before being copied into the buffers.
//!
//! Only the derivative is mandatory. Jacobian, jacobian-column and root
//! functions are optional capabilities; calling a missing one yields
//! [`AdapterError::Unsupported`].

use std::error::Error as StdError;

use thiserror::Error;

/// A boxed error returned by an interpreted callback.
pub type CallbackError = Box<dyn StdError + Send + Sync>;

/// Errors raised while evaluating a callback.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{which} callback failed: {source}")]
    Callback {
        which: &'static str,
        #[source]
        source: CallbackError,
    },

    #[error("{which} callback returned {got} values, expected {expected}")]
    Length {
        which: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("evaluator does not provide a {0} callback")]
    Unsupported(&'static str),
}

/// Band structure of a jacobian block requested by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banding {
    /// Number of sub-diagonals.
    pub lower: usize,
    /// Number of super-diagonals.
    pub upper: usize,
    /// Rows in the column-major output block.
    pub rows: usize,
}

impl Banding {
    /// A full (dense) `n`×`n` block.
    #[must_use]
    pub fn dense(n: usize) -> Self {
        Self {
            lower: n.saturating_sub(1),
            upper: n.saturating_sub(1),
            rows: n,
        }
    }
}

/// The derivative and auxiliary outputs returned by an interpreted callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rates {
    pub rates: Vec<f64>,
    pub aux: Vec<f64>,
}

impl From<Vec<f64>> for Rates {
    fn from(rates: Vec<f64>) -> Self {
        Self {
            rates,
            aux: Vec::new(),
        }
    }
}

type NativeDerivative<'a> = Box<dyn FnMut(f64, &[f64], &mut [f64], &mut [f64]) + 'a>;
type NativeJacobian<'a> = Box<dyn FnMut(f64, &[f64], Banding, &mut [f64]) + 'a>;
type NativeColumn<'a> = Box<dyn FnMut(f64, &[f64], usize, &mut [f64]) + 'a>;
type NativeRoots<'a> = Box<dyn FnMut(f64, &[f64], &mut [f64]) + 'a>;

/// Callbacks that write into caller-provided buffers.
pub struct Native<'a> {
    derivative: NativeDerivative<'a>,
    jacobian: Option<NativeJacobian<'a>>,
    jacobian_column: Option<NativeColumn<'a>>,
    roots: Option<(usize, NativeRoots<'a>)>,
    forcing: Option<Box<dyn FnMut(f64) + 'a>>,
    aux_count: usize,
}

impl<'a> Native<'a> {
    /// Creates native callbacks from a derivative `f(t, y, dy, aux)`.
    pub fn new(derivative: impl FnMut(f64, &[f64], &mut [f64], &mut [f64]) + 'a) -> Self {
        Self {
            derivative: Box::new(derivative),
            jacobian: None,
            jacobian_column: None,
            roots: None,
            forcing: None,
            aux_count: 0,
        }
    }

    /// Declares how many auxiliary outputs the derivative writes.
    #[must_use]
    pub fn with_aux(mut self, count: usize) -> Self {
        self.aux_count = count;
        self
    }

    /// Adds a jacobian `f(t, y, banding, block)` writing a column-major block.
    #[must_use]
    pub fn with_jacobian(mut self, f: impl FnMut(f64, &[f64], Banding, &mut [f64]) + 'a) -> Self {
        self.jacobian = Some(Box::new(f));
        self
    }

    /// Adds a jacobian-column callback `f(t, y, j, column)`.
    #[must_use]
    pub fn with_jacobian_column(
        mut self,
        f: impl FnMut(f64, &[f64], usize, &mut [f64]) + 'a,
    ) -> Self {
        self.jacobian_column = Some(Box::new(f));
        self
    }

    /// Adds `count` root functions evaluated by `f(t, y, g)`.
    #[must_use]
    pub fn with_roots(mut self, count: usize, f: impl FnMut(f64, &[f64], &mut [f64]) + 'a) -> Self {
        self.roots = Some((count, Box::new(f)));
        self
    }

    /// Adds a forcing update run before every derivative call.
    #[must_use]
    pub fn with_forcing(mut self, f: impl FnMut(f64) + 'a) -> Self {
        self.forcing = Some(Box::new(f));
        self
    }
}

type InterpretedDerivative<'a> = Box<dyn FnMut(f64, &[f64]) -> Result<Rates, CallbackError> + 'a>;
type InterpretedJacobian<'a> =
    Box<dyn FnMut(f64, &[f64], Banding) -> Result<Vec<f64>, CallbackError> + 'a>;
type InterpretedColumn<'a> =
    Box<dyn FnMut(f64, &[f64], usize) -> Result<Vec<f64>, CallbackError> + 'a>;
type InterpretedRoots<'a> = Box<dyn FnMut(f64, &[f64]) -> Result<Vec<f64>, CallbackError> + 'a>;

/// Callbacks that return owned values and may fail.
pub struct Interpreted<'a> {
    derivative: InterpretedDerivative<'a>,
    jacobian: Option<InterpretedJacobian<'a>>,
    jacobian_column: Option<InterpretedColumn<'a>>,
    roots: Option<(usize, InterpretedRoots<'a>)>,
    aux_count: usize,
}

impl<'a> Interpreted<'a> {
    /// Creates interpreted callbacks from a derivative `f(t, y) -> Rates`.
    pub fn new(derivative: impl FnMut(f64, &[f64]) -> Result<Rates, CallbackError> + 'a) -> Self {
        Self {
            derivative: Box::new(derivative),
            jacobian: None,
            jacobian_column: None,
            roots: None,
            aux_count: 0,
        }
    }

    /// Declares how many auxiliary outputs the derivative returns.
    #[must_use]
    pub fn with_aux(mut self, count: usize) -> Self {
        self.aux_count = count;
        self
    }

    #[must_use]
    pub fn with_jacobian(
        mut self,
        f: impl FnMut(f64, &[f64], Banding) -> Result<Vec<f64>, CallbackError> + 'a,
    ) -> Self {
        self.jacobian = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_jacobian_column(
        mut self,
        f: impl FnMut(f64, &[f64], usize) -> Result<Vec<f64>, CallbackError> + 'a,
    ) -> Self {
        self.jacobian_column = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_roots(
        mut self,
        count: usize,
        f: impl FnMut(f64, &[f64]) -> Result<Vec<f64>, CallbackError> + 'a,
    ) -> Self {
        self.roots = Some((count, Box::new(f)));
        self
    }
}

/// The evaluation adapter handed to a solver service.
pub enum Evaluator<'a> {
    Native(Native<'a>),
    Interpreted(Interpreted<'a>),
}

impl<'a> From<Native<'a>> for Evaluator<'a> {
    fn from(native: Native<'a>) -> Self {
        Self::Native(native)
    }
}

impl<'a> From<Interpreted<'a>> for Evaluator<'a> {
    fn from(interpreted: Interpreted<'a>) -> Self {
        Self::Interpreted(interpreted)
    }
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("variant", &self.variant())
            .field("aux_count", &self.aux_count())
            .field("root_count", &self.root_count())
            .field("has_jacobian", &self.has_jacobian())
            .field("has_jacobian_column", &self.has_jacobian_column())
            .finish()
    }
}

impl Evaluator<'_> {
    /// Returns `"native"` or `"interpreted"`.
    #[must_use]
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::Interpreted(_) => "interpreted",
        }
    }

    #[must_use]
    pub fn aux_count(&self) -> usize {
        match self {
            Self::Native(n) => n.aux_count,
            Self::Interpreted(i) => i.aux_count,
        }
    }

    #[must_use]
    pub fn root_count(&self) -> usize {
        match self {
            Self::Native(n) => n.roots.as_ref().map_or(0, |(count, _)| *count),
            Self::Interpreted(i) => i.roots.as_ref().map_or(0, |(count, _)| *count),
        }
    }

    #[must_use]
    pub fn has_jacobian(&self) -> bool {
        match self {
            Self::Native(n) => n.jacobian.is_some(),
            Self::Interpreted(i) => i.jacobian.is_some(),
        }
    }

    #[must_use]
    pub fn has_jacobian_column(&self) -> bool {
        match self {
            Self::Native(n) => n.jacobian_column.is_some(),
            Self::Interpreted(i) => i.jacobian_column.is_some(),
        }
    }

    /// Evaluates the derivative at `(t, y)` into `dy`, and auxiliary outputs
    /// into `aux`.
    ///
    /// # Errors
    ///
    /// Returns an error if an interpreted callback fails or returns vectors of
    /// the wrong length.
    pub fn derivative(
        &mut self,
        t: f64,
        y: &[f64],
        dy: &mut [f64],
        aux: &mut [f64],
    ) -> Result<(), AdapterError> {
        match self {
            Self::Native(n) => {
                if let Some(forcing) = n.forcing.as_mut() {
                    forcing(t);
                }
                (n.derivative)(t, y, dy, aux);
                Ok(())
            }
            Self::Interpreted(i) => {
                let out = (i.derivative)(t, y).map_err(|source| AdapterError::Callback {
                    which: "derivative",
                    source,
                })?;
                copy_checked("derivative", &out.rates, dy)?;
                if !aux.is_empty() {
                    copy_checked("auxiliary output", &out.aux, aux)?;
                }
                Ok(())
            }
        }
    }

    /// Evaluates the jacobian block at `(t, y)` into `block`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] if no jacobian was provided, or a
    /// callback or length error from an interpreted callback.
    pub fn jacobian(
        &mut self,
        t: f64,
        y: &[f64],
        banding: Banding,
        block: &mut [f64],
    ) -> Result<(), AdapterError> {
        match self {
            Self::Native(n) => {
                let f = n
                    .jacobian
                    .as_mut()
                    .ok_or(AdapterError::Unsupported("jacobian"))?;
                f(t, y, banding, block);
                Ok(())
            }
            Self::Interpreted(i) => {
                let f = i
                    .jacobian
                    .as_mut()
                    .ok_or(AdapterError::Unsupported("jacobian"))?;
                let out = f(t, y, banding).map_err(|source| AdapterError::Callback {
                    which: "jacobian",
                    source,
                })?;
                copy_checked("jacobian", &out, block)
            }
        }
    }

    /// Evaluates column `j` of the jacobian at `(t, y)` into `column`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] if no column callback was
    /// provided, or a callback or length error from an interpreted callback.
    pub fn jacobian_column(
        &mut self,
        t: f64,
        y: &[f64],
        j: usize,
        column: &mut [f64],
    ) -> Result<(), AdapterError> {
        match self {
            Self::Native(n) => {
                let f = n
                    .jacobian_column
                    .as_mut()
                    .ok_or(AdapterError::Unsupported("jacobian column"))?;
                f(t, y, j, column);
                Ok(())
            }
            Self::Interpreted(i) => {
                let f = i
                    .jacobian_column
                    .as_mut()
                    .ok_or(AdapterError::Unsupported("jacobian column"))?;
                let out = f(t, y, j).map_err(|source| AdapterError::Callback {
                    which: "jacobian column",
                    source,
                })?;
                copy_checked("jacobian column", &out, column)
            }
        }
    }

    /// Evaluates the root functions at `(t, y)` into `g`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] if no root functions were
    /// provided, or a callback or length error from an interpreted callback.
    pub fn roots(&mut self, t: f64, y: &[f64], g: &mut [f64]) -> Result<(), AdapterError> {
        match self {
            Self::Native(n) => {
                let (_, f) = n
                    .roots
                    .as_mut()
                    .ok_or(AdapterError::Unsupported("root function"))?;
                f(t, y, g);
                Ok(())
            }
            Self::Interpreted(i) => {
                let (_, f) = i
                    .roots
                    .as_mut()
                    .ok_or(AdapterError::Unsupported("root function"))?;
                let out = f(t, y).map_err(|source| AdapterError::Callback {
                    which: "root function",
                    source,
                })?;
                copy_checked("root function", &out, g)
            }
        }
    }
}

fn copy_checked(which: &'static str, src: &[f64], dst: &mut [f64]) -> Result<(), AdapterError> {
    if src.len() != dst.len() {
        return Err(AdapterError::Length {
            which,
            expected: dst.len(),
            got: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use approx::assert_relative_eq;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("host evaluation failed")]
    struct HostError;

    fn decay(_t: f64, y: &[f64], dy: &mut [f64], aux: &mut [f64]) {
        dy[0] = -y[0];
        if let Some(a) = aux.first_mut() {
            *a = y[0] * 2.0;
        }
    }

    #[test]
    fn native_writes_buffers_and_runs_forcing() {
        let forced_at = Cell::new(f64::NAN);
        let mut eval = Evaluator::from(
            Native::new(decay)
                .with_aux(1)
                .with_forcing(|t| forced_at.set(t)),
        );

        let (mut dy, mut aux) = ([0.0], [0.0]);
        eval.derivative(1.5, &[3.0], &mut dy, &mut aux).unwrap();

        assert_relative_eq!(dy[0], -3.0);
        assert_relative_eq!(aux[0], 6.0);
        assert_relative_eq!(forced_at.get(), 1.5);
        assert_eq!(eval.variant(), "native");
    }

    #[test]
    fn interpreted_checks_lengths() {
        let mut eval = Evaluator::from(Interpreted::new(|_, _| Ok(vec![1.0, 2.0].into())));

        let mut dy = [0.0];
        let err = eval.derivative(0.0, &[1.0], &mut dy, &mut []).unwrap_err();

        assert!(matches!(
            err,
            AdapterError::Length {
                which: "derivative",
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn interpreted_failures_are_reported() {
        let mut eval = Evaluator::from(Interpreted::new(|_, _| Err(HostError.into())));

        let err = eval
            .derivative(0.0, &[1.0], &mut [0.0], &mut [])
            .unwrap_err();

        assert!(matches!(err, AdapterError::Callback { which: "derivative", .. }));
    }

    #[test]
    fn missing_capabilities_are_unsupported() {
        let mut eval = Evaluator::from(Native::new(decay));

        assert!(!eval.has_jacobian());
        assert_eq!(eval.root_count(), 0);
        assert!(matches!(
            eval.jacobian(0.0, &[1.0], Banding::dense(1), &mut [0.0]),
            Err(AdapterError::Unsupported("jacobian"))
        ));
        assert!(matches!(
            eval.roots(0.0, &[1.0], &mut []),
            Err(AdapterError::Unsupported("root function"))
        ));
    }

    #[test]
    fn optional_callbacks_are_forwarded() {
        let mut eval = Evaluator::from(
            Interpreted::new(|_, y| Ok(vec![-y[0]].into()))
                .with_jacobian(|_, _, _| Ok(vec![-1.0]))
                .with_jacobian_column(|_, _, j| Ok(vec![j as f64]))
                .with_roots(1, |_, y| Ok(vec![y[0] - 0.5])),
        );

        let mut block = [0.0];
        eval.jacobian(0.0, &[1.0], Banding::dense(1), &mut block).unwrap();
        assert_relative_eq!(block[0], -1.0);

        let mut column = [0.0];
        eval.jacobian_column(0.0, &[1.0], 0, &mut column).unwrap();
        assert_relative_eq!(column[0], 0.0);

        let mut g = [0.0];
        eval.roots(0.0, &[2.0], &mut g).unwrap();
        assert_relative_eq!(g[0], 1.5);
        assert_eq!(eval.root_count(), 1);
    }
}
