use lode_core::SolverKind;

/// Status code a root-finding service returns when it stops on a crossing.
pub(crate) const ROOT_SENTINEL: i32 = 3;

/// What a solver status code means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The call succeeded.
    Success,
    /// The call stopped on a root crossing.
    RootFound,
    /// The step budget ran out before the output time.
    StepLimit,
    /// The tolerances are tighter than machine precision allows.
    ExcessivePrecision,
    /// Repeated error-test failures, often a singularity.
    ErrorTestFailures,
    /// Repeated corrector convergence failures, often a poor jacobian.
    ConvergenceFailures,
    /// A component vanished under pure relative error control.
    VanishedComponent,
    /// The input was rejected, or the code is not recognized.
    FatalInput,
}

impl Outcome {
    /// Returns whether the driver reports this outcome as a warning.
    #[must_use]
    pub fn is_warning(self) -> bool {
        !matches!(self, Self::Success | Self::RootFound | Self::FatalInput)
    }
}

/// The interpretation of one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub code: i32,
    pub outcome: Outcome,
    pub message: &'static str,
    pub scale_tolerances: bool,
}

/// Interprets a raw status code returned by a service of the given kind.
///
/// Positive codes are successes, except the root sentinel for
/// [`SolverKind::RootFinding`]. Zero and unknown negative codes are fatal so a
/// session never continues on a status it does not understand.
#[must_use]
pub fn interpret(code: i32, kind: SolverKind) -> Verdict {
    let (outcome, message) = match code {
        ROOT_SENTINEL if kind.finds_roots() => (Outcome::RootFound, "root function crossed zero"),
        c if c > 0 => (Outcome::Success, "integration successful"),
        -1 => (
            Outcome::StepLimit,
            "step budget exhausted before reaching the output time; raise the maximum step count",
        ),
        -2 => (
            Outcome::ExcessivePrecision,
            "excessive precision requested; tolerances will be scaled up",
        ),
        -3 => (
            Outcome::FatalInput,
            "illegal input detected before taking any integration steps",
        ),
        -4 => (
            Outcome::ErrorTestFailures,
            "repeated error test failures on a step; possible singularity",
        ),
        -5 => (
            Outcome::ConvergenceFailures,
            "repeated convergence test failures on a step; inaccurate jacobian?",
        ),
        -6 => (
            Outcome::VanishedComponent,
            "error weight became zero for a component under pure relative tolerance",
        ),
        _ => (Outcome::FatalInput, "unrecognized solver status code"),
    };

    Verdict {
        code,
        outcome,
        message,
        scale_tolerances: outcome == Outcome::ExcessivePrecision,
    }
}
