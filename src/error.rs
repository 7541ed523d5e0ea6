//! Errors for problem construction and initialization.

use thiserror::Error;

use crate::{init::Strategy, tolerance::Tolerance, Float};

/// Failures raised at problem construction or during initialization.
///
/// Construction errors are raised before a [`crate::ProblemDefinition`] ever
/// exists; a partially valid problem is never produced. Initialization errors
/// identify the active strategy and carry enough numerical detail to diagnose
/// the failure without re-running.
#[derive(Debug, Error)]
pub enum Error {
    #[error("time span must be strictly increasing (got t0 = {t0}, t1 = {t1})")]
    InvalidTimeSpan { t0: Float, t1: Float },

    #[error("constant lag {index} must be finite and nonnegative (got {lag})")]
    InvalidConstantLag { index: usize, lag: Float },

    #[error("{what}: expected length {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("history function does not implement the {shape} call shape required by the system function")]
    HistoryCapabilityMissing { shape: &'static str },

    #[error("discontinuity order must be finite and >= 0 (got {order})")]
    InvalidDiscontinuityOrder { order: Float },

    #[error("noise options were supplied but the problem has no diffusion function")]
    NoiseWithoutDiffusion,

    #[error(
        "{strategy} initialization requires a state derivative, but the value provider \
         does not expose one"
    )]
    MissingStateDerivative { strategy: Strategy },

    #[error(
        "Check initialization failed: components {violations:?} of the residual exceed \
         tolerance (max scaled residual {max_scaled:.3e}, abstol {abstol:?}, reltol {reltol:?})"
    )]
    ConsistencyFailure {
        /// Full residual vector of the governing equation at the checked state.
        residual: Vec<Float>,
        /// Indices of the components that violated the tolerance.
        violations: Vec<usize>,
        /// Largest componentwise scaled residual encountered.
        max_scaled: Float,
        abstol: Tolerance,
        reltol: Tolerance,
    },

    #[error(
        "Check initialization failed for neutral problem: state derivative components \
         {violations:?} disagree with the history derivative at t0 (max scaled mismatch \
         {max_scaled:.3e}, abstol {abstol:?}, reltol {reltol:?})"
    )]
    NeutralDerivativeMismatch {
        /// Componentwise difference between provider and history derivatives.
        residual: Vec<Float>,
        violations: Vec<usize>,
        max_scaled: Float,
        abstol: Tolerance,
        reltol: Tolerance,
    },

    #[error(
        "Override initialization requires initialization data attached to the active \
         system function, but none is present"
    )]
    MissingInitializationData,

    #[error(
        "Override initialization has a non-trivial sub-problem but no nonlinear solver \
         was supplied; pass one explicitly, a default is never chosen"
    )]
    MissingNonlinearSolver,
}
