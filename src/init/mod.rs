//! Initialization strategy dispatcher.
//!
//! One strategy is selected per invocation; there are no transitions between
//! strategies within a call and never a silent fallback from one to another.

mod check;
mod correct;

pub use correct::InitializationData;

use bon::Builder;

use crate::{
    error::Error,
    history::Convention,
    nlsolve::NonlinearSolver,
    problem::ProblemDefinition,
    provider::ValueProvider,
    system::SystemFunction,
    tolerance::Tolerance,
    Float,
};

/// Initialization strategy, selected by the caller per invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Pass the provider's current values through untouched.
    Skip,
    /// Verify the current values against the governing residual.
    Check,
    /// Compute initial values by solving the attached auxiliary sub-problem.
    Override,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Skip => write!(f, "Skip"),
            Strategy::Check => write!(f, "Check"),
            Strategy::Override => write!(f, "Override"),
        }
    }
}

/// Uniform result of [`get_initial_values`].
#[derive(Clone, Debug)]
pub struct InitOutcome {
    pub u: Vec<Float>,
    pub p: Vec<Float>,
    /// `false` only when the Override strategy's nonlinear solve did not
    /// converge; the caller decides whether that is fatal.
    pub success: bool,
}

/// Options forwarded to the initialization call.
#[derive(Builder)]
pub struct InitOptions<'a> {
    /// Nonlinear-solve engine for the Override strategy. Never defaulted:
    /// a non-trivial sub-problem without one is an error.
    pub nlsolve: Option<&'a dyn NonlinearSolver>,
    /// Absolute tolerance of the consistency check.
    #[builder(default = 1e-6, into)]
    pub abstol: Tolerance,
    /// Relative tolerance of the consistency check, scaling with the state
    /// magnitude.
    #[builder(default = 1e-6, into)]
    pub reltol: Tolerance,
}

/// Determine initial values for `problem` from the provider's current state,
/// according to `strategy`.
///
/// - [`Strategy::Skip`] returns the current (state, params) with
///   `success = true`, unconditionally.
/// - [`Strategy::Check`] evaluates the governing residual of `function` at
///   the current values and errors with full residual detail when any
///   checked component exceeds the combined tolerance.
/// - [`Strategy::Override`] refreshes and solves the sub-problem attached to
///   `function`, then maps its solution back into the full state and
///   parameter space. Non-convergence surfaces as `success = false`.
///
/// The provider is never mutated.
pub fn get_initial_values(
    problem: &ProblemDefinition,
    provider: &dyn ValueProvider,
    function: &SystemFunction,
    strategy: Strategy,
    convention: Convention,
    options: InitOptions<'_>,
) -> Result<InitOutcome, Error> {
    log::debug!(
        "initializing with strategy {} at t = {}",
        strategy,
        provider.current_time()
    );
    match strategy {
        Strategy::Skip => Ok(InitOutcome {
            u: provider.current_state(),
            p: provider.current_params(),
            success: true,
        }),
        Strategy::Check => check::check_consistency(problem, provider, function, convention, &options),
        Strategy::Override => correct::solve_override(provider, function, &options),
    }
}
