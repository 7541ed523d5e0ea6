//! Initial-value consistency and correction for ODE, DAE, and delay systems.
//!
//! Before a differential system is advanced, its starting state and parameters
//! must satisfy the governing equations. This crate provides the protocol for
//! that step: a [`ProblemDefinition`] data model for ODE/DAE/delay problems, a
//! [`ValueProvider`] view over "current state" (live engine or frozen
//! snapshot), and [`get_initial_values`] which either passes the state through
//! unchanged ([`Strategy::Skip`]), verifies it against the governing residual
//! ([`Strategy::Check`]), or computes it by delegating an auxiliary nonlinear
//! sub-problem to a solver ([`Strategy::Override`]).

mod alias;
mod error;
mod history;
mod init;
mod matrix;
mod nlsolve;
mod problem;
mod provider;
mod system;
mod tolerance;

pub use alias::AliasSpecifier;
pub use error::Error;
pub use history::{Convention, HistoryCapabilities, HistoryFn, HistoryNeeds, HistoryRequest};
pub use init::{get_initial_values, InitOptions, InitOutcome, InitializationData, Strategy};
pub use matrix::{Matrix, MatrixStorage};
pub use nlsolve::{DampedNewton, NonlinearProblem, NonlinearSolution, NonlinearSolver};
pub use problem::{DependentLag, NoiseSpec, ProblemDefinition, ProblemOptions};
pub use provider::{ValueProvider, ValueSnapshot};
pub use system::{DriftFn, ResidualFn, SystemForm, SystemFunction};
pub use tolerance::Tolerance;

// Prevent selecting two incompatible float precision features at once.
#[cfg(all(feature = "f32", feature = "f64"))]
compile_error!(
    "features 'f32' and 'f64' cannot both be enabled; pick exactly one Float precision feature"
);

/// Change this to f64 or f32 as desired.
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f64")]
pub type Float = f64;
