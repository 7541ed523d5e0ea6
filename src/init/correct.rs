//! Override initialization: compute initial values from an auxiliary
//! nonlinear sub-problem instead of verifying the current ones.

use std::cell::RefCell;

use crate::{
    error::Error,
    init::{InitOptions, InitOutcome},
    nlsolve::{NonlinearProblem, NonlinearSolution},
    provider::ValueProvider,
    system::SystemFunction,
    Float,
};

type RefreshFn = Box<dyn Fn(&mut NonlinearProblem, &dyn ValueProvider)>;
type MapFn = Box<dyn Fn(&NonlinearProblem, &[Float]) -> Vec<Float>>;

/// Everything the Override strategy needs: the auxiliary sub-problem, an
/// optional refresh hook, and the maps from sub-problem solution back into
/// the full state/parameter space.
///
/// Attached once to a [`SystemFunction`]. The sub-problem keeps whatever
/// state and parameters it was last constructed or left with; only the
/// refresh callback ever copies provider values into it. Interior mutability
/// is what lets a shared function object carry that persistent sub-problem
/// state across calls (the crate is single-threaded by contract).
pub struct InitializationData {
    subproblem: RefCell<NonlinearProblem>,
    refresh: Option<RefreshFn>,
    map_state: MapFn,
    map_params: Option<MapFn>,
}

impl InitializationData {
    /// `map_state(subproblem, solution)` produces the full initial state.
    pub fn new(
        subproblem: NonlinearProblem,
        map_state: impl Fn(&NonlinearProblem, &[Float]) -> Vec<Float> + 'static,
    ) -> Self {
        Self {
            subproblem: RefCell::new(subproblem),
            refresh: None,
            map_state: Box::new(map_state),
            map_params: None,
        }
    }

    /// Hook invoked before each solve to copy relevant provider values into
    /// the sub-problem. Without one there is no implicit refresh of any kind.
    pub fn with_refresh(
        mut self,
        refresh: impl Fn(&mut NonlinearProblem, &dyn ValueProvider) + 'static,
    ) -> Self {
        self.refresh = Some(Box::new(refresh));
        self
    }

    /// Optional map from the sub-problem solution to the full parameters.
    /// Without one the caller's current parameters pass through unchanged,
    /// even if the sub-problem internally solved for a parameter-like
    /// unknown. This pass-through is deliberate.
    pub fn with_map_params(
        mut self,
        map_params: impl Fn(&NonlinearProblem, &[Float]) -> Vec<Float> + 'static,
    ) -> Self {
        self.map_params = Some(Box::new(map_params));
        self
    }
}

pub(super) fn solve_override(
    provider: &dyn ValueProvider,
    function: &SystemFunction,
    options: &InitOptions<'_>,
) -> Result<InitOutcome, Error> {
    let data = function
        .initialization_data
        .as_ref()
        .ok_or(Error::MissingInitializationData)?;

    let mut subproblem = data.subproblem.borrow_mut();
    if let Some(refresh) = &data.refresh {
        refresh(&mut subproblem, provider);
    }

    let solution = if subproblem.is_trivial() {
        NonlinearSolution {
            u: Vec::new(),
            converged: true,
            iterations: 0,
            residual_norm: 0.0,
        }
    } else {
        let solver = options.nlsolve.ok_or(Error::MissingNonlinearSolver)?;
        solver.solve(&subproblem)
    };

    if solution.converged {
        // Leave the solution behind as the sub-problem's state, so a later
        // call without a refresh hook starts from it.
        subproblem.u0.copy_from_slice(&solution.u);
    } else {
        log::warn!(
            "Override initialization: nonlinear solve did not converge \
             (|res| = {:.3e} after {} iterations)",
            solution.residual_norm,
            solution.iterations
        );
    }

    let u = (data.map_state)(&subproblem, &solution.u);
    let p = match &data.map_params {
        Some(map_params) => map_params(&subproblem, &solution.u),
        None => provider.current_params(),
    };

    Ok(InitOutcome {
        u,
        p,
        success: solution.converged,
    })
}
