use approx::assert_relative_eq;
use ivc::{
    get_initial_values, Convention, DampedNewton, DriftFn, Error, InitOptions,
    InitializationData, NonlinearProblem, ProblemDefinition, Strategy, SystemFunction,
    ValueSnapshot,
};

mod common;
use common::{override_problem, T0};

fn provider() -> ValueSnapshot {
    ValueSnapshot::new(vec![2.0, 0.0], vec![7.5], T0)
}

fn newton() -> DampedNewton {
    DampedNewton::builder().tol(1e-12).max_iter(200).build()
}

#[test]
fn override_solves_and_maps_state_and_params() {
    // Refresh copies the current u1 = 2 into the sub-problem parameter, so
    // the constraints become u2^2 = 4 and (p - 1)^2 = 0.
    let problem = override_problem(true, true);
    let solver = newton();
    let outcome = get_initial_values(
        &problem,
        &provider(),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().nlsolve(&solver).build(),
    )
    .unwrap();
    assert!(outcome.success);
    assert_relative_eq!(outcome.u[0], 2.0, epsilon = 1e-5);
    assert_relative_eq!(outcome.u[1], 2.0, epsilon = 1e-5);
    assert_relative_eq!(outcome.p[0], 1.0, epsilon = 1e-4);
}

#[test]
fn override_without_param_map_passes_params_through() {
    // The sub-problem still solves for its parameter-like unknown, but the
    // call's input parameters must come back untouched.
    let problem = override_problem(true, false);
    let solver = newton();
    let outcome = get_initial_values(
        &problem,
        &provider(),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().nlsolve(&solver).build(),
    )
    .unwrap();
    assert!(outcome.success);
    assert_relative_eq!(outcome.u[0], 2.0, epsilon = 1e-5);
    assert_relative_eq!(outcome.u[1], 2.0, epsilon = 1e-5);
    assert_eq!(outcome.p, vec![7.5]);
}

#[test]
fn override_without_refresh_uses_stored_subproblem_state() {
    // No refresh hook: the sub-problem parameter keeps its constructed value
    // u1 = 1, so the solve lands on (1, 1) regardless of the provider.
    let problem = override_problem(false, true);
    let solver = newton();
    let outcome = get_initial_values(
        &problem,
        &provider(),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().nlsolve(&solver).build(),
    )
    .unwrap();
    assert!(outcome.success);
    assert_relative_eq!(outcome.u[0], 1.0, epsilon = 1e-5);
    assert_relative_eq!(outcome.u[1], 1.0, epsilon = 1e-5);
}

#[test]
fn override_requires_initialization_data() {
    let drift = DriftFn::in_place(|du, u, _h, _p, _t| du.copy_from_slice(u));
    let problem = ProblemDefinition::ode(drift, vec![1.0], (0.0, 1.0), vec![]).unwrap();
    let solver = newton();
    let err = get_initial_values(
        &problem,
        &ValueSnapshot::new(vec![1.0], vec![], T0),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().nlsolve(&solver).build(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingInitializationData));
}

#[test]
fn override_with_unknowns_and_no_solver_is_an_error() {
    let problem = override_problem(true, true);
    let err = get_initial_values(
        &problem,
        &provider(),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().build(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingNonlinearSolver));
}

#[test]
fn override_with_trivial_subproblem_needs_no_solver() {
    // No unknowns: the maps run against the stored sub-problem directly.
    let subproblem = NonlinearProblem::new(|_res, _u, _p| {}, vec![], vec![4.0]);
    let data = InitializationData::new(subproblem, |sub, _sol| vec![sub.p[0], sub.p[0]]);
    let drift = DriftFn::in_place(|du, u, _h, _p, _t| du.copy_from_slice(u));
    let f = SystemFunction::explicit(drift).with_initialization_data(data);
    let problem = ProblemDefinition::new(
        f,
        None,
        Some(vec![4.0, 4.0]),
        ivc::HistoryFn::constant(vec![4.0, 4.0]),
        (0.0, 1.0),
        vec![],
        ivc::ProblemOptions::default(),
    )
    .unwrap();
    let outcome = get_initial_values(
        &problem,
        &ValueSnapshot::new(vec![0.0, 0.0], vec![], T0),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().build(),
    )
    .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.u, vec![4.0, 4.0]);
}

#[test]
fn override_nonconvergence_is_reported_not_raised() {
    // Sub-problem with no real root: the solve must come back with
    // success = false instead of an error.
    let subproblem = NonlinearProblem::new(
        |res, u, _p| res[0] = u[0] * u[0] + 1.0,
        vec![1.0],
        vec![],
    );
    let data = InitializationData::new(subproblem, |_sub, sol| vec![sol[0]]);
    let drift = DriftFn::in_place(|du, u, _h, _p, _t| du.copy_from_slice(u));
    let f = SystemFunction::explicit(drift).with_initialization_data(data);
    let problem = ProblemDefinition::new(
        f,
        None,
        Some(vec![1.0]),
        ivc::HistoryFn::constant(vec![1.0]),
        (0.0, 1.0),
        vec![],
        ivc::ProblemOptions::default(),
    )
    .unwrap();
    let solver = DampedNewton::builder().max_iter(25).build();
    let outcome = get_initial_values(
        &problem,
        &ValueSnapshot::new(vec![1.0], vec![], T0),
        &problem.f,
        Strategy::Override,
        Convention::ValueForm,
        InitOptions::builder().nlsolve(&solver).build(),
    )
    .unwrap();
    assert!(!outcome.success);
}
