#![allow(dead_code)]

use ivc::{
    DriftFn, Float, InitializationData, Matrix, NonlinearProblem, ProblemDefinition,
    ProblemOptions, ResidualFn, SystemFunction,
};

/// `M du = f` with `M = diag(1, 0)` and `f = (-u0, u0*u1 - 1)`: one
/// differential row and one algebraic constraint `u0*u1 = 1`.
pub fn constrained_mass_problem() -> ProblemDefinition {
    let drift = DriftFn::in_place(|du, u, _h, _p, _t| {
        du[0] = -u[0];
        du[1] = u[0] * u[1] - 1.0;
    });
    let mass = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 0.0]]);
    ProblemDefinition::mass_matrix_ode(
        drift,
        mass,
        vec![2.0, 0.5],
        (0.0, 10.0),
        vec![],
        ProblemOptions::builder().neutral(false).build(),
    )
    .unwrap()
}

/// Harmonic oscillator in fully implicit form:
/// `F = (du0 - u1, du1 + u0)`.
pub fn implicit_oscillator() -> ProblemDefinition {
    let residual = ResidualFn::in_place(|res, du, u, _h, _p, _t| {
        res[0] = du[0] - u[1];
        res[1] = du[1] + u[0];
    });
    ProblemDefinition::dae(
        residual,
        vec![1.0, 0.0],
        (0.0, 10.0),
        vec![],
        ProblemOptions::default(),
    )
    .unwrap()
}

/// Override fixture from the correction protocol: sub-problem unknowns
/// `(u2, p)` with sub-problem parameter `u1`, constraints `u1^2 - u2^2 = 0`
/// and `p^2 - 2p + 1 = 0`. The required map returns `(u1, u2)`; the optional
/// parameter map returns `p`.
pub fn override_problem(with_refresh: bool, with_param_map: bool) -> ProblemDefinition {
    let subproblem = NonlinearProblem::new(
        |res, u, p| {
            res[0] = p[0] * p[0] - u[0] * u[0];
            res[1] = u[1] * u[1] - 2.0 * u[1] + 1.0;
        },
        vec![1.0, 0.0],
        vec![1.0],
    );

    let mut data = InitializationData::new(subproblem, |sub, sol| vec![sub.p[0], sol[0]]);
    if with_refresh {
        data = data.with_refresh(|sub, provider| {
            sub.p[0] = provider.current_state()[0];
        });
    }
    if with_param_map {
        data = data.with_map_params(|_sub, sol| vec![sol[1]]);
    }

    let drift = DriftFn::in_place(|du, u, _h, _p, _t| {
        du[0] = -u[0];
        du[1] = -u[1];
    });
    let f = SystemFunction::explicit(drift).with_initialization_data(data);
    ProblemDefinition::new(
        f,
        None,
        Some(vec![2.0, 0.0]),
        ivc::HistoryFn::constant(vec![2.0, 0.0]),
        (0.0, 10.0),
        vec![7.5],
        ProblemOptions::default(),
    )
    .unwrap()
}

pub const T0: Float = 0.0;
