//! Consistency check of the current (state, derivative, params) triple.

use crate::{
    error::Error,
    history::{Convention, HistoryRequest},
    init::{InitOptions, InitOutcome, Strategy},
    problem::ProblemDefinition,
    provider::ValueProvider,
    system::{SystemForm, SystemFunction},
    tolerance::Tolerance,
    Float,
};

/// Componentwise scaled violations of `res` against `sk = atol + rtol*|ref|`.
/// Returns the violating indices (restricted to `checked`) and the largest
/// scaled residual seen.
fn scaled_violations(
    res: &[Float],
    reference: &[Float],
    checked: &[usize],
    abstol: &Tolerance,
    reltol: &Tolerance,
) -> (Vec<usize>, Float) {
    let mut violations = Vec::new();
    let mut max_scaled: Float = 0.0;
    for &i in checked {
        let sk = abstol[i] + reltol[i] * reference[i].abs();
        let scaled = res[i].abs() / sk;
        if scaled > max_scaled {
            max_scaled = scaled;
        }
        if scaled > 1.0 {
            violations.push(i);
        }
    }
    (violations, max_scaled)
}

pub(super) fn check_consistency(
    problem: &ProblemDefinition,
    provider: &dyn ValueProvider,
    function: &SystemFunction,
    convention: Convention,
    options: &InitOptions<'_>,
) -> Result<InitOutcome, Error> {
    let n = problem.u0.len();
    let u = match convention {
        Convention::ValueForm => provider.current_state(),
        Convention::BufferForm => {
            let mut buf = vec![0.0; n];
            provider.current_state_into(&mut buf);
            buf
        }
    };
    let p = provider.current_params();
    let t = provider.current_time();
    let du = provider.current_state_derivative();

    match &function.form {
        SystemForm::Implicit { residual } => {
            // Fully implicit: every component of F(du, u, p, t) is checked.
            let du = du.as_deref().ok_or(Error::MissingStateDerivative {
                strategy: Strategy::Check,
            })?;
            let mut res = vec![0.0; n];
            residual.eval_into(&mut res, du, &u, &problem.history, &p, t);
            let checked: Vec<usize> = (0..n).collect();
            let (violations, max_scaled) =
                scaled_violations(&res, &u, &checked, &options.abstol, &options.reltol);
            if !violations.is_empty() {
                return Err(Error::ConsistencyFailure {
                    residual: res,
                    violations,
                    max_scaled,
                    abstol: options.abstol.clone(),
                    reltol: options.reltol.clone(),
                });
            }
        }
        SystemForm::Explicit { drift, mass } => {
            // Residual of M du = f(u, p, t). Differential rows are satisfied
            // by construction; only the all-zero rows of M, the pure
            // algebraic constraints, are checked. On those rows (M du)_i
            // vanishes, so no state derivative is needed.
            let algebraic: Vec<usize> = match mass {
                Some(mass) => mass.zero_rows(),
                None => Vec::new(),
            };
            if !algebraic.is_empty() {
                let mut fu = vec![0.0; n];
                drift.eval_into(&mut fu, &u, &problem.history, &p, t);
                let mut res = vec![0.0; n];
                if let (Some(mass), Some(du)) = (mass, &du) {
                    // Full residual for diagnostics when a derivative is
                    // available; the checked entries are unaffected by it.
                    mass.mul_vec(du, &mut res);
                    for i in 0..n {
                        res[i] -= fu[i];
                    }
                } else {
                    for &i in &algebraic {
                        res[i] = -fu[i];
                    }
                }
                let (violations, max_scaled) =
                    scaled_violations(&res, &u, &algebraic, &options.abstol, &options.reltol);
                if !violations.is_empty() {
                    return Err(Error::ConsistencyFailure {
                        residual: res,
                        violations,
                        max_scaled,
                        abstol: options.abstol.clone(),
                        reltol: options.reltol.clone(),
                    });
                }
            }
        }
    }

    // Neutral problems: the history derivative at t0 must agree with the
    // provider's state derivative, not just the history value with the state.
    if problem.neutral {
        let du = du.as_deref().ok_or(Error::MissingStateDerivative {
            strategy: Strategy::Check,
        })?;
        let hist_du = problem
            .history
            .call(HistoryRequest::Derivative(1), &p, t)?;
        let diff: Vec<Float> = du
            .iter()
            .zip(hist_du.iter())
            .map(|(a, b)| a - b)
            .collect();
        let checked: Vec<usize> = (0..diff.len()).collect();
        let (violations, max_scaled) =
            scaled_violations(&diff, du, &checked, &options.abstol, &options.reltol);
        if !violations.is_empty() {
            return Err(Error::NeutralDerivativeMismatch {
                residual: diff,
                violations,
                max_scaled,
                abstol: options.abstol.clone(),
                reltol: options.reltol.clone(),
            });
        }
    }

    Ok(InitOutcome {
        u,
        p,
        success: true,
    })
}
