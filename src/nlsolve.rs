//! Nonlinear-solve engine contract and a damped Newton reference solver.
//!
//! The Override initialization path delegates its auxiliary sub-problem to an
//! external engine through the [`NonlinearSolver`] trait. The engine owns its
//! own convergence and iteration limits; non-convergence is reported in the
//! returned [`NonlinearSolution`], never as a panic or interruption.

use bon::Builder;

use crate::{matrix::Matrix, Float};

type SubResidual = Box<dyn Fn(&mut [Float], &[Float], &[Float])>;

/// Auxiliary nonlinear system `0 = g(u, p)` with its own unknowns and
/// parameters, independent of the full problem's state layout.
pub struct NonlinearProblem {
    residual: SubResidual,
    /// Current unknowns; the initial guess before a solve, the last solution
    /// after one.
    pub u0: Vec<Float>,
    /// Sub-problem parameters. A refresh callback may overwrite these from
    /// provider values before a solve.
    pub p: Vec<Float>,
}

impl NonlinearProblem {
    /// `residual(res, u, p)` fills `res` with `g(u, p)`, `res.len() == u.len()`.
    pub fn new(
        residual: impl Fn(&mut [Float], &[Float], &[Float]) + 'static,
        u0: Vec<Float>,
        p: Vec<Float>,
    ) -> Self {
        Self {
            residual: Box::new(residual),
            u0,
            p,
        }
    }

    pub fn residual(&self, res: &mut [Float], u: &[Float]) {
        (self.residual)(res, u, &self.p);
    }

    /// A trivial sub-problem has no unknowns to solve for.
    pub fn is_trivial(&self) -> bool {
        self.u0.is_empty()
    }
}

/// Outcome of a nonlinear solve.
#[derive(Clone, Debug)]
pub struct NonlinearSolution {
    pub u: Vec<Float>,
    pub converged: bool,
    pub iterations: usize,
    pub residual_norm: Float,
}

/// External nonlinear-solve engine contract.
pub trait NonlinearSolver {
    fn solve(&self, problem: &NonlinearProblem) -> NonlinearSolution;
}

/// Newton iteration with forward-difference Jacobian, LU linear solves, and
/// step halving when a full step grows the residual.
#[derive(Builder, Clone, Debug)]
pub struct DampedNewton {
    /// Maximum Newton iterations.
    #[builder(default = 100)]
    pub max_iter: usize,
    /// Convergence threshold on the max-norm of the residual.
    #[builder(default = 1e-10)]
    pub tol: Float,
    /// Maximum number of step halvings per iteration.
    #[builder(default = 8)]
    pub max_halvings: usize,
}

impl Default for DampedNewton {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn max_norm(v: &[Float]) -> Float {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

impl NonlinearSolver for DampedNewton {
    fn solve(&self, problem: &NonlinearProblem) -> NonlinearSolution {
        let n = problem.u0.len();
        let mut u = problem.u0.clone();
        if n == 0 {
            return NonlinearSolution {
                u,
                converged: true,
                iterations: 0,
                residual_norm: 0.0,
            };
        }

        let mut res = vec![0.0; n];
        let mut res_pert = vec![0.0; n];
        let mut step = vec![0.0; n];
        let mut u_trial = vec![0.0; n];
        let mut jac = Matrix::zeros(n);
        let sqrt_eps = (Float::EPSILON).sqrt();

        problem.residual(&mut res, &u);
        let mut norm = max_norm(&res);

        for it in 0..self.max_iter {
            if norm <= self.tol {
                log::debug!("newton converged in {} iterations, |res| = {:.3e}", it, norm);
                return NonlinearSolution {
                    u,
                    converged: true,
                    iterations: it,
                    residual_norm: norm,
                };
            }

            // Forward-difference Jacobian, column by column.
            for j in 0..n {
                let delta = sqrt_eps * u[j].abs().max(1.0);
                let saved = u[j];
                u[j] = saved + delta;
                problem.residual(&mut res_pert, &u);
                u[j] = saved;
                for i in 0..n {
                    jac.set(i, j, (res_pert[i] - res[i]) / delta);
                }
            }

            // Newton step: J step = -res
            for i in 0..n {
                step[i] = -res[i];
            }
            jac.lin_solve_mut(&mut step);
            if step.iter().any(|s| !s.is_finite()) {
                log::warn!("newton linear solve produced non-finite step at iteration {}", it);
                return NonlinearSolution {
                    u,
                    converged: false,
                    iterations: it,
                    residual_norm: norm,
                };
            }

            // Damping: halve the step until the residual stops growing.
            let mut lambda = 1.0;
            let mut accepted = false;
            for _ in 0..=self.max_halvings {
                for i in 0..n {
                    u_trial[i] = u[i] + lambda * step[i];
                }
                problem.residual(&mut res_pert, &u_trial);
                let trial_norm = max_norm(&res_pert);
                if trial_norm < norm || trial_norm <= self.tol {
                    u.copy_from_slice(&u_trial);
                    res.copy_from_slice(&res_pert);
                    norm = trial_norm;
                    accepted = true;
                    break;
                }
                lambda *= 0.5;
            }
            if !accepted {
                // Take the most damped step anyway; stagnation is caught by
                // the iteration limit.
                u.copy_from_slice(&u_trial);
                problem.residual(&mut res, &u);
                norm = max_norm(&res);
            }
        }

        let converged = norm <= self.tol;
        if !converged {
            log::warn!(
                "newton failed to converge after {} iterations, |res| = {:.3e}",
                self.max_iter,
                norm
            );
        }
        NonlinearSolution {
            u,
            converged,
            iterations: self.max_iter,
            residual_norm: norm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solves_scalar_quadratic() {
        let problem = NonlinearProblem::new(
            |res, u, _p| res[0] = u[0] * u[0] - 4.0,
            vec![1.0],
            vec![],
        );
        let sol = DampedNewton::default().solve(&problem);
        assert!(sol.converged);
        assert_relative_eq!(sol.u[0], 2.0, epsilon = 1e-8);
    }

    #[test]
    fn solves_coupled_system_with_params() {
        // 0 = u0 - p0, 0 = u1 - u0^2
        let problem = NonlinearProblem::new(
            |res, u, p| {
                res[0] = u[0] - p[0];
                res[1] = u[1] - u[0] * u[0];
            },
            vec![0.5, 0.5],
            vec![3.0],
        );
        let sol = DampedNewton::default().solve(&problem);
        assert!(sol.converged);
        assert_relative_eq!(sol.u[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(sol.u[1], 9.0, epsilon = 1e-7);
    }

    #[test]
    fn trivial_problem_converges_immediately() {
        let problem = NonlinearProblem::new(|_res, _u, _p| {}, vec![], vec![1.0]);
        let sol = DampedNewton::default().solve(&problem);
        assert!(sol.converged);
        assert!(sol.u.is_empty());
        assert_eq!(sol.iterations, 0);
    }

    #[test]
    fn reports_nonconvergence() {
        // No real root: x^2 + 1 = 0
        let problem = NonlinearProblem::new(
            |res, u, _p| res[0] = u[0] * u[0] + 1.0,
            vec![1.0],
            vec![],
        );
        let sol = DampedNewton::builder().max_iter(20).build().solve(&problem);
        assert!(!sol.converged);
        assert!(sol.residual_norm > 0.0);
    }
}
