//! Immutable problem record for ODE, DAE, and delay systems.

use bon::Builder;

use crate::{
    error::Error,
    history::{HistoryFn, HistoryRequest},
    matrix::Matrix,
    system::{DriftFn, ResidualFn, SystemForm, SystemFunction},
    Float,
};

/// State-dependent lag `(state, params, time) -> lag`, recomputed at every
/// drift/diffusion evaluation. Never cached across steps.
pub type DependentLag = Box<dyn Fn(&[Float], &[Float], Float) -> Float>;

/// Noise descriptor for the stochastic variant.
#[derive(Clone, Debug)]
pub struct NoiseSpec {
    /// Dimensions of the noise-rate matrix, if non-diagonal.
    pub rate_prototype: Option<(usize, usize)>,
    pub seed: u64,
}

/// Enumerated construction options. Anything the constructor does not
/// recognize is unrepresentable here, so it cannot be silently forwarded.
#[derive(Builder)]
pub struct ProblemOptions {
    /// Fixed nonnegative delay offsets, known before solving.
    #[builder(default)]
    pub constant_lags: Vec<Float>,
    /// State-dependent lags, in evaluation order.
    #[builder(default)]
    pub dependent_lags: Vec<DependentLag>,
    /// Neutrality override. Defaults to "mass matrix singular or with
    /// non-unit determinant".
    pub neutral: Option<bool>,
    /// Smoothness class of the solution at the start time.
    pub order_discontinuity_t0: Option<Float>,
    /// Noise-rate matrix dimensions (stochastic variant).
    pub noise_rate_prototype: Option<(usize, usize)>,
    #[builder(default = 0)]
    pub seed: u64,
}

impl Default for ProblemOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Immutable record of the governing equations and everything the
/// initialization protocol needs to know about them.
///
/// Constructed once through [`ProblemDefinition::new`] or a named factory,
/// validated at construction, and consumed by reference everywhere
/// downstream. A partially valid instance is never produced.
pub struct ProblemDefinition {
    pub f: SystemFunction,
    /// Diffusion function of the stochastic variant.
    pub diffusion: Option<DriftFn>,
    pub history: HistoryFn,
    /// Initial state. When the caller omitted one this is
    /// `history(params, t0)`.
    pub u0: Vec<Float>,
    pub tspan: (Float, Float),
    pub p: Vec<Float>,
    pub constant_lags: Vec<Float>,
    pub dependent_lags: Vec<DependentLag>,
    /// Delay terms appear inside derivative arguments; initialization must
    /// also check the history derivative.
    pub neutral: bool,
    /// Smoothness class at `t0`: >= 0 when an initial state was given,
    /// forced >= 1 when it was adopted from the history.
    pub order_discontinuity_t0: Float,
    pub noise: Option<NoiseSpec>,
}

impl std::fmt::Debug for ProblemDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProblemDefinition")
            .field("f", &"<system function>")
            .field("diffusion", &self.diffusion.as_ref().map(|_| "<diffusion>"))
            .field("history", &"<history>")
            .field("u0", &self.u0)
            .field("tspan", &self.tspan)
            .field("p", &self.p)
            .field("constant_lags", &self.constant_lags)
            .field("dependent_lags", &format_args!("[{} lags]", self.dependent_lags.len()))
            .field("neutral", &self.neutral)
            .field("order_discontinuity_t0", &self.order_discontinuity_t0)
            .field("noise", &self.noise)
            .finish()
    }
}

impl ProblemDefinition {
    /// Canonical constructor. Validates everything up front and fails fast.
    pub fn new(
        f: SystemFunction,
        diffusion: Option<DriftFn>,
        u0: Option<Vec<Float>>,
        history: HistoryFn,
        tspan: (Float, Float),
        p: Vec<Float>,
        options: ProblemOptions,
    ) -> Result<Self, Error> {
        let (t0, t1) = tspan;
        if !t0.is_finite() || !t1.is_finite() || t0 >= t1 {
            return Err(Error::InvalidTimeSpan { t0, t1 });
        }

        for (index, &lag) in options.constant_lags.iter().enumerate() {
            if !lag.is_finite() || lag < 0.0 {
                return Err(Error::InvalidConstantLag { index, lag });
            }
        }

        // Adopt the history value at t0 when no initial state was given; the
        // solution then has a derivative jump at t0 at best, so the
        // discontinuity order is forced up to 1.
        let u0_given = u0.is_some();
        let u0 = match u0 {
            Some(u0) => u0,
            None => history.call(HistoryRequest::Value, &p, t0)?,
        };

        let order = options.order_discontinuity_t0.unwrap_or(0.0);
        if !order.is_finite() || order < 0.0 {
            return Err(Error::InvalidDiscontinuityOrder { order });
        }
        let order_discontinuity_t0 = if u0_given { order } else { order.max(1.0) };

        // Shape checks against the declared calling convention: the mass
        // matrix must match the state dimension, and a value-returning drift
        // must produce a state-sized vector.
        if let SystemForm::Explicit { drift, mass } = &f.form {
            if let Some(mass) = mass {
                if mass.dim() != u0.len() {
                    return Err(Error::ShapeMismatch {
                        what: "mass matrix dimension vs initial state",
                        expected: u0.len(),
                        got: mass.dim(),
                    });
                }
            }
            if let DriftFn::OutOfPlace(drift) = drift {
                let du = drift(&u0, &history, &p, t0);
                if du.len() != u0.len() {
                    return Err(Error::ShapeMismatch {
                        what: "drift output vs initial state",
                        expected: u0.len(),
                        got: du.len(),
                    });
                }
            }
        }

        let neutral = match options.neutral {
            Some(neutral) => neutral,
            None => match &f.form {
                SystemForm::Explicit { mass: Some(m), .. } => (m.det().abs() - 1.0).abs() > 1e-12,
                _ => false,
            },
        };

        // The capability descriptor is checked once, here: the history must
        // implement every call shape the active function declares, and a
        // neutral problem always needs the derivative shape.
        let caps = history.capabilities();
        if (f.history_needs.derivative || neutral) && !caps.derivative {
            return Err(Error::HistoryCapabilityMissing { shape: "derivative" });
        }

        if options.noise_rate_prototype.is_some() && diffusion.is_none() {
            return Err(Error::NoiseWithoutDiffusion);
        }
        let noise = diffusion.as_ref().map(|_| NoiseSpec {
            rate_prototype: options.noise_rate_prototype,
            seed: options.seed,
        });

        Ok(Self {
            f,
            diffusion,
            history,
            u0,
            tspan,
            p,
            constant_lags: options.constant_lags,
            dependent_lags: options.dependent_lags,
            neutral,
            order_discontinuity_t0,
            noise,
        })
    }

    /// Plain ODE `du = f(u, p, t)` with a frozen history equal to `u0`.
    pub fn ode(
        drift: DriftFn,
        u0: Vec<Float>,
        tspan: (Float, Float),
        p: Vec<Float>,
    ) -> Result<Self, Error> {
        let history = HistoryFn::constant(u0.clone());
        Self::new(
            SystemFunction::explicit(drift),
            None,
            Some(u0),
            history,
            tspan,
            p,
            ProblemOptions::default(),
        )
    }

    /// Mass-matrix ODE/DAE `M du = f(u, p, t)`.
    pub fn mass_matrix_ode(
        drift: DriftFn,
        mass: Matrix,
        u0: Vec<Float>,
        tspan: (Float, Float),
        p: Vec<Float>,
        options: ProblemOptions,
    ) -> Result<Self, Error> {
        let history = HistoryFn::constant(u0.clone());
        Self::new(
            SystemFunction::explicit_mass(drift, mass),
            None,
            Some(u0),
            history,
            tspan,
            p,
            options,
        )
    }

    /// Fully implicit DAE `0 = F(du, u, p, t)`.
    pub fn dae(
        residual: ResidualFn,
        u0: Vec<Float>,
        tspan: (Float, Float),
        p: Vec<Float>,
        options: ProblemOptions,
    ) -> Result<Self, Error> {
        let history = HistoryFn::constant(u0.clone());
        Self::new(
            SystemFunction::implicit(residual),
            None,
            Some(u0),
            history,
            tspan,
            p,
            options,
        )
    }

    /// Delay problem. `u0 = None` adopts `history(p, t0)`.
    pub fn dde(
        drift: DriftFn,
        history: HistoryFn,
        u0: Option<Vec<Float>>,
        tspan: (Float, Float),
        p: Vec<Float>,
        options: ProblemOptions,
    ) -> Result<Self, Error> {
        Self::new(
            SystemFunction::explicit(drift),
            None,
            u0,
            history,
            tspan,
            p,
            options,
        )
    }

    /// Stochastic delay problem with drift and diffusion.
    pub fn sdde(
        drift: DriftFn,
        diffusion: DriftFn,
        history: HistoryFn,
        u0: Option<Vec<Float>>,
        tspan: (Float, Float),
        p: Vec<Float>,
        options: ProblemOptions,
    ) -> Result<Self, Error> {
        Self::new(
            SystemFunction::explicit(drift),
            Some(diffusion),
            u0,
            history,
            tspan,
            p,
            options,
        )
    }

    /// Times `t0 + k*lag` (k = 1..=max_order) induced by the constant lags,
    /// sorted and restricted to the time span. A stepping engine schedules
    /// its discontinuity-tracking points from these without extra
    /// computation; dependent lags cannot appear here, they are only known
    /// at evaluation time.
    pub fn discontinuity_times(&self, max_order: usize) -> Vec<Float> {
        let (t0, t1) = self.tspan;
        let mut times: Vec<Float> = Vec::new();
        for &lag in &self.constant_lags {
            if lag == 0.0 {
                continue;
            }
            for k in 1..=max_order {
                let t = t0 + lag * k as Float;
                if t <= t1 {
                    times.push(t);
                }
            }
        }
        times.sort_unstable_by(Float::total_cmp);
        times.dedup();
        times
    }
}
