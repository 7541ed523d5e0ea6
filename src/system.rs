//! Governing-equation representation.
//!
//! The system function is a closed tagged type: formulation
//! ([`SystemForm::Explicit`] with mass matrix, or [`SystemForm::Implicit`]
//! residual) times calling convention (buffer-writing `InPlace` or
//! value-returning `OutOfPlace`). Both axes are carried as data and matched
//! explicitly rather than resolved by overloading.

use crate::{
    history::{Convention, HistoryFn, HistoryNeeds},
    init::InitializationData,
    matrix::Matrix,
    Float,
};

type InPlaceDrift = Box<dyn Fn(&mut [Float], &[Float], &HistoryFn, &[Float], Float)>;
type OutOfPlaceDrift = Box<dyn Fn(&[Float], &HistoryFn, &[Float], Float) -> Vec<Float>>;

/// Drift (or diffusion) function `du = f(u, h, p, t)` in one of the two
/// calling conventions. The history argument is how delay terms reach the
/// right-hand side; plain ODE functions simply ignore it.
pub enum DriftFn {
    /// `f(du, u, h, p, t)` writing into a caller-supplied buffer.
    InPlace(InPlaceDrift),
    /// `f(u, h, p, t) -> du` allocating the result.
    OutOfPlace(OutOfPlaceDrift),
}

impl DriftFn {
    pub fn in_place(f: impl Fn(&mut [Float], &[Float], &HistoryFn, &[Float], Float) + 'static) -> Self {
        DriftFn::InPlace(Box::new(f))
    }

    pub fn out_of_place(
        f: impl Fn(&[Float], &HistoryFn, &[Float], Float) -> Vec<Float> + 'static,
    ) -> Self {
        DriftFn::OutOfPlace(Box::new(f))
    }

    pub fn convention(&self) -> Convention {
        match self {
            DriftFn::InPlace(_) => Convention::BufferForm,
            DriftFn::OutOfPlace(_) => Convention::ValueForm,
        }
    }

    /// Evaluate into `du` regardless of the underlying convention.
    pub fn eval_into(
        &self,
        du: &mut [Float],
        u: &[Float],
        h: &HistoryFn,
        p: &[Float],
        t: Float,
    ) {
        match self {
            DriftFn::InPlace(f) => f(du, u, h, p, t),
            DriftFn::OutOfPlace(f) => du.copy_from_slice(&f(u, h, p, t)),
        }
    }
}

type InPlaceResidual = Box<dyn Fn(&mut [Float], &[Float], &[Float], &HistoryFn, &[Float], Float)>;
type OutOfPlaceResidual = Box<dyn Fn(&[Float], &[Float], &HistoryFn, &[Float], Float) -> Vec<Float>>;

/// Fully implicit residual `0 = F(du, u, h, p, t)`.
pub enum ResidualFn {
    /// `F(res, du, u, h, p, t)` writing into a caller-supplied buffer.
    InPlace(InPlaceResidual),
    /// `F(du, u, h, p, t) -> res` allocating the result.
    OutOfPlace(OutOfPlaceResidual),
}

impl ResidualFn {
    pub fn in_place(
        f: impl Fn(&mut [Float], &[Float], &[Float], &HistoryFn, &[Float], Float) + 'static,
    ) -> Self {
        ResidualFn::InPlace(Box::new(f))
    }

    pub fn out_of_place(
        f: impl Fn(&[Float], &[Float], &HistoryFn, &[Float], Float) -> Vec<Float> + 'static,
    ) -> Self {
        ResidualFn::OutOfPlace(Box::new(f))
    }

    pub fn convention(&self) -> Convention {
        match self {
            ResidualFn::InPlace(_) => Convention::BufferForm,
            ResidualFn::OutOfPlace(_) => Convention::ValueForm,
        }
    }

    pub fn eval_into(
        &self,
        res: &mut [Float],
        du: &[Float],
        u: &[Float],
        h: &HistoryFn,
        p: &[Float],
        t: Float,
    ) {
        match self {
            ResidualFn::InPlace(f) => f(res, du, u, h, p, t),
            ResidualFn::OutOfPlace(f) => res.copy_from_slice(&f(du, u, h, p, t)),
        }
    }
}

/// Formulation of the governing equations.
pub enum SystemForm {
    /// `M du = f(u, h, p, t)`. `mass: None` means the identity.
    Explicit { drift: DriftFn, mass: Option<Matrix> },
    /// `0 = F(du, u, h, p, t)`.
    Implicit { residual: ResidualFn },
}

/// The active system function: formulation plus the data the initialization
/// protocol needs: optional override-initialization data and the history
/// call shapes the function uses.
pub struct SystemFunction {
    pub form: SystemForm,
    pub initialization_data: Option<InitializationData>,
    pub history_needs: HistoryNeeds,
}

impl SystemFunction {
    /// Explicit `du = f(u, h, p, t)` with identity mass.
    pub fn explicit(drift: DriftFn) -> Self {
        Self {
            form: SystemForm::Explicit { drift, mass: None },
            initialization_data: None,
            history_needs: HistoryNeeds::default(),
        }
    }

    /// Explicit `M du = f(u, h, p, t)`.
    pub fn explicit_mass(drift: DriftFn, mass: Matrix) -> Self {
        Self {
            form: SystemForm::Explicit {
                drift,
                mass: Some(mass),
            },
            initialization_data: None,
            history_needs: HistoryNeeds::default(),
        }
    }

    /// Fully implicit `0 = F(du, u, h, p, t)`.
    pub fn implicit(residual: ResidualFn) -> Self {
        Self {
            form: SystemForm::Implicit { residual },
            initialization_data: None,
            history_needs: HistoryNeeds::default(),
        }
    }

    /// Attach override-initialization data. Consumed only by the Override
    /// strategy.
    pub fn with_initialization_data(mut self, data: InitializationData) -> Self {
        self.initialization_data = Some(data);
        self
    }

    /// Declare which history call shapes this function uses.
    pub fn with_history_needs(mut self, needs: HistoryNeeds) -> Self {
        self.history_needs = needs;
        self
    }

    pub fn convention(&self) -> Convention {
        match &self.form {
            SystemForm::Explicit { drift, .. } => drift.convention(),
            SystemForm::Implicit { residual } => residual.convention(),
        }
    }

    /// Mass matrix of the explicit form, if one is carried explicitly.
    pub fn mass(&self) -> Option<&Matrix> {
        match &self.form {
            SystemForm::Explicit { mass, .. } => mass.as_ref(),
            SystemForm::Implicit { .. } => None,
        }
    }
}
