//! History function contract for delay problems.
//!
//! A delay system consults its history function for any reference to a time
//! earlier than the problem's start time. Four call shapes exist: value
//! (value-returning), value (buffer-writing), i-th derivative (both
//! conventions), and index-restricted evaluation. The shape is carried as an
//! explicit [`HistoryRequest`] and matched here; which shapes a history
//! actually implements is exposed as a [`HistoryCapabilities`] descriptor and
//! checked once, at problem construction, against the [`HistoryNeeds`] of the
//! active system function.

use crate::{error::Error, Float};

/// Calling convention for producing values: allocate-and-return, or write
/// into a caller-supplied buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convention {
    ValueForm,
    BufferForm,
}

/// One history evaluation request.
#[derive(Clone, Copy, Debug)]
pub enum HistoryRequest<'a> {
    /// History value at `t`.
    Value,
    /// i-th derivative of the history at `t`.
    Derivative(usize),
    /// History value at `t`, restricted to the named output components.
    Restricted(&'a [usize]),
}

/// Which call shapes a [`HistoryFn`] implements.
///
/// `value` is always true. `restricted` reports whether a specialized
/// restricted closure is present; restricted requests are still served
/// without one, by full evaluation plus gather.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryCapabilities {
    pub value: bool,
    pub derivative: bool,
    pub restricted: bool,
}

/// Call shapes a system function declares it will use on the history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryNeeds {
    pub derivative: bool,
    pub restricted: bool,
}

type ValueFn = Box<dyn Fn(&[Float], Float) -> Vec<Float>>;
type DerivativeFn = Box<dyn Fn(&[Float], Float, usize) -> Vec<Float>>;
type RestrictedFn = Box<dyn Fn(&[Float], Float, &[usize]) -> Vec<Float>>;

/// User-supplied history function `(params, t) -> state` with optional
/// derivative and index-restricted shapes.
pub struct HistoryFn {
    value: ValueFn,
    derivative: Option<DerivativeFn>,
    restricted: Option<RestrictedFn>,
}

impl HistoryFn {
    pub fn new(value: impl Fn(&[Float], Float) -> Vec<Float> + 'static) -> Self {
        Self {
            value: Box::new(value),
            derivative: None,
            restricted: None,
        }
    }

    /// History frozen at a fixed vector. Its derivative of any order is zero.
    pub fn constant(values: Vec<Float>) -> Self {
        let n = values.len();
        Self::new(move |_p, _t| values.clone())
            .with_derivative(move |_p, _t, _order| vec![0.0; n])
    }

    /// Attach the i-th-derivative call shape `(params, t, order) -> d^i u`.
    pub fn with_derivative(
        mut self,
        derivative: impl Fn(&[Float], Float, usize) -> Vec<Float> + 'static,
    ) -> Self {
        self.derivative = Some(Box::new(derivative));
        self
    }

    /// Attach a specialized index-restricted shape `(params, t, idxs) -> values`,
    /// returning one value per requested index.
    pub fn with_restricted(
        mut self,
        restricted: impl Fn(&[Float], Float, &[usize]) -> Vec<Float> + 'static,
    ) -> Self {
        self.restricted = Some(Box::new(restricted));
        self
    }

    pub fn capabilities(&self) -> HistoryCapabilities {
        HistoryCapabilities {
            value: true,
            derivative: self.derivative.is_some(),
            restricted: self.restricted.is_some(),
        }
    }

    /// Serve a request in value-returning form.
    pub fn call(&self, request: HistoryRequest<'_>, p: &[Float], t: Float) -> Result<Vec<Float>, Error> {
        match request {
            HistoryRequest::Value => Ok((self.value)(p, t)),
            HistoryRequest::Derivative(order) => match &self.derivative {
                Some(d) => Ok(d(p, t, order)),
                None => Err(Error::HistoryCapabilityMissing { shape: "derivative" }),
            },
            HistoryRequest::Restricted(idxs) => match &self.restricted {
                Some(r) => Ok(r(p, t, idxs)),
                // No specialized closure: full evaluation plus gather.
                None => {
                    let full = (self.value)(p, t);
                    Ok(idxs.iter().map(|&i| full[i]).collect())
                }
            },
        }
    }

    /// Serve a request in buffer-writing form.
    pub fn call_into(
        &self,
        request: HistoryRequest<'_>,
        p: &[Float],
        t: Float,
        buf: &mut [Float],
    ) -> Result<(), Error> {
        let values = self.call(request, p, t)?;
        buf.copy_from_slice(&values);
        Ok(())
    }

    /// Convenience for the most common shape: history value at `t`.
    pub fn eval(&self, p: &[Float], t: Float) -> Vec<Float> {
        (self.value)(p, t)
    }
}
