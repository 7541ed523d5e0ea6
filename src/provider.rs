//! Uniform read access to "current state".
//!
//! The same interface is satisfied by a live stepping engine and by an inert
//! snapshot; nothing downstream may depend on which one it is talking to.

use crate::Float;

/// Read accessor over current (state, parameters, time, optional derivative).
///
/// State is readable in both conventions: value-returning
/// ([`current_state`](Self::current_state)) and buffer-writing
/// ([`current_state_into`](Self::current_state_into)). A provider backed by a
/// stepping engine overrides the buffer form to avoid allocation.
pub trait ValueProvider {
    fn current_state(&self) -> Vec<Float>;

    fn current_state_into(&self, buf: &mut [Float]) {
        buf.copy_from_slice(&self.current_state());
    }

    fn current_params(&self) -> Vec<Float>;

    fn current_time(&self) -> Float;

    /// Current state derivative. Only meaningful for implicit/DAE forms;
    /// providers without one return `None`.
    fn current_state_derivative(&self) -> Option<Vec<Float>> {
        None
    }
}

/// Frozen (state, params, time, optional derivative) tuple. Created per
/// initialization call and discarded after use; never shared across calls.
#[derive(Clone, Debug)]
pub struct ValueSnapshot {
    state: Vec<Float>,
    params: Vec<Float>,
    time: Float,
    derivative: Option<Vec<Float>>,
}

impl ValueSnapshot {
    pub fn new(state: Vec<Float>, params: Vec<Float>, time: Float) -> Self {
        Self {
            state,
            params,
            time,
            derivative: None,
        }
    }

    pub fn with_derivative(mut self, derivative: Vec<Float>) -> Self {
        self.derivative = Some(derivative);
        self
    }
}

impl ValueProvider for ValueSnapshot {
    fn current_state(&self) -> Vec<Float> {
        self.state.clone()
    }

    fn current_state_into(&self, buf: &mut [Float]) {
        buf.copy_from_slice(&self.state);
    }

    fn current_params(&self) -> Vec<Float> {
        self.params.clone()
    }

    fn current_time(&self) -> Float {
        self.time
    }

    fn current_state_derivative(&self) -> Option<Vec<Float>> {
        self.derivative.clone()
    }
}
