//! The seam between the animation runtime and whatever renders.
//!
//! Animators never own parameter state. They push values through a
//! [`ParameterSink`] and, when the host offers it, read current values back.

use std::collections::BTreeMap;

use crate::params::{Parameter, ParameterSet, VisualSystem};

/// Receives interpolated values every frame.
///
/// `update_parameter` may be called many times per frame for different
/// parameters and must not assume any particular order.
pub trait ParameterSink {
    fn update_parameter(&mut self, param: Parameter, value: f64);

    /// Current value as the host sees it. `None` means the host does not
    /// track state and animators should fall back to their own memory.
    fn get_parameter(&self, _param: Parameter) -> Option<f64> {
        None
    }
}

/// The whole surface a choreography needs from its rendering engine.
pub trait Engine: ParameterSink {
    fn switch_system(&mut self, system: VisualSystem);
    fn current_system(&self) -> VisualSystem;
}

/// In-memory host that records the latest value per parameter.
#[derive(Clone, Debug, Default)]
pub struct ParameterState {
    values: BTreeMap<Parameter, f64>,
    system: VisualSystem,
    updates: usize,
}

impl ParameterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: &ParameterSet) -> Self {
        let mut state = Self::new();
        for (p, v) in values.iter() {
            state.values.insert(p, v);
        }
        state
    }

    pub fn value(&self, param: Parameter) -> Option<f64> {
        self.values.get(&param).copied()
    }

    /// Number of `update_parameter` calls received so far.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    pub fn snapshot(&self) -> ParameterSet {
        self.values.iter().map(|(&p, &v)| (p, v)).collect()
    }
}

impl ParameterSink for ParameterState {
    fn update_parameter(&mut self, param: Parameter, value: f64) {
        self.updates += 1;
        self.values.insert(param, value);
    }

    fn get_parameter(&self, param: Parameter) -> Option<f64> {
        self.value(param)
    }
}

impl Engine for ParameterState {
    fn switch_system(&mut self, system: VisualSystem) {
        self.system = system;
    }

    fn current_system(&self) -> VisualSystem {
        self.system
    }
}

/// Adapts a closure into a write-only sink.
pub struct FnSink<F: FnMut(Parameter, f64)>(pub F);

impl<F: FnMut(Parameter, f64)> ParameterSink for FnSink<F> {
    fn update_parameter(&mut self, param: Parameter, value: f64) {
        (self.0)(param, value);
    }
}
