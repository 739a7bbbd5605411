use vib3_core::{Engine, Parameter, ParameterSet, ParameterSink, ParameterState, VisualSystem};

/// Engine stand-in for running animations without a renderer.
///
/// Keeps the latest value per parameter and counts system switches so the
/// CLI can report what a real renderer would have been told.
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    state: ParameterState,
    switches: Vec<VisualSystem>,
}

impl HeadlessEngine {
    /// Start from the documented default for every parameter.
    pub fn with_defaults() -> Self {
        Self {
            state: ParameterState::with_values(&ParameterSet::defaults()),
            switches: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> ParameterSet {
        self.state.snapshot()
    }

    pub fn update_count(&self) -> usize {
        self.state.update_count()
    }

    /// Every system switch received, in order.
    pub fn switches(&self) -> &[VisualSystem] {
        &self.switches
    }
}

impl ParameterSink for HeadlessEngine {
    fn update_parameter(&mut self, param: Parameter, value: f64) {
        self.state.update_parameter(param, value);
    }

    fn get_parameter(&self, param: Parameter) -> Option<f64> {
        self.state.get_parameter(param)
    }
}

impl Engine for HeadlessEngine {
    fn switch_system(&mut self, system: VisualSystem) {
        tracing::debug!(system = system.as_str(), "switching system");
        self.switches.push(system);
        self.state.switch_system(system);
    }

    fn current_system(&self) -> VisualSystem {
        self.state.current_system()
    }
}
