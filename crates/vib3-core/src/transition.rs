//! Frame-driven parameter transitions.
//!
//! Nothing here reads a clock. The host calls [`TransitionAnimator::tick`]
//! once per frame with the current time in milliseconds and a sink that
//! receives the interpolated values.
//!
//! Transitions may overlap on the same parameter. Each frame every active
//! entry writes its own parameters in insertion order, so the most recently
//! started entry wins that frame. There is no further arbitration.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::easing::Easing;
use crate::host::ParameterSink;
use crate::params::{Parameter, ParameterSet, interpolate};

/// Shared by single transitions and sequences.
pub type TransitionId = u64;

type CompleteFn = Box<dyn FnMut()>;
type UpdateFn = Box<dyn FnMut(f64)>;

fn sanitize_duration(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 { ms } else { 0.0 }
}

/// What to animate and how.
pub struct TransitionSpec {
    pub params: ParameterSet,
    pub duration_ms: f64,
    pub easing: Easing,
    on_complete: Option<CompleteFn>,
    on_update: Option<UpdateFn>,
}

impl TransitionSpec {
    pub fn new(params: ParameterSet, duration_ms: f64) -> Self {
        Self {
            params,
            duration_ms,
            easing: Easing::EaseInOut,
            on_complete: None,
            on_update: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Receives raw (un-eased) progress in [0, 1] after each frame's writes.
    pub fn on_update(mut self, f: impl FnMut(f64) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for TransitionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionSpec")
            .field("params", &self.params)
            .field("duration_ms", &self.duration_ms)
            .field("easing", &self.easing)
            .finish_non_exhaustive()
    }
}

/// One step of a sequence. `delay_ms` is waited after the previous step ends.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceStep {
    pub params: ParameterSet,
    pub duration_ms: f64,
    pub easing: Easing,
    pub delay_ms: f64,
}

impl SequenceStep {
    pub fn new(params: ParameterSet, duration_ms: f64) -> Self {
        Self {
            params,
            duration_ms,
            easing: Easing::EaseInOut,
            delay_ms: 0.0,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

struct Active {
    from: ParameterSet,
    to: ParameterSet,
    start: f64,
    duration: f64,
    easing: Easing,
    on_complete: Option<CompleteFn>,
    on_update: Option<UpdateFn>,
}

impl Active {
    /// Write this frame's values. Returns true once finished.
    fn step(
        &mut self,
        now: f64,
        memory: &mut BTreeMap<Parameter, f64>,
        sink: &mut dyn ParameterSink,
    ) -> bool {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            ((now - self.start) / self.duration).clamp(0.0, 1.0)
        };
        // The final frame lands exactly on target, whatever the curve does.
        let eased = if t >= 1.0 { 1.0 } else { self.easing.apply(t) };
        for (param, target) in self.to.iter() {
            let from = self.from.get_or_default(param);
            let value = if t >= 1.0 { target } else { interpolate(param, from, target, eased) };
            memory.insert(param, value);
            sink.update_parameter(param, value);
        }
        if let Some(f) = self.on_update.as_mut() {
            f(t);
        }
        if t >= 1.0 {
            if let Some(mut f) = self.on_complete.take() {
                f();
            }
            return true;
        }
        false
    }
}

struct Sequence {
    pending: VecDeque<SequenceStep>,
    current: Option<Active>,
    /// When the next pending step may begin.
    next_start: f64,
    on_complete: Option<CompleteFn>,
}

enum Entry {
    Single(Active),
    Sequence(Sequence),
}

/// Runs any number of concurrent transitions and sequences.
#[derive(Default)]
pub struct TransitionAnimator {
    entries: Vec<(TransitionId, Entry)>,
    /// Last value this animator applied per parameter.
    memory: BTreeMap<Parameter, f64>,
    next_id: TransitionId,
}

impl fmt::Debug for TransitionAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionAnimator")
            .field("active", &self.active_count())
            .field("memory", &self.memory)
            .finish()
    }
}

impl TransitionAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> TransitionId {
        self.next_id += 1;
        self.next_id
    }

    /// Start value for `param`: the host's view, else what this animator last
    /// applied, else the parameter default.
    fn current_value(
        memory: &BTreeMap<Parameter, f64>,
        sink: &dyn ParameterSink,
        param: Parameter,
    ) -> f64 {
        sink.get_parameter(param)
            .filter(|v| v.is_finite())
            .or_else(|| memory.get(&param).copied())
            .unwrap_or_else(|| param.default_value())
    }

    fn capture(
        memory: &BTreeMap<Parameter, f64>,
        sink: &dyn ParameterSink,
        targets: &ParameterSet,
    ) -> ParameterSet {
        targets
            .iter()
            .map(|(p, _)| (p, Self::current_value(memory, sink, p)))
            .collect()
    }

    /// Start a transition at `now`. Start values are captured immediately;
    /// nothing is written until the next [`tick`](Self::tick).
    pub fn transition(
        &mut self,
        spec: TransitionSpec,
        now: f64,
        sink: &dyn ParameterSink,
    ) -> TransitionId {
        let from = Self::capture(&self.memory, sink, &spec.params);
        self.transition_from(spec, from, now)
    }

    /// Like [`transition`](Self::transition) but with caller-supplied start
    /// values. Parameters missing from `from` start at their default.
    pub fn transition_from(&mut self, spec: TransitionSpec, from: ParameterSet, now: f64) -> TransitionId {
        let id = self.allocate_id();
        self.entries.push((
            id,
            Entry::Single(Active {
                from,
                to: spec.params,
                start: now,
                duration: sanitize_duration(spec.duration_ms),
                easing: spec.easing,
                on_complete: spec.on_complete,
                on_update: spec.on_update,
            }),
        ));
        id
    }

    /// Run `steps` one after another. Each step captures its start values at
    /// the moment it begins, so it picks up whatever the previous step or any
    /// concurrent transition left behind.
    pub fn sequence(
        &mut self,
        steps: Vec<SequenceStep>,
        now: f64,
        on_complete: Option<Box<dyn FnMut()>>,
    ) -> TransitionId {
        let id = self.allocate_id();
        let first_delay = steps.first().map_or(0.0, |s| sanitize_duration(s.delay_ms));
        self.entries.push((
            id,
            Entry::Sequence(Sequence {
                pending: steps.into(),
                current: None,
                next_start: now + first_delay,
                on_complete,
            }),
        ));
        id
    }

    /// Stop a transition or sequence where it stands. Returns false for an
    /// unknown or already finished id.
    pub fn cancel(&mut self, id: TransitionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_active(&self, id: TransitionId) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Last value this animator wrote for `param`.
    pub fn value(&self, param: Parameter) -> Option<f64> {
        self.memory.get(&param).copied()
    }

    /// Seed the fallback memory, e.g. from a saved snapshot.
    pub fn remember(&mut self, param: Parameter, value: f64) {
        if value.is_finite() {
            self.memory.insert(param, value);
        }
    }

    /// Advance every entry to `now`. Returns true while anything is active.
    pub fn tick(&mut self, now: f64, sink: &mut dyn ParameterSink) -> bool {
        let memory = &mut self.memory;
        self.entries.retain_mut(|(_, entry)| match entry {
            Entry::Single(active) => !active.step(now, memory, sink),
            Entry::Sequence(seq) => !Self::step_sequence(seq, now, memory, sink),
        });
        !self.entries.is_empty()
    }

    /// Returns true once the whole sequence has finished.
    fn step_sequence(
        seq: &mut Sequence,
        now: f64,
        memory: &mut BTreeMap<Parameter, f64>,
        sink: &mut dyn ParameterSink,
    ) -> bool {
        loop {
            if seq.current.is_none() {
                if now < seq.next_start {
                    return false;
                }
                let Some(step) = seq.pending.pop_front() else {
                    if let Some(mut f) = seq.on_complete.take() {
                        f();
                    }
                    return true;
                };
                let from = Self::capture(memory, sink, &step.params);
                seq.current = Some(Active {
                    from,
                    to: step.params,
                    start: seq.next_start,
                    duration: sanitize_duration(step.duration_ms),
                    easing: step.easing,
                    on_complete: None,
                    on_update: None,
                });
            }

            let Some(active) = seq.current.as_mut() else {
                return false;
            };
            if !active.step(now, memory, sink) {
                return false;
            }
            let ended_at = active.start + active.duration;
            seq.current = None;
            let delay = seq.pending.front().map_or(0.0, |s| sanitize_duration(s.delay_ms));
            seq.next_start = ended_at + delay;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::host::ParameterState;

    fn hue(v: f64) -> ParameterSet {
        ParameterSet::new().with(Parameter::Hue, v)
    }

    #[test]
    fn test_linear_transition_progress() {
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        state.update_parameter(Parameter::Intensity, 0.0);
        let target = ParameterSet::new().with(Parameter::Intensity, 1.0);
        anim.transition(TransitionSpec::new(target, 1000.0).easing(Easing::Linear), 0.0, &state);

        assert!(anim.tick(250.0, &mut state));
        assert_abs_diff_eq!(state.value(Parameter::Intensity).unwrap(), 0.25, epsilon = 1e-12);
        assert!(!anim.tick(1000.0, &mut state));
        assert_eq!(state.value(Parameter::Intensity), Some(1.0));
    }

    #[test]
    fn test_hue_takes_short_way() {
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        state.update_parameter(Parameter::Hue, 350.0);
        anim.transition(TransitionSpec::new(hue(10.0), 100.0).easing(Easing::Linear), 0.0, &state);
        anim.tick(50.0, &mut state);
        assert_abs_diff_eq!(state.value(Parameter::Hue).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cancel_leaves_values_in_place() {
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        state.update_parameter(Parameter::Hue, 100.0);
        let id = anim.transition(TransitionSpec::new(hue(200.0), 1000.0), 0.0, &state);
        assert!(anim.cancel(id));
        assert!(!anim.cancel(id));
        anim.tick(500.0, &mut state);
        assert_eq!(state.get_parameter(Parameter::Hue), Some(100.0));
    }

    #[test]
    fn test_cancel_midway_no_snap() {
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        state.update_parameter(Parameter::Chaos, 0.0);
        let target = ParameterSet::new().with(Parameter::Chaos, 1.0);
        let id = anim.transition(TransitionSpec::new(target, 100.0).easing(Easing::Linear), 0.0, &state);
        anim.tick(40.0, &mut state);
        anim.cancel(id);
        anim.tick(100.0, &mut state);
        assert_abs_diff_eq!(state.value(Parameter::Chaos).unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_last_started_wins_overlap() {
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        anim.transition(TransitionSpec::new(hue(100.0), 0.0), 0.0, &state);
        anim.transition(TransitionSpec::new(hue(300.0), 0.0), 0.0, &state);
        anim.tick(1.0, &mut state);
        assert_eq!(state.value(Parameter::Hue), Some(300.0));
    }

    #[test]
    fn test_callbacks_fire() {
        let done = Rc::new(Cell::new(0));
        let last = Rc::new(Cell::new(-1.0));
        let (d, l) = (done.clone(), last.clone());
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        let spec = TransitionSpec::new(hue(10.0), 100.0)
            .on_complete(move || d.set(d.get() + 1))
            .on_update(move |t| l.set(t));
        anim.transition(spec, 0.0, &state);
        anim.tick(50.0, &mut state);
        assert_eq!(last.get(), 0.5);
        assert_eq!(done.get(), 0);
        anim.tick(200.0, &mut state);
        anim.tick(300.0, &mut state);
        assert_eq!(done.get(), 1);
        assert_eq!(last.get(), 1.0);
    }

    #[test]
    fn test_sequence_captures_fresh_start_values() {
        let mut anim = TransitionAnimator::new();
        let mut state = ParameterState::new();
        state.update_parameter(Parameter::Speed, 1.0);
        let steps = vec![
            SequenceStep::new(ParameterSet::new().with(Parameter::Speed, 2.0), 100.0)
                .easing(Easing::Linear),
            SequenceStep::new(ParameterSet::new().with(Parameter::Speed, 3.0), 100.0)
                .easing(Easing::Linear)
                .delay(50.0),
        ];
        let finished = Rc::new(Cell::new(false));
        let f = finished.clone();
        let id = anim.sequence(steps, 0.0, Some(Box::new(move || f.set(true))));

        anim.tick(100.0, &mut state);
        assert_eq!(state.value(Parameter::Speed), Some(2.0));
        // An outside write during the delay becomes the next step's start.
        state.update_parameter(Parameter::Speed, 1.0);
        anim.tick(120.0, &mut state);
        assert_eq!(state.value(Parameter::Speed), Some(1.0));
        anim.tick(200.0, &mut state);
        assert_abs_diff_eq!(state.value(Parameter::Speed).unwrap(), 2.0, epsilon = 1e-12);
        assert!(anim.is_active(id));
        anim.tick(250.0, &mut state);
        assert_eq!(state.value(Parameter::Speed), Some(3.0));
        assert!(finished.get());
        assert!(!anim.is_active(id));
    }

    #[test]
    fn test_memory_fallback_without_host_reader() {
        use crate::host::FnSink;
        let mut anim = TransitionAnimator::new();
        let mut sink = FnSink(|_, _| {});
        anim.transition(TransitionSpec::new(hue(40.0), 0.0), 0.0, &sink);
        anim.tick(0.0, &mut sink);
        assert_eq!(anim.value(Parameter::Hue), Some(40.0));

        // Default for saturation is used when nothing is known.
        let target = ParameterSet::new().with(Parameter::Saturation, 0.0);
        anim.transition(TransitionSpec::new(target, 100.0).easing(Easing::Linear), 0.0, &sink);
        anim.tick(50.0, &mut sink);
        let expected = Parameter::Saturation.default_value() * 0.5;
        assert_abs_diff_eq!(anim.value(Parameter::Saturation).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_cancel_all() {
        let mut anim = TransitionAnimator::new();
        let state = ParameterState::new();
        anim.transition(TransitionSpec::new(hue(1.0), 10.0), 0.0, &state);
        anim.sequence(vec![SequenceStep::new(hue(2.0), 10.0)], 0.0, None);
        assert_eq!(anim.active_count(), 2);
        anim.cancel_all();
        assert_eq!(anim.active_count(), 0);
    }
}
