//! Multi-scene choreography playback.
//!
//! A choreography is a list of time-ordered scenes. Each scene may switch the
//! visual system, geometry, color preset and post-processing chain, and owns
//! keyframe tracks that run on a fresh [`ParameterTimeline`] while the scene
//! is active. Non-cut scene entries crossfade through `intensity`: fade out
//! over the first half, swap scene state while dark, fade back in.
//!
//! Every value the player writes passes through the active post-processing
//! chain on its way to the engine. The player keeps the unprocessed values
//! so a chain change can re-push them without stacking deltas.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color_presets::{ApplyOptions, ColorPresetsSystem};
use crate::constants::MAX_GEOMETRY_INDEX;
use crate::easing::Easing;
use crate::error::{Error, Result};
use crate::host::{Engine, ParameterSink};
use crate::params::{Parameter, ParameterSet, VisualSystem};
use crate::postfx::{Effect, EffectSlot, PostProcessingPipeline};
use crate::timeline::{Keyframe, ParameterTimeline};
use crate::transition::{TransitionAnimator, TransitionId, TransitionSpec};

pub const DEFAULT_CHOREOGRAPHY_MS: f64 = 10_000.0;

/// How a scene is entered. Any `type` other than `"cut"` crossfades.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneTransition {
    #[serde(rename = "type", default = "cut")]
    pub kind: String,
    #[serde(default)]
    pub duration: f64,
}

fn cut() -> String {
    "cut".to_string()
}

impl Default for SceneTransition {
    fn default() -> Self {
        Self { kind: cut(), duration: 0.0 }
    }
}

impl SceneTransition {
    pub fn is_cut(&self) -> bool {
        self.kind == "cut" || self.duration.is_nan() || self.duration <= 0.0
    }
}

/// Post-processing entry as written in a choreography: a bare effect name or
/// an object with a strength.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostFxEntry {
    Name(String),
    Slot {
        effect: String,
        #[serde(default)]
        strength: Option<f64>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    #[serde(default)]
    pub time_start: f64,
    #[serde(default)]
    pub time_end: f64,
    #[serde(default)]
    pub system: Option<VisualSystem>,
    #[serde(default)]
    pub geometry: Option<f64>,
    #[serde(default)]
    pub transition_in: SceneTransition,
    #[serde(default)]
    pub tracks: BTreeMap<String, Vec<Keyframe>>,
    #[serde(default)]
    pub color_preset: Option<String>,
    #[serde(default)]
    pub post_processing: Vec<PostFxEntry>,
    #[serde(default)]
    pub audio: Option<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    #[default]
    Once,
    Loop,
}

/// Choreography document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreographySpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub loop_mode: PlaybackMode,
    #[serde(default)]
    pub scenes: Vec<SceneSpec>,
}

/// A validated scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub index: usize,
    pub time_start: f64,
    pub time_end: f64,
    pub system: Option<VisualSystem>,
    pub geometry: Option<u8>,
    pub transition_in: SceneTransition,
    pub tracks: BTreeMap<Parameter, Vec<Keyframe>>,
    pub color_preset: Option<String>,
    pub post_processing: Vec<EffectSlot>,
    pub audio: Option<serde_json::Value>,
}

impl Scene {
    fn from_spec(spec: SceneSpec) -> Self {
        let geometry = spec.geometry.and_then(|g| {
            if g.is_finite() && (0.0..=MAX_GEOMETRY_INDEX as f64).contains(&g.round()) {
                Some(g.round() as u8)
            } else {
                tracing::warn!("ignoring out-of-range scene geometry {g}");
                None
            }
        });
        let tracks = spec
            .tracks
            .into_iter()
            .filter_map(|(name, kfs)| match Parameter::from_name(&name) {
                Some(p) => Some((p, kfs)),
                None => {
                    tracing::warn!("ignoring track for unknown parameter {name:?}");
                    None
                }
            })
            .collect();
        let post_processing = spec
            .post_processing
            .into_iter()
            .filter_map(|entry| {
                let (name, strength) = match entry {
                    PostFxEntry::Name(name) => (name, None),
                    PostFxEntry::Slot { effect, strength } => (effect, strength),
                };
                let Some(effect) = Effect::from_name(&name) else {
                    tracing::warn!("ignoring unknown effect {name:?}");
                    return None;
                };
                Some(EffectSlot {
                    effect,
                    strength: strength.unwrap_or(1.0),
                    enabled: true,
                })
            })
            .collect();
        Self {
            index: 0,
            time_start: spec.time_start,
            time_end: spec.time_end.max(spec.time_start),
            system: spec.system,
            geometry,
            transition_in: spec.transition_in,
            tracks,
            color_preset: spec.color_preset,
            post_processing,
            audio: spec.audio,
        }
    }

    pub fn duration(&self) -> f64 {
        self.time_end - self.time_start
    }

    fn build_timeline(&self) -> ParameterTimeline {
        let mut timeline = ParameterTimeline::new(self.duration());
        for (&param, keyframes) in &self.tracks {
            timeline.add_track(param);
            for kf in keyframes {
                timeline.add_keyframe(param, kf.time, kf.value, kf.easing);
            }
        }
        timeline
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FadePhase {
    Out,
    In,
}

#[derive(Clone, Copy, Debug)]
struct Crossfade {
    scene: usize,
    phase: FadePhase,
    half: f64,
    opening: f64,
    /// Intensity on screen before the fade started.
    restore: f64,
    id: TransitionId,
}

#[derive(Default)]
pub struct ChoreographyPlayer {
    name: Option<String>,
    scenes: Vec<Scene>,
    duration: f64,
    mode: PlaybackMode,
    current_time: f64,
    playing: bool,
    last_tick: Option<f64>,
    active: Option<usize>,
    timeline: Option<ParameterTimeline>,
    animator: TransitionAnimator,
    crossfade: Option<Crossfade>,
    presets: ColorPresetsSystem,
    postfx: PostProcessingPipeline,
    base: BTreeMap<Parameter, f64>,
    on_scene_change: Option<Box<dyn FnMut(usize)>>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for ChoreographyPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoreographyPlayer")
            .field("name", &self.name)
            .field("scenes", &self.scenes.len())
            .field("duration", &self.duration)
            .field("current_time", &self.current_time)
            .field("playing", &self.playing)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl ChoreographyPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and install a choreography. Scenes are sorted by start time
    /// and the total duration is inferred from the latest scene end when not
    /// given. On error the player keeps whatever it had loaded before.
    pub fn load(&mut self, spec: ChoreographySpec) -> Result<()> {
        if spec.scenes.is_empty() {
            tracing::warn!("refusing choreography without scenes");
            return Err(Error::EmptyScenes);
        }
        let mut scenes: Vec<Scene> = spec.scenes.into_iter().map(Scene::from_spec).collect();
        scenes.sort_by(|a, b| a.time_start.total_cmp(&b.time_start));
        for (i, scene) in scenes.iter_mut().enumerate() {
            scene.index = i;
        }

        let inferred = scenes.iter().map(|s| s.time_end).fold(0.0, f64::max);
        let duration = match spec.duration_ms {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ if inferred > 0.0 => inferred,
            _ => DEFAULT_CHOREOGRAPHY_MS,
        };

        self.reset();
        self.name = spec.name;
        self.scenes = scenes;
        self.duration = duration;
        self.mode = spec.loop_mode;
        tracing::debug!(scenes = self.scenes.len(), duration, "loaded choreography");
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let spec: ChoreographySpec = serde_json::from_str(json)?;
        self.load(spec)
    }

    fn reset(&mut self) {
        self.playing = false;
        self.last_tick = None;
        self.current_time = 0.0;
        self.active = None;
        self.timeline = None;
        self.animator.cancel_all();
        self.crossfade = None;
    }

    pub fn on_scene_change(&mut self, f: impl FnMut(usize) + 'static) {
        self.on_scene_change = Some(Box::new(f));
    }

    pub fn on_complete(&mut self, f: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    // ---- queries ----

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 { self.current_time / self.duration } else { 0.0 }
    }

    pub fn current_scene_index(&self) -> Option<usize> {
        self.active
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.active?)
    }

    pub fn is_crossfading(&self) -> bool {
        self.crossfade.is_some()
    }

    pub fn set_loop_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn presets(&self) -> &ColorPresetsSystem {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut ColorPresetsSystem {
        &mut self.presets
    }

    pub fn post_processing(&self) -> &PostProcessingPipeline {
        &self.postfx
    }

    /// The scene that owns time `t`: the last one starting at or before it.
    pub fn scene_at(&self, t: f64) -> Option<usize> {
        if self.scenes.is_empty() {
            return None;
        }
        Some(self.scenes.iter().rposition(|s| s.time_start <= t).unwrap_or(0))
    }

    // ---- transport ----

    /// Start or resume playback. Returns false when nothing is loaded.
    pub fn play<E: Engine>(&mut self, now: f64, engine: &mut E) -> bool {
        if self.scenes.is_empty() {
            return false;
        }
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.playing = true;
        self.last_tick = Some(now);
        match self.scene_at(self.current_time) {
            Some(idx) if self.active != Some(idx) => self.enter_scene(idx, now, engine, true),
            _ => {
                if let Some(tl) = self.timeline.as_mut() {
                    tl.play(now, None);
                }
            }
        }
        true
    }

    /// Pause. A crossfade in progress is finished on the spot.
    pub fn pause<E: Engine>(&mut self, now: f64, engine: &mut E) {
        self.playing = false;
        self.last_tick = None;
        if let Some(tl) = self.timeline.as_mut() {
            tl.pause();
        }
        self.finish_crossfade(now, engine);
    }

    /// Stop and rewind. The active scene is cleared and a crossfade in
    /// progress is settled first so the engine is not left dark.
    pub fn stop<E: Engine>(&mut self, engine: &mut E) {
        self.settle_crossfade(engine);
        self.reset();
    }

    /// Jump to `ms`. Scene changes caused by a seek cut without fading.
    pub fn seek<E: Engine>(&mut self, ms: f64, now: f64, engine: &mut E) {
        if !ms.is_finite() || self.scenes.is_empty() {
            return;
        }
        self.current_time = ms.clamp(0.0, self.duration);
        if self.playing {
            self.last_tick = Some(now);
        }
        let Some(idx) = self.scene_at(self.current_time) else {
            return;
        };
        if self.active == Some(idx) {
            let local = self.current_time - self.scenes[idx].time_start;
            if let Some(tl) = self.timeline.as_mut() {
                tl.seek(local, &mut Processed::new(engine, &self.postfx, &mut self.base));
                if self.playing {
                    tl.play(now, None);
                }
            }
        } else {
            self.enter_scene(idx, now, engine, false);
        }
    }

    /// Seek to a fraction of the total duration, clamped to [0, 1].
    pub fn seek_to_percent<E: Engine>(&mut self, fraction: f64, now: f64, engine: &mut E) {
        if fraction.is_nan() {
            return;
        }
        self.seek(fraction.clamp(0.0, 1.0) * self.duration, now, engine);
    }

    /// Advance to `now`. Returns true while playing.
    pub fn tick<E: Engine>(&mut self, now: f64, engine: &mut E) -> bool {
        if !self.playing {
            return false;
        }
        let last = self.last_tick.unwrap_or(now);
        self.last_tick = Some(now);
        self.current_time += (now - last).max(0.0);

        let mut wrapped = false;
        if self.current_time >= self.duration {
            match self.mode {
                PlaybackMode::Once => {
                    self.current_time = self.duration;
                    self.advance_scene(now, engine, false);
                    self.finish_crossfade(now, engine);
                    self.playing = false;
                    self.last_tick = None;
                    if let Some(tl) = self.timeline.as_mut() {
                        tl.pause();
                    }
                    tracing::debug!("choreography complete");
                    if let Some(f) = self.on_complete.as_mut() {
                        f();
                    }
                    return false;
                }
                PlaybackMode::Loop => {
                    self.current_time = self.current_time.rem_euclid(self.duration);
                    wrapped = true;
                }
            }
        }

        self.advance_scene(now, engine, wrapped);
        self.step_crossfade(now, engine);
        true
    }

    /// Enter the scene owning the current time if it changed (or `force`),
    /// otherwise advance the active scene's timeline.
    fn advance_scene<E: Engine>(&mut self, now: f64, engine: &mut E, force: bool) {
        let Some(idx) = self.scene_at(self.current_time) else {
            return;
        };
        if force || self.active != Some(idx) {
            self.enter_scene(idx, now, engine, true);
        } else if let Some(tl) = self.timeline.as_mut() {
            tl.tick(now, &mut Processed::new(engine, &self.postfx, &mut self.base));
        }
    }

    fn enter_scene<E: Engine>(&mut self, idx: usize, now: f64, engine: &mut E, allow_fade: bool) {
        let previous = self.active;
        self.active = Some(idx);
        self.settle_crossfade(engine);

        let scene = &self.scenes[idx];
        tracing::debug!(scene = idx, start = scene.time_start, "entering scene");
        let local = (self.current_time - scene.time_start).max(0.0);
        let mut timeline = scene.build_timeline();
        let fade = allow_fade && previous.is_some() && !scene.transition_in.is_cut();

        if fade {
            let half = scene.transition_in.duration / 2.0;
            let opening = self.opening_intensity(idx, &timeline, local, &*engine);
            let from = current_value(&*engine, &self.animator, Parameter::Intensity);
            let spec = TransitionSpec::new(ParameterSet::new().with(Parameter::Intensity, 0.0), half)
                .easing(Easing::Linear);
            let id = self.animator.transition_from(
                spec,
                ParameterSet::new().with(Parameter::Intensity, from),
                now,
            );
            self.crossfade = Some(Crossfade {
                scene: idx,
                phase: FadePhase::Out,
                half,
                opening,
                restore: from,
                id,
            });
            // Tracks other than intensity can start right away.
            let mut sink = Processed::new(engine, &self.postfx, &mut self.base);
            timeline.seek(local, &mut WithoutIntensity(&mut sink));
        } else {
            self.apply_scene_state(idx, now, engine);
            timeline.seek(local, &mut Processed::new(engine, &self.postfx, &mut self.base));
        }

        if self.playing {
            timeline.play(now, None);
        }
        self.timeline = Some(timeline);

        if let Some(f) = self.on_scene_change.as_mut() {
            f(idx);
        }
    }

    fn opening_intensity<E: Engine>(
        &self,
        idx: usize,
        timeline: &ParameterTimeline,
        local: f64,
        engine: &E,
    ) -> f64 {
        let scene = &self.scenes[idx];
        timeline
            .value_at(Parameter::Intensity, local)
            .or_else(|| {
                let name = scene.color_preset.as_deref()?;
                self.presets.get(name).map(|p| p.intensity)
            })
            .unwrap_or_else(|| self.raw_value(engine, Parameter::Intensity))
    }

    /// Last value the player wrote for `param` before post-processing.
    fn raw_value<S: ParameterSink + ?Sized>(&self, engine: &S, param: Parameter) -> f64 {
        match self.base.get(&param) {
            Some(&v) => v,
            None => current_value(engine, &self.animator, param),
        }
    }

    /// System, geometry, color preset and post-processing for a scene.
    /// Parameters the old or new chain adjusts are re-pushed from their raw
    /// values so the engine shows exactly the new chain's deltas.
    fn apply_scene_state<E: Engine>(&mut self, idx: usize, now: f64, engine: &mut E) {
        let scene = &self.scenes[idx];
        if let Some(system) = scene.system {
            engine.switch_system(system);
        }
        if let Some(geometry) = scene.geometry {
            engine.update_parameter(Parameter::Geometry, geometry as f64);
        }
        let mut touched = self.postfx.affected();
        self.postfx.clear();
        for slot in &scene.post_processing {
            self.postfx.add(slot.effect, slot.strength);
        }
        touched.extend(self.postfx.affected());

        let raw: Vec<(Parameter, f64)> = touched
            .into_iter()
            .map(|param| (param, self.raw_value(&*engine, param)))
            .collect();
        let mut sink = Processed::new(engine, &self.postfx, &mut self.base);
        for (param, value) in raw {
            sink.update_parameter(param, value);
        }
        if let Some(name) = scene.color_preset.clone() {
            self.presets.apply_preset(&name, ApplyOptions::immediate(), now, &mut sink);
        }
    }

    fn step_crossfade<E: Engine>(&mut self, now: f64, engine: &mut E) {
        let Some(cf) = self.crossfade else {
            return;
        };
        // Timeline writes happened already this frame; the fade goes last so
        // it owns intensity while it runs.
        self.animator.tick(now, engine);
        if self.animator.is_active(cf.id) {
            return;
        }
        match cf.phase {
            FadePhase::Out => {
                self.apply_scene_state(cf.scene, now, engine);
                self.base.insert(Parameter::Intensity, cf.opening);
                engine.update_parameter(Parameter::Intensity, 0.0);
                let target = self.postfx.apply_value(Parameter::Intensity, cf.opening);
                let spec = TransitionSpec::new(
                    ParameterSet::new().with(Parameter::Intensity, target),
                    cf.half,
                )
                .easing(Easing::Linear);
                let id = self.animator.transition_from(
                    spec,
                    ParameterSet::new().with(Parameter::Intensity, 0.0),
                    now,
                );
                self.crossfade = Some(Crossfade { phase: FadePhase::In, id, ..cf });
            }
            FadePhase::In => self.crossfade = None,
        }
    }

    /// Jump a running crossfade to its end state.
    fn finish_crossfade<E: Engine>(&mut self, now: f64, engine: &mut E) {
        let Some(cf) = self.crossfade.take() else {
            return;
        };
        self.animator.cancel(cf.id);
        if cf.phase == FadePhase::Out {
            self.apply_scene_state(cf.scene, now, engine);
        }
        Processed::new(engine, &self.postfx, &mut self.base)
            .update_parameter(Parameter::Intensity, cf.opening);
    }

    /// Abandon a running crossfade without entering its scene. Before the
    /// midpoint the old scene is still in place, so its intensity comes back;
    /// after it the new scene's opening intensity is written outright.
    fn settle_crossfade<S: ParameterSink + ?Sized>(&mut self, engine: &mut S) {
        let Some(cf) = self.crossfade.take() else {
            return;
        };
        self.animator.cancel(cf.id);
        tracing::debug!(scene = cf.scene, phase = ?cf.phase, "settling interrupted crossfade");
        match cf.phase {
            FadePhase::Out => engine.update_parameter(Parameter::Intensity, cf.restore),
            FadePhase::In => Processed::new(engine, &self.postfx, &mut self.base)
                .update_parameter(Parameter::Intensity, cf.opening),
        }
    }
}

fn current_value<S: ParameterSink + ?Sized>(sink: &S, animator: &TransitionAnimator, param: Parameter) -> f64 {
    sink.get_parameter(param)
        .or_else(|| animator.value(param))
        .unwrap_or_else(|| param.default_value())
}

/// Runs every write through the post-processing chain, remembering the raw
/// value. Reads answer with the raw value when there is one.
struct Processed<'a, S: ParameterSink + ?Sized> {
    sink: &'a mut S,
    postfx: &'a PostProcessingPipeline,
    base: &'a mut BTreeMap<Parameter, f64>,
}

impl<'a, S: ParameterSink + ?Sized> Processed<'a, S> {
    fn new(
        sink: &'a mut S,
        postfx: &'a PostProcessingPipeline,
        base: &'a mut BTreeMap<Parameter, f64>,
    ) -> Self {
        Self { sink, postfx, base }
    }
}

impl<S: ParameterSink + ?Sized> ParameterSink for Processed<'_, S> {
    fn update_parameter(&mut self, param: Parameter, value: f64) {
        self.base.insert(param, value);
        self.sink.update_parameter(param, self.postfx.apply_value(param, value));
    }

    fn get_parameter(&self, param: Parameter) -> Option<f64> {
        self.base.get(&param).copied().or_else(|| self.sink.get_parameter(param))
    }
}

/// Forwards everything except intensity, which a crossfade owns.
struct WithoutIntensity<'a, S: ParameterSink + ?Sized>(&'a mut S);

impl<S: ParameterSink + ?Sized> ParameterSink for WithoutIntensity<'_, S> {
    fn update_parameter(&mut self, param: Parameter, value: f64) {
        if param != Parameter::Intensity {
            self.0.update_parameter(param, value);
        }
    }

    fn get_parameter(&self, param: Parameter) -> Option<f64> {
        self.0.get_parameter(param)
    }
}
