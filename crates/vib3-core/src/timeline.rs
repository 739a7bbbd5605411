//! Multi-track keyframe timeline with transport, loop modes and BPM sync.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{FORMAT_VERSION, TIMELINE_FORMAT};
use crate::easing::Easing;
use crate::error::{Error, Result, check_format};
use crate::host::ParameterSink;
use crate::params::{Parameter, ParameterSet, interpolate, known_parameters};

pub const MIN_DURATION_MS: f64 = 100.0;
pub const DEFAULT_DURATION_MS: f64 = 10_000.0;
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 10.0;
pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_TIME_TOLERANCE_MS: f64 = 10.0;
const BEATS_PER_BAR: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f64, value: f64, easing: Easing) -> Self {
        Self { time, value, easing }
    }
}

/// Keyframes for one parameter, always sorted by time with unique times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    keyframes: Vec<Keyframe>,
}

fn enabled_default() -> bool {
    true
}

impl Default for Track {
    fn default() -> Self {
        Self { enabled: true, keyframes: Vec::new() }
    }
}

impl Track {
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Binary-search insert. A keyframe at an existing time replaces it.
    fn insert(&mut self, kf: Keyframe) {
        let idx = self.keyframes.partition_point(|k| k.time < kf.time);
        match self.keyframes.get_mut(idx) {
            Some(existing) if existing.time == kf.time => *existing = kf,
            _ => self.keyframes.insert(idx, kf),
        }
    }

    /// Value at `t`, holding the end values outside the keyframe range.
    /// The arriving keyframe's easing shapes each segment.
    pub fn value_at(&self, param: Parameter, t: f64) -> Option<f64> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if t <= first.time {
            return Some(first.value);
        }
        if t >= last.time {
            return Some(last.value);
        }
        let next = self.keyframes.partition_point(|k| k.time <= t);
        let (a, b) = (self.keyframes[next - 1], self.keyframes[next]);
        let span = b.time - a.time;
        let local = if span > 0.0 { (t - a.time) / span } else { 1.0 };
        Some(interpolate(param, a.value, b.value, b.easing.apply(local)))
    }

    /// Sort and collapse equal times, keeping the later entry.
    fn normalize(&mut self) {
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        let mut out: Vec<Keyframe> = Vec::with_capacity(self.keyframes.len());
        for kf in self.keyframes.drain(..) {
            match out.last_mut() {
                Some(prev) if prev.time == kf.time => *prev = kf,
                _ => out.push(kf),
            }
        }
        self.keyframes = out;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Once,
    Loop,
    Bounce,
}

/// Partial edit for [`ParameterTimeline::update_keyframe`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyframeUpdate {
    pub time: Option<f64>,
    pub value: Option<f64>,
    pub easing: Option<Easing>,
}

/// Tagged export document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineData {
    #[serde(rename = "type")]
    pub format: String,
    pub version: String,
    pub duration: f64,
    #[serde(default)]
    pub loop_mode: LoopMode,
    #[serde(default = "speed_default")]
    pub speed: f64,
    #[serde(default = "bpm_default")]
    pub bpm: f64,
    #[serde(default, deserialize_with = "known_parameters")]
    pub tracks: BTreeMap<Parameter, Track>,
}

fn speed_default() -> f64 {
    1.0
}

fn bpm_default() -> f64 {
    DEFAULT_BPM
}

pub struct ParameterTimeline {
    tracks: BTreeMap<Parameter, Track>,
    duration: f64,
    loop_mode: LoopMode,
    speed: f64,
    bpm: f64,
    current_time: f64,
    /// +1 forward, -1 while a bounce runs backwards.
    direction: f64,
    playing: bool,
    last_tick: Option<f64>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl Default for ParameterTimeline {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS)
    }
}

impl fmt::Debug for ParameterTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterTimeline")
            .field("tracks", &self.tracks)
            .field("duration", &self.duration)
            .field("loop_mode", &self.loop_mode)
            .field("speed", &self.speed)
            .field("bpm", &self.bpm)
            .field("current_time", &self.current_time)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

fn clamp_duration(ms: f64) -> f64 {
    if ms.is_finite() { ms.max(MIN_DURATION_MS) } else { DEFAULT_DURATION_MS }
}

impl ParameterTimeline {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            tracks: BTreeMap::new(),
            duration: clamp_duration(duration_ms),
            loop_mode: LoopMode::Once,
            speed: 1.0,
            bpm: DEFAULT_BPM,
            current_time: 0.0,
            direction: 1.0,
            playing: false,
            last_tick: None,
            on_complete: None,
        }
    }

    // ---- tracks ----

    /// Returns false if the track already exists.
    pub fn add_track(&mut self, param: Parameter) -> bool {
        if self.tracks.contains_key(&param) {
            return false;
        }
        self.tracks.insert(param, Track::default());
        true
    }

    pub fn remove_track(&mut self, param: Parameter) -> bool {
        self.tracks.remove(&param).is_some()
    }

    pub fn set_track_enabled(&mut self, param: Parameter, enabled: bool) -> bool {
        match self.tracks.get_mut(&param) {
            Some(track) => {
                track.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn has_track(&self, param: Parameter) -> bool {
        self.tracks.contains_key(&param)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, param: Parameter) -> Option<&Track> {
        self.tracks.get(&param)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (Parameter, &Track)> {
        self.tracks.iter().map(|(&p, t)| (p, t))
    }

    /// Sorted keyframes for `param`, empty when there is no track.
    pub fn keyframes(&self, param: Parameter) -> &[Keyframe] {
        self.tracks.get(&param).map(Track::keyframes).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    // ---- keyframes ----

    /// Insert in time order, creating the track if needed. Non-finite input
    /// is rejected with a warning.
    pub fn add_keyframe(&mut self, param: Parameter, time: f64, value: f64, easing: Easing) -> bool {
        if !time.is_finite() || !value.is_finite() {
            tracing::warn!("rejecting non-finite keyframe for {param}: t={time} v={value}");
            return false;
        }
        self.tracks
            .entry(param)
            .or_default()
            .insert(Keyframe::new(time.max(0.0), value, easing));
        true
    }

    pub fn remove_keyframe(&mut self, param: Parameter, index: usize) -> Option<Keyframe> {
        let track = self.tracks.get_mut(&param)?;
        if index < track.keyframes.len() {
            Some(track.keyframes.remove(index))
        } else {
            None
        }
    }

    /// Remove the keyframe closest to `time` if it lies within `tolerance_ms`.
    pub fn remove_keyframe_at_time(&mut self, param: Parameter, time: f64, tolerance_ms: f64) -> bool {
        let Some(track) = self.tracks.get_mut(&param) else {
            return false;
        };
        let nearest = track
            .keyframes
            .iter()
            .enumerate()
            .map(|(i, k)| (i, (k.time - time).abs()))
            .filter(|&(_, d)| d <= tolerance_ms)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match nearest {
            Some((i, _)) => {
                track.keyframes.remove(i);
                true
            }
            None => false,
        }
    }

    /// Edit a keyframe in place. A time change re-sorts the track and
    /// replaces any keyframe already at the new time.
    pub fn update_keyframe(&mut self, param: Parameter, index: usize, update: KeyframeUpdate) -> bool {
        let Some(track) = self.tracks.get_mut(&param) else {
            return false;
        };
        let Some(current) = track.keyframes.get(index).copied() else {
            return false;
        };
        let mut kf = current;
        if let Some(v) = update.value {
            if !v.is_finite() {
                tracing::warn!("rejecting non-finite keyframe value for {param}");
                return false;
            }
            kf.value = v;
        }
        if let Some(e) = update.easing {
            kf.easing = e;
        }
        match update.time {
            Some(t) if !t.is_finite() => {
                tracing::warn!("rejecting non-finite keyframe time for {param}");
                false
            }
            Some(t) if t != kf.time => {
                kf.time = t.max(0.0);
                track.keyframes.remove(index);
                track.insert(kf);
                true
            }
            _ => {
                track.keyframes[index] = kf;
                true
            }
        }
    }

    // ---- evaluation ----

    pub fn value_at(&self, param: Parameter, t: f64) -> Option<f64> {
        self.tracks.get(&param)?.value_at(param, t)
    }

    /// Values of every enabled, non-empty track at `t`.
    pub fn values_at(&self, t: f64) -> ParameterSet {
        self.tracks
            .iter()
            .filter(|(_, track)| track.enabled)
            .filter_map(|(&p, track)| track.value_at(p, t).map(|v| (p, v)))
            .collect()
    }

    fn apply(&self, sink: &mut dyn ParameterSink) {
        for (param, value) in self.values_at(self.current_time).iter() {
            sink.update_parameter(param, value);
        }
    }

    // ---- transport ----

    pub fn play(&mut self, now: f64, on_complete: Option<Box<dyn FnMut()>>) {
        if on_complete.is_some() {
            self.on_complete = on_complete;
        }
        if self.loop_mode == LoopMode::Once && self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.playing = true;
        self.last_tick = Some(now);
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.last_tick = None;
    }

    /// Pause, rewind to 0 and re-apply the time-0 values.
    pub fn stop(&mut self, sink: &mut dyn ParameterSink) {
        self.pause();
        self.current_time = 0.0;
        self.direction = 1.0;
        self.apply(sink);
    }

    /// Jump to `ms` (clamped to the duration) and apply the values there.
    pub fn seek(&mut self, ms: f64, sink: &mut dyn ParameterSink) {
        if ms.is_finite() {
            self.current_time = ms.clamp(0.0, self.duration);
        }
        self.apply(sink);
    }

    pub fn seek_normalized(&mut self, fraction: f64, sink: &mut dyn ParameterSink) {
        self.seek(fraction.clamp(0.0, 1.0) * self.duration, sink);
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    pub fn set_duration(&mut self, ms: f64) {
        self.duration = clamp_duration(ms);
        self.current_time = self.current_time.min(self.duration);
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        if mode != LoopMode::Bounce {
            self.direction = 1.0;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Playback position in [0, 1].
    pub fn progress(&self) -> f64 {
        self.current_time / self.duration
    }

    /// True while a bounce is running backwards.
    pub fn is_reversed(&self) -> bool {
        self.direction < 0.0
    }

    /// Advance by the wall time since the previous tick and apply values.
    /// Returns true while still playing.
    pub fn tick(&mut self, now: f64, sink: &mut dyn ParameterSink) -> bool {
        if !self.playing {
            return false;
        }
        let last = self.last_tick.unwrap_or(now);
        self.last_tick = Some(now);
        let advance = (now - last).max(0.0) * self.speed;
        let d = self.duration;

        match self.loop_mode {
            LoopMode::Once => {
                self.current_time += advance;
                if self.current_time >= d {
                    self.current_time = d;
                    self.apply(sink);
                    self.playing = false;
                    self.last_tick = None;
                    if let Some(f) = self.on_complete.as_mut() {
                        f();
                    }
                    return false;
                }
            }
            LoopMode::Loop => {
                self.current_time = (self.current_time + advance).rem_euclid(d);
            }
            LoopMode::Bounce => {
                // Unfold onto a forward-only path of period 2d, then fold back.
                let unfolded = if self.direction >= 0.0 {
                    self.current_time
                } else {
                    2.0 * d - self.current_time
                };
                let phase = (unfolded + advance).rem_euclid(2.0 * d);
                if phase <= d {
                    self.current_time = phase;
                    self.direction = 1.0;
                } else {
                    self.current_time = 2.0 * d - phase;
                    self.direction = -1.0;
                }
            }
        }
        self.apply(sink);
        true
    }

    // ---- tempo ----

    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm.is_finite() {
            self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beat_duration(&self) -> f64 {
        60_000.0 / self.bpm
    }

    pub fn bar_duration(&self) -> f64 {
        self.beat_duration() * BEATS_PER_BAR
    }

    pub fn beat_to_time(&self, beat: f64) -> f64 {
        beat * self.beat_duration()
    }

    pub fn time_to_beat(&self, time: f64) -> f64 {
        time / self.beat_duration()
    }

    /// Snap every keyframe to the nearest `1/subdivision` beat. Keyframes
    /// that land on the same time collapse to the later one.
    pub fn quantize_to_beats(&mut self, subdivision: u32) {
        let grid = self.beat_duration() / subdivision.max(1) as f64;
        for track in self.tracks.values_mut() {
            for kf in &mut track.keyframes {
                kf.time = (kf.time / grid).round() * grid;
            }
            track.normalize();
        }
    }

    /// Set the duration to `bars` whole bars, or round the current duration
    /// up to the next whole bar when `None`.
    pub fn snap_duration_to_bars(&mut self, bars: Option<u32>) {
        let bar = self.bar_duration();
        let count = match bars {
            Some(n) => n.max(1) as f64,
            None => (self.duration / bar).ceil().max(1.0),
        };
        self.set_duration(count * bar);
    }

    // ---- serialization ----

    pub fn export(&self) -> TimelineData {
        TimelineData {
            format: TIMELINE_FORMAT.to_string(),
            version: FORMAT_VERSION.to_string(),
            duration: self.duration,
            loop_mode: self.loop_mode,
            speed: self.speed,
            bpm: self.bpm,
            tracks: self.tracks.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Replace all state with `data`. Validation happens before anything is
    /// touched, so a failed import leaves the timeline as it was.
    pub fn import(&mut self, data: TimelineData) -> Result<()> {
        check_format(TIMELINE_FORMAT, &data.format)?;
        if !data.duration.is_finite() {
            return Err(Error::Malformed("duration is not finite".into()));
        }
        let mut tracks = data.tracks;
        for (param, track) in tracks.iter_mut() {
            if track.keyframes.iter().any(|k| !k.time.is_finite() || !k.value.is_finite()) {
                return Err(Error::Malformed(format!("non-finite keyframe in {param} track")));
            }
            track.normalize();
        }

        self.pause();
        self.tracks = tracks;
        self.duration = clamp_duration(data.duration);
        self.loop_mode = data.loop_mode;
        self.speed = MIN_SPEED.max(data.speed.min(MAX_SPEED));
        self.bpm = MIN_BPM.max(data.bpm.min(MAX_BPM));
        self.current_time = 0.0;
        self.direction = 1.0;
        tracing::debug!(tracks = self.tracks.len(), "imported timeline");
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let data: TimelineData = serde_json::from_str(json)?;
        self.import(data)
    }
}
