//! Post-processing effect chain.
//!
//! Effects are not pixel shaders here. Each effect nudges engine parameters
//! by a fixed delta scaled by its strength; the render layer reads the
//! adjusted set together with the ordered effect list.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{FORMAT_VERSION, POSTPROCESS_FORMAT};
use crate::error::{Error, Result, check_format};
use crate::params::{Parameter, ParameterSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    Bloom,
    Glow,
    ChromaticAberration,
    Vignette,
    FilmGrain,
    Scanlines,
    Glitch,
    Pixelate,
    Blur,
    Invert,
    Kaleidoscope,
    Feedback,
}

impl Effect {
    pub const ALL: [Effect; 12] = [
        Effect::Bloom,
        Effect::Glow,
        Effect::ChromaticAberration,
        Effect::Vignette,
        Effect::FilmGrain,
        Effect::Scanlines,
        Effect::Glitch,
        Effect::Pixelate,
        Effect::Blur,
        Effect::Invert,
        Effect::Kaleidoscope,
        Effect::Feedback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Effect::Bloom => "bloom",
            Effect::Glow => "glow",
            Effect::ChromaticAberration => "chromaticAberration",
            Effect::Vignette => "vignette",
            Effect::FilmGrain => "filmGrain",
            Effect::Scanlines => "scanlines",
            Effect::Glitch => "glitch",
            Effect::Pixelate => "pixelate",
            Effect::Blur => "blur",
            Effect::Invert => "invert",
            Effect::Kaleidoscope => "kaleidoscope",
            Effect::Feedback => "feedback",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Parameter deltas at full strength.
    pub fn deltas(self) -> &'static [(Parameter, f64)] {
        use Parameter::*;
        match self {
            Effect::Bloom => &[(Intensity, 0.15), (Saturation, 0.05)],
            Effect::Glow => &[(Intensity, 0.1), (MorphFactor, 0.1)],
            Effect::ChromaticAberration => &[(Chaos, 0.1), (Hue, 8.0)],
            Effect::Vignette => &[(Intensity, -0.1)],
            Effect::FilmGrain => &[(Chaos, 0.15)],
            Effect::Scanlines => &[(GridDensity, 20.0), (Intensity, -0.05)],
            Effect::Glitch => &[(Chaos, 0.35), (Speed, 0.3)],
            Effect::Pixelate => &[(GridDensity, -8.0)],
            Effect::Blur => &[(GridDensity, -10.0), (Chaos, -0.05)],
            Effect::Invert => &[(Hue, 180.0)],
            Effect::Kaleidoscope => &[(MorphFactor, 0.4), (Rot4dXY, std::f64::consts::FRAC_PI_4)],
            Effect::Feedback => &[(Speed, -0.2), (MorphFactor, 0.2)],
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectSlot {
    pub effect: Effect,
    #[serde(default = "full_strength")]
    pub strength: f64,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn full_strength() -> f64 {
    1.0
}

fn enabled_default() -> bool {
    true
}

fn clamp_strength(s: f64) -> f64 {
    if s.is_finite() { s.clamp(0.0, 1.0) } else { 1.0 }
}

/// Built-in chains loadable by name.
pub const PIPELINE_PRESETS: &[(&str, &[(Effect, f64)])] = &[
    ("cinematic", &[(Effect::Bloom, 0.6), (Effect::Vignette, 0.5), (Effect::FilmGrain, 0.3)]),
    ("retro", &[(Effect::Scanlines, 0.7), (Effect::ChromaticAberration, 0.4), (Effect::FilmGrain, 0.5)]),
    ("dreamy", &[(Effect::Glow, 0.7), (Effect::Blur, 0.4), (Effect::Bloom, 0.5)]),
    ("glitchcore", &[(Effect::Glitch, 0.8), (Effect::ChromaticAberration, 0.6), (Effect::Pixelate, 0.3)]),
    ("psychedelic", &[(Effect::Kaleidoscope, 0.8), (Effect::Feedback, 0.6), (Effect::Glow, 0.4)]),
    ("minimal", &[(Effect::Vignette, 0.3)]),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    #[serde(rename = "type")]
    pub format: String,
    pub version: String,
    pub effects: Vec<EffectSlot>,
}

/// Ordered effect chain. Each effect appears at most once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostProcessingPipeline {
    slots: Vec<EffectSlot>,
}

impl PostProcessingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> &[EffectSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn position(&self, effect: Effect) -> Option<usize> {
        self.slots.iter().position(|s| s.effect == effect)
    }

    /// Append an effect, or update its strength if already present.
    pub fn add(&mut self, effect: Effect, strength: f64) {
        let strength = clamp_strength(strength);
        match self.position(effect) {
            Some(i) => self.slots[i].strength = strength,
            None => self.slots.push(EffectSlot { effect, strength, enabled: true }),
        }
    }

    /// Name-based [`add`](Self::add). Unknown names warn and return false.
    pub fn add_named(&mut self, name: &str, strength: f64) -> bool {
        match Effect::from_name(name) {
            Some(effect) => {
                self.add(effect, strength);
                true
            }
            None => {
                tracing::warn!("unknown post-processing effect {name:?}");
                false
            }
        }
    }

    pub fn remove(&mut self, effect: Effect) -> bool {
        match self.position(effect) {
            Some(i) => {
                self.slots.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn set_strength(&mut self, effect: Effect, strength: f64) -> bool {
        match self.position(effect) {
            Some(i) => {
                self.slots[i].strength = clamp_strength(strength);
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&mut self, effect: Effect, enabled: bool) -> bool {
        match self.position(effect) {
            Some(i) => {
                self.slots[i].enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Move the effect at `from` to index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.slots.len() || to >= self.slots.len() {
            return false;
        }
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Replace the chain with a named preset.
    pub fn load_preset(&mut self, name: &str) -> bool {
        let Some((_, effects)) = PIPELINE_PRESETS.iter().find(|(n, _)| *n == name) else {
            tracing::warn!("unknown pipeline preset {name:?}");
            return false;
        };
        self.slots = effects
            .iter()
            .map(|&(effect, strength)| EffectSlot { effect, strength, enabled: true })
            .collect();
        true
    }

    /// Parameters some enabled effect adjusts.
    pub fn affected(&self) -> BTreeSet<Parameter> {
        self.slots
            .iter()
            .filter(|s| s.enabled)
            .flat_map(|s| s.effect.deltas().iter().map(|&(param, _)| param))
            .collect()
    }

    /// `value` for `param` with every enabled effect's delta added in chain
    /// order, clamped after each step.
    pub fn apply_value(&self, param: Parameter, value: f64) -> f64 {
        self.slots
            .iter()
            .filter(|s| s.enabled)
            .flat_map(|s| {
                s.effect
                    .deltas()
                    .iter()
                    .filter(move |&&(p, _)| p == param)
                    .map(move |&(_, delta)| delta * s.strength)
            })
            .fold(value, |acc, delta| param.clamp(acc + delta))
    }

    /// `base` with [`apply_value`](Self::apply_value) run over every
    /// affected parameter.
    pub fn apply(&self, base: &ParameterSet) -> ParameterSet {
        let mut out = base.clone();
        for param in self.affected() {
            out.set(param, self.apply_value(param, base.get_or_default(param)));
        }
        out
    }

    pub fn export(&self) -> PipelineDocument {
        PipelineDocument {
            format: POSTPROCESS_FORMAT.to_string(),
            version: FORMAT_VERSION.to_string(),
            effects: self.slots.clone(),
        }
    }

    /// Replace the chain. Duplicate effects are refused and nothing changes.
    pub fn import(&mut self, doc: PipelineDocument) -> Result<()> {
        check_format(POSTPROCESS_FORMAT, &doc.format)?;
        for (i, slot) in doc.effects.iter().enumerate() {
            if doc.effects[..i].iter().any(|s| s.effect == slot.effect) {
                return Err(Error::Malformed(format!("duplicate effect {}", slot.effect)));
            }
        }
        self.slots = doc
            .effects
            .into_iter()
            .map(|s| EffectSlot { strength: clamp_strength(s.strength), ..s })
            .collect();
        Ok(())
    }
}
