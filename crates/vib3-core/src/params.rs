//! The closed set of animatable parameters and the value snapshot type.

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{HUE_CIRCLE, MAX_GEOMETRY_INDEX};

/// Every parameter the render layer understands.
///
/// Declaration order is also the iteration order of [`ParameterSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    Hue,
    Saturation,
    Intensity,
    Chaos,
    Speed,
    MorphFactor,
    GridDensity,
    Dimension,
    #[serde(rename = "rot4dXY")]
    Rot4dXY,
    #[serde(rename = "rot4dXZ")]
    Rot4dXZ,
    #[serde(rename = "rot4dYZ")]
    Rot4dYZ,
    #[serde(rename = "rot4dXW")]
    Rot4dXW,
    #[serde(rename = "rot4dYW")]
    Rot4dYW,
    #[serde(rename = "rot4dZW")]
    Rot4dZW,
    Geometry,
}

impl Parameter {
    pub const ALL: [Parameter; 15] = [
        Parameter::Hue,
        Parameter::Saturation,
        Parameter::Intensity,
        Parameter::Chaos,
        Parameter::Speed,
        Parameter::MorphFactor,
        Parameter::GridDensity,
        Parameter::Dimension,
        Parameter::Rot4dXY,
        Parameter::Rot4dXZ,
        Parameter::Rot4dYZ,
        Parameter::Rot4dXW,
        Parameter::Rot4dYW,
        Parameter::Rot4dZW,
        Parameter::Geometry,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Hue => "hue",
            Parameter::Saturation => "saturation",
            Parameter::Intensity => "intensity",
            Parameter::Chaos => "chaos",
            Parameter::Speed => "speed",
            Parameter::MorphFactor => "morphFactor",
            Parameter::GridDensity => "gridDensity",
            Parameter::Dimension => "dimension",
            Parameter::Rot4dXY => "rot4dXY",
            Parameter::Rot4dXZ => "rot4dXZ",
            Parameter::Rot4dYZ => "rot4dYZ",
            Parameter::Rot4dXW => "rot4dXW",
            Parameter::Rot4dYW => "rot4dYW",
            Parameter::Rot4dZW => "rot4dZW",
            Parameter::Geometry => "geometry",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Documented `(min, max)` range.
    pub fn range(self) -> (f64, f64) {
        match self {
            Parameter::Hue => (0.0, HUE_CIRCLE),
            Parameter::Saturation | Parameter::Intensity | Parameter::Chaos => (0.0, 1.0),
            Parameter::Speed => (0.1, 3.0),
            Parameter::MorphFactor => (0.0, 2.0),
            Parameter::GridDensity => (4.0, 100.0),
            Parameter::Dimension => (3.0, 4.5),
            Parameter::Rot4dXY | Parameter::Rot4dXZ | Parameter::Rot4dYZ => (-TAU, TAU),
            Parameter::Rot4dXW | Parameter::Rot4dYW | Parameter::Rot4dZW => (-2.0, 2.0),
            Parameter::Geometry => (0.0, MAX_GEOMETRY_INDEX as f64),
        }
    }

    /// Value assumed when neither the host nor an animator knows better.
    pub fn default_value(self) -> f64 {
        match self {
            Parameter::Hue => 200.0,
            Parameter::Saturation => 0.8,
            Parameter::Intensity => 0.5,
            Parameter::Chaos => 0.2,
            Parameter::Speed => 1.0,
            Parameter::MorphFactor => 1.0,
            Parameter::GridDensity => 15.0,
            Parameter::Dimension => 3.5,
            _ => 0.0,
        }
    }

    pub fn is_circular(self) -> bool {
        self == Parameter::Hue
    }

    pub fn is_rotation(self) -> bool {
        matches!(
            self,
            Parameter::Rot4dXY
                | Parameter::Rot4dXZ
                | Parameter::Rot4dYZ
                | Parameter::Rot4dXW
                | Parameter::Rot4dYW
                | Parameter::Rot4dZW
        )
    }

    /// Clamp into range. Hue wraps instead of clamping.
    pub fn clamp(self, value: f64) -> f64 {
        if self.is_circular() {
            return normalize_hue(value);
        }
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wrap into [0, 360).
pub fn normalize_hue(hue: f64) -> f64 {
    let h = hue.rem_euclid(HUE_CIRCLE);
    // tiny negatives land a rounding error below 360
    if h >= HUE_CIRCLE - 1e-9 { 0.0 } else { h }
}

/// Hue interpolation along the shortest arc.
///
/// The one exception is a full sweep: when `to - from` is a non-zero multiple
/// of 360 the "shortest" arc is empty, so the sweep is taken literally.
/// The result is always wrapped into [0, 360).
pub fn lerp_hue(from: f64, to: f64, t: f64) -> f64 {
    let raw = to - from;
    let full_sweep = raw != 0.0 && (raw % HUE_CIRCLE).abs() < 1e-9;
    let delta = if full_sweep {
        raw
    } else {
        let d = raw.rem_euclid(HUE_CIRCLE);
        if d > HUE_CIRCLE / 2.0 { d - HUE_CIRCLE } else { d }
    };
    normalize_hue(from + delta * t)
}

/// Interpolate `param` from `from` to `to` at eased progress `t`.
pub fn interpolate(param: Parameter, from: f64, to: f64, t: f64) -> f64 {
    if param.is_circular() {
        lerp_hue(from, to, t)
    } else {
        from + (to - from) * t
    }
}

/// A snapshot of parameter values.
///
/// Serializes as a JSON object keyed by parameter name. Only finite values
/// are admitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    #[serde(deserialize_with = "known_parameters")]
    values: BTreeMap<Parameter, f64>,
}

/// Deserialize a map keyed by parameter name, dropping names that are not
/// parameters with a warning instead of failing the whole document.
pub(crate) fn known_parameters<'de, D, V>(
    deserializer: D,
) -> std::result::Result<BTreeMap<Parameter, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match Parameter::from_name(&name) {
            Some(param) => Some((param, value)),
            None => {
                tracing::warn!("skipping unknown parameter {name:?}");
                None
            }
        })
        .collect())
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every parameter at its default.
    pub fn defaults() -> Self {
        Parameter::ALL.into_iter().map(|p| (p, p.default_value())).collect()
    }

    /// Insert a value. Non-finite values are rejected with a warning and
    /// `false` is returned.
    pub fn set(&mut self, param: Parameter, value: f64) -> bool {
        if !value.is_finite() {
            tracing::warn!("rejecting non-finite value for {param}");
            return false;
        }
        self.values.insert(param, value);
        true
    }

    /// Insert by name. Unknown names are rejected with a warning.
    pub fn set_named(&mut self, name: &str, value: f64) -> bool {
        match Parameter::from_name(name) {
            Some(p) => self.set(p, value),
            None => {
                tracing::warn!("unknown parameter {name:?}");
                false
            }
        }
    }

    pub fn with(mut self, param: Parameter, value: f64) -> Self {
        self.set(param, value);
        self
    }

    pub fn get(&self, param: Parameter) -> Option<f64> {
        self.values.get(&param).copied()
    }

    pub fn get_or_default(&self, param: Parameter) -> f64 {
        self.get(param).unwrap_or_else(|| param.default_value())
    }

    pub fn remove(&mut self, param: Parameter) -> Option<f64> {
        self.values.remove(&param)
    }

    pub fn contains(&self, param: Parameter) -> bool {
        self.values.contains_key(&param)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        self.values.iter().map(|(&p, &v)| (p, v))
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (p, v) in other.iter() {
            self.values.insert(p, v);
        }
    }
}

impl FromIterator<(Parameter, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (Parameter, f64)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (p, v) in iter {
            set.set(p, v);
        }
        set
    }
}

/// The three rendering back-ends a host can switch between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualSystem {
    #[default]
    Faceted,
    Quantum,
    Holographic,
}

impl VisualSystem {
    pub const ALL: [VisualSystem; 3] = [
        VisualSystem::Faceted,
        VisualSystem::Quantum,
        VisualSystem::Holographic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VisualSystem::Faceted => "faceted",
            VisualSystem::Quantum => "quantum",
            VisualSystem::Holographic => "holographic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for VisualSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
