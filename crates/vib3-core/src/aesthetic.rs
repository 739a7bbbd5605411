//! Free-text descriptions to parameter sets.
//!
//! "slow dreamy purple torus" becomes hue ≈ 275, speed 0.4, a high morph
//! factor and the torus geometry. Color words vote on hue through a circular
//! mean; every other numeric word is averaged per parameter.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::HUE_CIRCLE;
use crate::geometry::{BaseShape, CoreWarp, encode};
use crate::params::{Parameter, ParameterSet, VisualSystem, normalize_hue};

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

/// Lowercase words with punctuation stripped. Hyphenated words stay whole.
pub fn tokenize(text: &str) -> Vec<String> {
    NON_WORD
        .replace_all(text, " ")
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.trim_matches('-').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Clone, Copy, Debug)]
enum Meaning {
    Color(f64),
    Set(&'static [(Parameter, f64)]),
    Shape(BaseShape),
    Core(CoreWarp),
    System(VisualSystem),
}

static VOCABULARY: LazyLock<BTreeMap<&'static str, Meaning>> = LazyLock::new(|| {
    use Meaning::*;
    use Parameter::*;
    let entries: &[(&str, Meaning)] = &[
        // colors
        ("red", Color(0.0)),
        ("crimson", Color(350.0)),
        ("orange", Color(30.0)),
        ("amber", Color(45.0)),
        ("gold", Color(50.0)),
        ("golden", Color(50.0)),
        ("yellow", Color(58.0)),
        ("lime", Color(90.0)),
        ("green", Color(120.0)),
        ("emerald", Color(140.0)),
        ("teal", Color(170.0)),
        ("cyan", Color(185.0)),
        ("azure", Color(205.0)),
        ("blue", Color(220.0)),
        ("indigo", Color(250.0)),
        ("purple", Color(275.0)),
        ("violet", Color(275.0)),
        ("magenta", Color(300.0)),
        ("pink", Color(330.0)),
        // mood
        ("calm", Set(&[(Speed, 0.5), (Chaos, 0.1)])),
        ("serene", Set(&[(Speed, 0.4), (Chaos, 0.05), (Saturation, 0.5)])),
        ("peaceful", Set(&[(Speed, 0.4), (Chaos, 0.05)])),
        ("energetic", Set(&[(Speed, 2.0), (Chaos, 0.5)])),
        ("chaotic", Set(&[(Chaos, 0.9), (Speed, 1.8)])),
        ("dark", Set(&[(Intensity, 0.25)])),
        ("moody", Set(&[(Intensity, 0.3), (Saturation, 0.5)])),
        ("bright", Set(&[(Intensity, 0.85)])),
        ("vivid", Set(&[(Saturation, 1.0), (Intensity, 0.75)])),
        ("muted", Set(&[(Saturation, 0.35)])),
        ("dreamy", Set(&[(MorphFactor, 1.4), (Speed, 0.6)])),
        ("ethereal", Set(&[(MorphFactor, 1.6), (Intensity, 0.6), (Saturation, 0.45)])),
        ("intense", Set(&[(Intensity, 0.95), (Saturation, 0.9)])),
        ("mysterious", Set(&[(Intensity, 0.35), (Dimension, 4.2)])),
        // motion
        ("slow", Set(&[(Speed, 0.4)])),
        ("fast", Set(&[(Speed, 2.2)])),
        ("rapid", Set(&[(Speed, 2.6)])),
        ("still", Set(&[(Speed, 0.1)])),
        ("flowing", Set(&[(MorphFactor, 1.2), (Speed, 0.8)])),
        ("pulsing", Set(&[(Speed, 1.4), (MorphFactor, 0.8)])),
        ("spinning", Set(&[(Rot4dXW, 1.0), (Speed, 1.5)])),
        ("twisted", Set(&[(Rot4dYW, 1.2), (MorphFactor, 1.5)])),
        // complexity
        ("simple", Set(&[(GridDensity, 8.0), (Chaos, 0.05)])),
        ("minimal", Set(&[(GridDensity, 6.0), (Chaos, 0.0)])),
        ("sparse", Set(&[(GridDensity, 6.0)])),
        ("complex", Set(&[(GridDensity, 60.0), (Chaos, 0.4)])),
        ("intricate", Set(&[(GridDensity, 75.0)])),
        ("dense", Set(&[(GridDensity, 90.0)])),
        ("deep", Set(&[(Dimension, 4.3)])),
        ("flat", Set(&[(Dimension, 3.0)])),
        // base shapes
        ("tetrahedron", Shape(BaseShape::Tetrahedron)),
        ("pyramid", Shape(BaseShape::Tetrahedron)),
        ("cube", Shape(BaseShape::Hypercube)),
        ("hypercube", Shape(BaseShape::Hypercube)),
        ("tesseract", Shape(BaseShape::Hypercube)),
        ("sphere", Shape(BaseShape::Sphere)),
        ("orb", Shape(BaseShape::Sphere)),
        ("torus", Shape(BaseShape::Torus)),
        ("donut", Shape(BaseShape::Torus)),
        ("ring", Shape(BaseShape::Torus)),
        ("klein", Shape(BaseShape::KleinBottle)),
        ("bottle", Shape(BaseShape::KleinBottle)),
        ("fractal", Shape(BaseShape::Fractal)),
        ("recursive", Shape(BaseShape::Fractal)),
        ("wave", Shape(BaseShape::Wave)),
        ("ocean", Shape(BaseShape::Wave)),
        ("ripple", Shape(BaseShape::Wave)),
        ("crystal", Shape(BaseShape::Crystal)),
        ("gem", Shape(BaseShape::Crystal)),
        ("lattice", Shape(BaseShape::Crystal)),
        // core warps
        ("hypersphere", Core(CoreWarp::Hypersphere)),
        ("spherical", Core(CoreWarp::Hypersphere)),
        ("organic", Core(CoreWarp::Hypersphere)),
        ("breathing", Core(CoreWarp::Hypersphere)),
        ("hypertetrahedron", Core(CoreWarp::Hypertetrahedron)),
        ("hypertetra", Core(CoreWarp::Hypertetrahedron)),
        ("angular", Core(CoreWarp::Hypertetrahedron)),
        ("sharp", Core(CoreWarp::Hypertetrahedron)),
        // systems
        ("faceted", System(VisualSystem::Faceted)),
        ("quantum", System(VisualSystem::Quantum)),
        ("holographic", System(VisualSystem::Holographic)),
        ("hologram", System(VisualSystem::Holographic)),
    ];
    entries.iter().copied().collect()
});

fn lookup(word: &str) -> Option<(&'static str, Meaning)> {
    if let Some((k, m)) = VOCABULARY.get_key_value(word) {
        return Some((k, *m));
    }
    // plural fallback: "waves", "crystals"
    let singular = word.strip_suffix('s')?;
    VOCABULARY.get_key_value(singular).map(|(k, m)| (*k, *m))
}

/// What a description resolved to.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AestheticResult {
    pub parameters: ParameterSet,
    /// Vocabulary words that matched, in text order.
    pub matched: Vec<String>,
    pub system: Option<VisualSystem>,
}

/// Circular mean of hue votes in degrees. `None` when the votes cancel out.
pub fn mean_hue(hues: &[f64]) -> Option<f64> {
    if hues.is_empty() {
        return None;
    }
    let (s, c) = hues.iter().fold((0.0, 0.0), |(s, c), h| {
        let r = h.to_radians();
        (s + r.sin(), c + r.cos())
    });
    if s.hypot(c) < 1e-9 {
        return None;
    }
    Some(normalize_hue(s.atan2(c).to_degrees().rem_euclid(HUE_CIRCLE)))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AestheticMapper;

impl AestheticMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn describe(&self, text: &str) -> AestheticResult {
        let mut hues = Vec::new();
        let mut sums: BTreeMap<Parameter, (f64, u32)> = BTreeMap::new();
        let mut shape = None;
        let mut core = None;
        let mut result = AestheticResult::default();

        for token in tokenize(text) {
            let Some((word, meaning)) = lookup(&token) else {
                continue;
            };
            result.matched.push(word.to_string());
            match meaning {
                Meaning::Color(h) => hues.push(h),
                Meaning::Set(pairs) => {
                    for &(param, value) in pairs {
                        let entry = sums.entry(param).or_insert((0.0, 0));
                        entry.0 += value;
                        entry.1 += 1;
                    }
                }
                Meaning::Shape(s) => shape = Some(s),
                Meaning::Core(c) => core = Some(c),
                Meaning::System(s) => result.system = Some(s),
            }
        }

        if let Some(h) = mean_hue(&hues) {
            result.parameters.set(Parameter::Hue, h);
        }
        for (param, (sum, n)) in sums {
            result.parameters.set(param, param.clamp(sum / n as f64));
        }
        if shape.is_some() || core.is_some() {
            let index = encode(
                core.unwrap_or(CoreWarp::Base),
                shape.unwrap_or(BaseShape::Hypercube),
            );
            result.parameters.set(Parameter::Geometry, index as f64);
        }
        tracing::debug!(matched = result.matched.len(), "described aesthetic");
        result
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Slow, DREAMY purple-haze!"), vec!["slow", "dreamy", "purple-haze"]);
    }

    #[test]
    fn test_describe_combines_words() {
        let r = AestheticMapper::new().describe("A slow, dreamy purple torus");
        assert_eq!(r.matched, vec!["slow", "dreamy", "purple", "torus"]);
        assert_eq!(r.parameters.get(Parameter::Hue), Some(275.0));
        assert_abs_diff_eq!(r.parameters.get(Parameter::Speed).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(r.parameters.get(Parameter::MorphFactor), Some(1.4));
        assert_eq!(r.parameters.get(Parameter::Geometry), Some(3.0));
    }

    #[test]
    fn test_hue_average_wraps() {
        let r = AestheticMapper::new().describe("red crimson");
        assert_abs_diff_eq!(r.parameters.get(Parameter::Hue).unwrap(), 355.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mean_hue(&[350.0, 10.0]).unwrap(), 0.0, epsilon = 1e-9);
        assert_eq!(mean_hue(&[0.0, 180.0]), None);
    }

    #[test]
    fn test_core_word_picks_warp() {
        let r = AestheticMapper::new().describe("organic crystals on a quantum stage");
        assert_eq!(r.parameters.get(Parameter::Geometry), Some(15.0));
        assert_eq!(r.system, Some(VisualSystem::Quantum));
    }

    #[test]
    fn test_no_matches() {
        let r = AestheticMapper::new().describe("nothing relevant here");
        assert!(r.matched.is_empty());
        assert!(r.parameters.is_empty());
    }
}
