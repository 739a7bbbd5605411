//! Named easing curves over normalized progress.
//!
//! `f(0) = 0` and `f(1) = 1` for every curve. `backIn`, `backOut`, `elastic`
//! and `bounce` overshoot on the way. `steps` quantizes progress into four
//! flat plateaus.

use std::f64::consts::{PI, TAU};
use std::fmt;

use serde::{Deserialize, Serialize};

const BACK_OVERSHOOT: f64 = 1.70158;
const STEP_COUNT: f64 = 4.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    Bounce,
    Elastic,
    Cubic,
    BackOut,
    BackIn,
    ExpoOut,
    ExpoIn,
    SineInOut,
    Steps,
}

impl Easing {
    pub const ALL: [Easing; 15] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::Bounce,
        Easing::Elastic,
        Easing::Cubic,
        Easing::BackOut,
        Easing::BackIn,
        Easing::ExpoOut,
        Easing::ExpoIn,
        Easing::SineInOut,
        Easing::Steps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "easeIn",
            Easing::EaseOut => "easeOut",
            Easing::EaseInOut => "easeInOut",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::Bounce => "bounce",
            Easing::Elastic => "elastic",
            Easing::Cubic => "cubic",
            Easing::BackOut => "backOut",
            Easing::BackIn => "backIn",
            Easing::ExpoOut => "expoOut",
            Easing::ExpoIn => "expoIn",
            Easing::SineInOut => "sineInOut",
            Easing::Steps => "steps",
        }
    }

    /// Exact lookup. Use [`Easing::from_name`] for the lenient form.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Unknown names fall back to [`Easing::Linear`].
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!("unknown easing {name:?}, using linear");
            Easing::Linear
        })
    }

    /// Apply to progress `t`, clamped to [0, 1] first.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseIn | Easing::EaseInQuad => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Cubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let f = -2.0 * t + 2.0;
                    1.0 - f * f * f / 2.0
                }
            }
            Easing::Bounce => bounce_out(t),
            Easing::Elastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * (TAU / 3.0)).sin() + 1.0
                }
            }
            Easing::BackOut => {
                let c3 = BACK_OVERSHOOT + 1.0;
                let f = t - 1.0;
                1.0 + c3 * f * f * f + BACK_OVERSHOOT * f * f
            }
            Easing::BackIn => {
                let c3 = BACK_OVERSHOOT + 1.0;
                c3 * t * t * t - BACK_OVERSHOOT * t * t
            }
            Easing::ExpoOut => {
                if t == 1.0 { 1.0 } else { 1.0 - 2f64.powf(-10.0 * t) }
            }
            Easing::ExpoIn => {
                if t == 0.0 { 0.0 } else { 2f64.powf(10.0 * t - 10.0) }
            }
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::Steps => (t * STEP_COUNT).floor() / STEP_COUNT,
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Easing::from_name(&name)
    }
}

impl From<&str> for Easing {
    fn from(name: &str) -> Self {
        Easing::from_name(name)
    }
}

impl From<Easing> for String {
    fn from(e: Easing) -> Self {
        e.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_endpoints() {
        for e in Easing::ALL {
            assert_abs_diff_eq!(e.apply(0.0), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(e.apply(1.0), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_names_roundtrip() {
        for e in Easing::ALL {
            assert_eq!(Easing::parse(e.name()), Some(e));
        }
    }

    #[test]
    fn test_unknown_falls_back_to_linear() {
        assert_eq!(Easing::from_name("wobble"), Easing::Linear);
        let e: Easing = serde_json::from_str("\"wobble\"").unwrap();
        assert_eq!(e, Easing::Linear);
        assert_eq!(serde_json::to_string(&Easing::BackOut).unwrap(), "\"backOut\"");
    }

    #[test]
    fn test_overshoot_curves() {
        assert!(Easing::BackOut.apply(0.6) > 1.0);
        assert!(Easing::BackIn.apply(0.2) < 0.0);
        assert!(
            (1..100).any(|i| Easing::Elastic.apply(i as f64 / 100.0) > 1.0),
            "elastic should overshoot"
        );
    }

    #[test]
    fn test_steps_plateaus() {
        assert_eq!(Easing::Steps.apply(0.1), 0.0);
        assert_eq!(Easing::Steps.apply(0.3), 0.25);
        assert_eq!(Easing::Steps.apply(0.99), 0.75);
    }

    #[test]
    fn test_input_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Cubic.apply(5.0), 1.0);
        assert_eq!(Easing::Linear.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_symmetric_in_out_midpoint() {
        for e in [Easing::EaseInOut, Easing::Cubic, Easing::SineInOut] {
            assert_abs_diff_eq!(e.apply(0.5), 0.5, epsilon = 1e-12);
        }
    }
}
