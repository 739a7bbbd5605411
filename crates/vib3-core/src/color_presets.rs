//! Named color presets and animated switching between them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::constants::{COLOR_PRESET_COLLECTION_FORMAT, COLOR_PRESET_FORMAT, FORMAT_VERSION};
use crate::easing::Easing;
use crate::error::{Error, Result, check_format};
use crate::host::ParameterSink;
use crate::params::{Parameter, ParameterSet};
use crate::transition::{TransitionAnimator, TransitionId, TransitionSpec};

pub const DEFAULT_PRESET_TRANSITION_MS: f64 = 800.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PresetCategory {
    Natural,
    Cosmic,
    Elemental,
    Synthwave,
    Monochrome,
    Pastel,
    #[default]
    Custom,
}

impl PresetCategory {
    pub const ALL: [PresetCategory; 7] = [
        PresetCategory::Natural,
        PresetCategory::Cosmic,
        PresetCategory::Elemental,
        PresetCategory::Synthwave,
        PresetCategory::Monochrome,
        PresetCategory::Pastel,
        PresetCategory::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PresetCategory::Natural => "Natural",
            PresetCategory::Cosmic => "Cosmic",
            PresetCategory::Elemental => "Elemental",
            PresetCategory::Synthwave => "Synthwave",
            PresetCategory::Monochrome => "Monochrome",
            PresetCategory::Pastel => "Pastel",
            PresetCategory::Custom => "Custom",
        }
    }
}

impl fmt::Display for PresetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One preset. `hue_shift` and the two ranges are hints for the render
/// layer's palette spread; only hue, saturation, intensity and the optional
/// motion fields are pushed as parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPresetConfig {
    pub hue: f64,
    pub saturation: f64,
    pub intensity: f64,
    #[serde(default)]
    pub hue_shift: f64,
    #[serde(default)]
    pub saturation_range: f64,
    #[serde(default)]
    pub intensity_range: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaos: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph_factor: Option<f64>,
    #[serde(default)]
    pub category: PresetCategory,
    #[serde(default)]
    pub description: String,
}

impl ColorPresetConfig {
    pub fn new(hue: f64, saturation: f64, intensity: f64) -> Self {
        Self {
            hue,
            saturation,
            intensity,
            hue_shift: 0.0,
            saturation_range: 0.0,
            intensity_range: 0.0,
            speed: None,
            chaos: None,
            morph_factor: None,
            category: PresetCategory::Custom,
            description: String::new(),
        }
    }

    /// The parameter values this preset drives.
    pub fn parameters(&self) -> ParameterSet {
        let mut set = ParameterSet::new()
            .with(Parameter::Hue, self.hue)
            .with(Parameter::Saturation, self.saturation)
            .with(Parameter::Intensity, self.intensity);
        let optional = [
            (Parameter::Speed, self.speed),
            (Parameter::Chaos, self.chaos),
            (Parameter::MorphFactor, self.morph_factor),
        ];
        for (param, value) in optional {
            if let Some(v) = value {
                set.set(param, v);
            }
        }
        set
    }

    fn is_finite(&self) -> bool {
        [self.hue, self.saturation, self.intensity, self.hue_shift]
            .into_iter()
            .chain(self.speed)
            .chain(self.chaos)
            .chain(self.morph_factor)
            .all(f64::is_finite)
    }
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    hue: f64,
    saturation: f64,
    intensity: f64,
    hue_shift: f64,
    saturation_range: f64,
    intensity_range: f64,
    category: PresetCategory,
    description: &str,
) -> ColorPresetConfig {
    ColorPresetConfig {
        hue,
        saturation,
        intensity,
        hue_shift,
        saturation_range,
        intensity_range,
        speed: None,
        chaos: None,
        morph_factor: None,
        category,
        description: description.to_string(),
    }
}

static BUILTINS: LazyLock<Vec<(&'static str, ColorPresetConfig)>> = LazyLock::new(|| {
    use PresetCategory::*;
    vec![
        ("Ocean Deep", builtin(200.0, 0.75, 0.55, 20.0, 0.2, 0.15, Natural, "Deep blue water with teal undertones")),
        ("Forest Canopy", builtin(120.0, 0.6, 0.5, 30.0, 0.25, 0.2, Natural, "Layered greens under filtered light")),
        ("Desert Sunset", builtin(25.0, 0.8, 0.7, 35.0, 0.2, 0.25, Natural, "Warm oranges sliding into dusk")),
        ("Arctic Ice", builtin(190.0, 0.3, 0.85, 10.0, 0.1, 0.1, Natural, "Pale cyan, bright and cold")),
        ("Nebula", ColorPresetConfig { chaos: Some(0.4), ..builtin(285.0, 0.85, 0.6, 60.0, 0.3, 0.3, Cosmic, "Violet gas clouds with magenta cores") }),
        ("Aurora", ColorPresetConfig { speed: Some(0.7), ..builtin(150.0, 0.8, 0.65, 90.0, 0.25, 0.3, Cosmic, "Green to violet curtains of light") }),
        ("Event Horizon", builtin(260.0, 0.5, 0.25, 15.0, 0.2, 0.4, Cosmic, "Dim indigo collapsing to black")),
        ("Solar Flare", ColorPresetConfig { chaos: Some(0.6), ..builtin(40.0, 1.0, 0.9, 25.0, 0.1, 0.2, Cosmic, "Saturated gold bursting outward") }),
        ("Molten Core", builtin(10.0, 0.95, 0.75, 20.0, 0.15, 0.3, Elemental, "Lava reds and glowing orange")),
        ("Storm Front", ColorPresetConfig { chaos: Some(0.7), speed: Some(1.6), ..builtin(215.0, 0.35, 0.45, 15.0, 0.2, 0.35, Elemental, "Slate blue with lightning highlights") }),
        ("Crystal Cave", ColorPresetConfig { morph_factor: Some(0.6), ..builtin(175.0, 0.55, 0.7, 45.0, 0.3, 0.2, Elemental, "Refracted aqua and lilac facets") }),
        ("Wildfire", ColorPresetConfig { speed: Some(1.8), ..builtin(15.0, 1.0, 0.8, 30.0, 0.1, 0.35, Elemental, "Fast flickering flame") }),
        ("Neon Grid", builtin(300.0, 1.0, 0.8, 120.0, 0.1, 0.2, Synthwave, "Hot magenta against electric cyan")),
        ("Retrowave", builtin(320.0, 0.9, 0.7, 60.0, 0.15, 0.25, Synthwave, "Pink horizon over a purple night")),
        ("Vaporwave", builtin(280.0, 0.6, 0.75, 100.0, 0.2, 0.15, Synthwave, "Soft purple and teal haze")),
        ("Cyberpunk", ColorPresetConfig { chaos: Some(0.5), ..builtin(330.0, 0.95, 0.65, 150.0, 0.1, 0.3, Synthwave, "Acid yellow accents on deep pink") }),
        ("Noir", builtin(0.0, 0.0, 0.35, 0.0, 0.0, 0.4, Monochrome, "Black and white with hard contrast")),
        ("Silver Screen", builtin(0.0, 0.05, 0.7, 0.0, 0.05, 0.3, Monochrome, "Bright silver tones")),
        ("Sepia", builtin(35.0, 0.35, 0.55, 5.0, 0.1, 0.25, Monochrome, "Aged photograph browns")),
        ("Cobalt Mono", builtin(220.0, 0.7, 0.5, 0.0, 0.05, 0.35, Monochrome, "A single blue across all values")),
        ("Cotton Candy", builtin(330.0, 0.35, 0.85, 150.0, 0.15, 0.1, Pastel, "Pink and baby blue")),
        ("Mint Cream", builtin(155.0, 0.3, 0.9, 20.0, 0.1, 0.05, Pastel, "Light mint on cream")),
        ("Lavender Mist", builtin(270.0, 0.3, 0.8, 25.0, 0.15, 0.1, Pastel, "Hazy lavender")),
        ("Peach Sorbet", builtin(20.0, 0.4, 0.85, 15.0, 0.1, 0.1, Pastel, "Soft peach and apricot")),
    ]
});

pub fn builtin_presets() -> impl Iterator<Item = (&'static str, &'static ColorPresetConfig)> {
    BUILTINS.iter().map(|(name, cfg)| (*name, cfg))
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|(n, _)| *n == name)
}

fn builtin_preset(name: &str) -> Option<&'static ColorPresetConfig> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, cfg)| cfg)
}

/// Single-preset export document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetDocument {
    #[serde(rename = "type")]
    pub format: String,
    pub version: String,
    pub name: String,
    pub preset: ColorPresetConfig,
}

/// Export document for every custom preset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetCollection {
    #[serde(rename = "type")]
    pub format: String,
    pub version: String,
    pub presets: BTreeMap<String, ColorPresetConfig>,
}

/// Options for [`ColorPresetsSystem::apply_preset`].
pub struct ApplyOptions {
    pub transition: bool,
    pub duration_ms: f64,
    pub on_complete: Option<Box<dyn FnMut()>>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            transition: true,
            duration_ms: DEFAULT_PRESET_TRANSITION_MS,
            on_complete: None,
        }
    }
}

impl ApplyOptions {
    pub fn immediate() -> Self {
        Self { transition: false, ..Self::default() }
    }

    pub fn animated(duration_ms: f64) -> Self {
        Self { duration_ms, ..Self::default() }
    }
}

#[derive(Debug, Default)]
pub struct ColorPresetsSystem {
    custom: BTreeMap<String, ColorPresetConfig>,
    current: Option<String>,
    /// Values of the last applied preset, the start point of the next one.
    remembered: Option<ParameterSet>,
    animator: TransitionAnimator,
    in_flight: Option<TransitionId>,
}

impl ColorPresetsSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom presets first, then built-ins.
    pub fn get(&self, name: &str) -> Option<&ColorPresetConfig> {
        self.custom.get(name).or_else(|| builtin_preset(name))
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn lookup(&self, name: &str) -> Result<&ColorPresetConfig> {
        self.get(name).ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    /// All names: built-ins in catalogue order, then custom ones sorted.
    pub fn names(&self) -> Vec<&str> {
        BUILTINS
            .iter()
            .map(|(n, _)| *n)
            .chain(self.custom.keys().map(String::as_str))
            .collect()
    }

    pub fn categories(&self) -> Vec<PresetCategory> {
        let mut cats: Vec<PresetCategory> = BUILTINS
            .iter()
            .map(|(_, c)| c.category)
            .chain(self.custom.values().map(|c| c.category))
            .collect();
        cats.sort();
        cats.dedup();
        cats
    }

    pub fn in_category(&self, category: PresetCategory) -> Vec<&str> {
        BUILTINS
            .iter()
            .map(|(n, c)| (*n, c))
            .chain(self.custom.iter().map(|(n, c)| (n.as_str(), c)))
            .filter(|(_, c)| c.category == category)
            .map(|(n, _)| n)
            .collect()
    }

    /// Refuses built-in names and non-finite values.
    pub fn create_custom_preset(&mut self, name: &str, config: ColorPresetConfig) -> bool {
        if is_builtin(name) {
            tracing::warn!("{name:?} is a built-in preset name");
            return false;
        }
        if !config.is_finite() {
            tracing::warn!("rejecting preset {name:?} with non-finite values");
            return false;
        }
        self.custom.insert(name.to_string(), config);
        true
    }

    pub fn delete_custom_preset(&mut self, name: &str) -> bool {
        self.custom.remove(name).is_some()
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    pub fn current_preset(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some_and(|id| self.animator.is_active(id))
    }

    /// Apply a preset by name, snapping or animating from the previous
    /// preset's values. Unknown names log a warning and change nothing.
    ///
    /// Only one preset transition runs at a time. Starting another cancels
    /// the one in flight where it stands.
    pub fn apply_preset(
        &mut self,
        name: &str,
        options: ApplyOptions,
        now: f64,
        sink: &mut dyn ParameterSink,
    ) -> bool {
        let Some(config) = self.get(name) else {
            tracing::warn!("unknown color preset {name:?}");
            return false;
        };
        let target = config.parameters();
        tracing::debug!(preset = name, transition = options.transition, "applying color preset");

        if let Some(id) = self.in_flight.take() {
            self.animator.cancel(id);
        }

        if options.transition && options.duration_ms > 0.0 {
            let from = self.remembered.clone().unwrap_or_else(ParameterSet::defaults);
            let mut spec = TransitionSpec::new(target.clone(), options.duration_ms).easing(Easing::Cubic);
            if let Some(f) = options.on_complete {
                spec = spec.on_complete(f);
            }
            self.in_flight = Some(self.animator.transition_from(spec, from, now));
        } else {
            for (param, value) in target.iter() {
                sink.update_parameter(param, value);
            }
            if let Some(mut f) = options.on_complete {
                f();
            }
        }
        self.current = Some(name.to_string());
        self.remembered = Some(target);
        true
    }

    /// Advance the in-flight preset transition. Returns true while animating.
    pub fn tick(&mut self, now: f64, sink: &mut dyn ParameterSink) -> bool {
        if self.in_flight.is_none() {
            return false;
        }
        let active = self.animator.tick(now, sink);
        if !active {
            self.in_flight = None;
        }
        active
    }

    // ---- serialization ----

    pub fn export_preset(&self, name: &str) -> Option<PresetDocument> {
        Some(PresetDocument {
            format: COLOR_PRESET_FORMAT.to_string(),
            version: FORMAT_VERSION.to_string(),
            name: name.to_string(),
            preset: self.get(name)?.clone(),
        })
    }

    /// Import one preset as a custom preset.
    pub fn import_preset(&mut self, doc: PresetDocument) -> Result<()> {
        check_format(COLOR_PRESET_FORMAT, &doc.format)?;
        if is_builtin(&doc.name) {
            return Err(Error::BuiltinPresetName(doc.name));
        }
        if !doc.preset.is_finite() {
            return Err(Error::Malformed(format!("preset {:?} has non-finite values", doc.name)));
        }
        tracing::debug!(preset = %doc.name, "imported color preset");
        self.custom.insert(doc.name, doc.preset);
        Ok(())
    }

    pub fn export_collection(&self) -> PresetCollection {
        PresetCollection {
            format: COLOR_PRESET_COLLECTION_FORMAT.to_string(),
            version: FORMAT_VERSION.to_string(),
            presets: self.custom.clone(),
        }
    }

    /// Replace every custom preset with the collection's contents. Nothing
    /// changes if any entry is invalid. Returns the number imported.
    pub fn import_collection(&mut self, doc: PresetCollection) -> Result<usize> {
        check_format(COLOR_PRESET_COLLECTION_FORMAT, &doc.format)?;
        for (name, preset) in &doc.presets {
            if is_builtin(name) {
                return Err(Error::BuiltinPresetName(name.clone()));
            }
            if !preset.is_finite() {
                return Err(Error::Malformed(format!("preset {name:?} has non-finite values")));
            }
        }
        let count = doc.presets.len();
        self.custom = doc.presets;
        tracing::debug!(count, "imported color preset collection");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::host::ParameterState;

    #[test]
    fn test_ocean_deep_immediate() {
        let mut presets = ColorPresetsSystem::new();
        let mut state = ParameterState::new();
        assert!(presets.apply_preset("Ocean Deep", ApplyOptions::immediate(), 0.0, &mut state));
        assert_eq!(state.value(Parameter::Hue), Some(200.0));
        assert_eq!(state.value(Parameter::Saturation), Some(0.75));
        assert_eq!(state.value(Parameter::Intensity), Some(0.55));
        assert_eq!(state.update_count(), 3);
        assert!(!presets.is_transitioning());
        assert_eq!(presets.current_preset(), Some("Ocean Deep"));
    }

    #[test]
    fn test_unknown_preset_is_noop() {
        let mut presets = ColorPresetsSystem::new();
        let mut state = ParameterState::new();
        assert!(!presets.apply_preset("Nope", ApplyOptions::immediate(), 0.0, &mut state));
        assert_eq!(state.update_count(), 0);
        assert_eq!(presets.current_preset(), None);
    }

    #[test]
    fn test_lookup_reports_unknown_name() {
        let presets = ColorPresetsSystem::new();
        assert_eq!(presets.lookup("Nebula").unwrap().hue, 285.0);
        let err = presets.lookup("Nope").unwrap_err();
        assert!(matches!(err, Error::UnknownPreset(ref n) if n == "Nope"));
        assert_eq!(err.to_string(), "unknown preset: Nope");
    }

    #[test]
    fn test_custom_cannot_shadow_builtin() {
        let mut presets = ColorPresetsSystem::new();
        assert!(!presets.create_custom_preset("Ocean Deep", ColorPresetConfig::new(0.0, 0.0, 0.0)));
        assert!(presets.create_custom_preset("Mine", ColorPresetConfig::new(10.0, 0.5, 0.5)));
        assert_eq!(presets.get("Mine").unwrap().hue, 10.0);
        assert!(presets.delete_custom_preset("Mine"));
        assert!(!presets.delete_custom_preset("Mine"));
    }

    #[test]
    fn test_animated_from_remembered_values() {
        let mut presets = ColorPresetsSystem::new();
        let mut state = ParameterState::new();
        presets.apply_preset("Ocean Deep", ApplyOptions::immediate(), 0.0, &mut state);

        let done = Rc::new(Cell::new(false));
        let d = done.clone();
        let options = ApplyOptions {
            on_complete: Some(Box::new(move || d.set(true))),
            ..ApplyOptions::animated(1000.0)
        };
        assert!(presets.apply_preset("Forest Canopy", options, 0.0, &mut state));
        assert!(presets.tick(500.0, &mut state));
        // cubic in-out is exactly half way at t = 0.5; hue 200 -> 120
        assert_abs_diff_eq!(state.value(Parameter::Hue).unwrap(), 160.0, epsilon = 1e-9);
        assert!(!presets.tick(1000.0, &mut state));
        assert_eq!(state.value(Parameter::Hue), Some(120.0));
        assert!(done.get());
    }

    #[test]
    fn test_new_apply_cancels_in_flight() {
        let mut presets = ColorPresetsSystem::new();
        let mut state = ParameterState::new();
        presets.apply_preset("Noir", ApplyOptions::animated(1000.0), 0.0, &mut state);
        presets.tick(300.0, &mut state);
        presets.apply_preset("Sepia", ApplyOptions::animated(1000.0), 300.0, &mut state);
        assert_eq!(presets.animator.active_count(), 1);
        presets.tick(1300.0, &mut state);
        assert_eq!(state.value(Parameter::Hue), Some(35.0));
    }

    #[test]
    fn test_categories_and_listing() {
        let presets = ColorPresetsSystem::new();
        assert!(presets.in_category(PresetCategory::Natural).contains(&"Ocean Deep"));
        assert_eq!(presets.categories().len(), 6);
        assert_eq!(presets.names().len(), 24);
    }

    #[test]
    fn test_single_export_import() {
        let mut presets = ColorPresetsSystem::new();
        let mut doc = presets.export_preset("Aurora").unwrap();
        assert!(matches!(
            presets.import_preset(doc.clone()),
            Err(Error::BuiltinPresetName(_))
        ));
        doc.name = "Aurora Copy".into();
        presets.import_preset(doc).unwrap();
        assert_eq!(presets.get("Aurora Copy").unwrap().speed, Some(0.7));
    }

    #[test]
    fn test_collection_roundtrip_and_tag_check() {
        let mut presets = ColorPresetsSystem::new();
        presets.create_custom_preset("A", ColorPresetConfig::new(1.0, 0.1, 0.2));
        presets.create_custom_preset("B", ColorPresetConfig::new(2.0, 0.3, 0.4));
        let json = serde_json::to_string(&presets.export_collection()).unwrap();

        let mut other = ColorPresetsSystem::new();
        other.create_custom_preset("Old", ColorPresetConfig::new(0.0, 0.0, 0.0));
        let doc: PresetCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(other.import_collection(doc).unwrap(), 2);
        assert!(other.get("Old").is_none());
        assert_eq!(other.get("B").unwrap().intensity, 0.4);

        let mut bad: PresetCollection = serde_json::from_str(&json).unwrap();
        bad.format = COLOR_PRESET_FORMAT.into();
        assert!(other.import_collection(bad).is_err());
        assert_eq!(other.custom_count(), 2);
    }
}
