use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vib3_core::Easing;

use crate::error::Result;

pub const CONFIG_FILE: &str = "config.toml";
pub const DATA_DIR_ENV: &str = "VIB3_DATA_DIR";

/// Engine defaults read from `<data_dir>/config.toml`.
///
/// Every field is optional in the file; anything missing takes the default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fps: u32,
    pub default_easing: String,
    pub default_transition_ms: f64,
    pub perspective_distance: f64,
    pub resolution: usize,
    pub bpm: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            default_easing: "easeInOut".to_string(),
            default_transition_ms: 800.0,
            perspective_distance: 2.0,
            resolution: 16,
            bpm: 120.0,
        }
    }
}

impl EngineConfig {
    /// Load from `dir`, falling back to defaults when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, toml::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "wrote config");
        Ok(())
    }

    pub fn easing(&self) -> Easing {
        Easing::from_name(&self.default_easing)
    }

    /// Frame interval in milliseconds. A zero fps is treated as 1.
    pub fn frame_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps.max(1))
    }
}

/// Resolve the data directory.
///
/// Priority: `VIB3_DATA_DIR`, then the explicit override, then `~/.vib3`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    explicit.map(PathBuf::from).unwrap_or_else(default_data_dir)
}

pub fn default_data_dir() -> PathBuf {
    dirs_home().join(".vib3")
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
