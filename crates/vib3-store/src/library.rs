use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use vib3_core::choreography::ChoreographySpec;
use vib3_core::color_presets::PresetDocument;
use vib3_core::timeline::TimelineData;

use crate::error::{Result, StoreError};

/// The kinds of document kept in a [`Library`], one subdirectory each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Timeline,
    Choreography,
    Preset,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Timeline,
        DocumentKind::Choreography,
        DocumentKind::Preset,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            DocumentKind::Timeline => "timelines",
            DocumentKind::Choreography => "choreographies",
            DocumentKind::Preset => "presets",
        }
    }
}

/// Sanitize a document name for use as a filename.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// JSON document library rooted at the data directory.
///
/// Layout:
/// ```text
/// ~/.vib3/
/// ├── config.toml
/// ├── timelines/<name>.json
/// ├── choreographies/<name>.json
/// └── presets/<name>.json
/// ```
#[derive(Clone, Debug)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    /// Open the library at `root`, creating the per-kind directories.
    pub fn open(root: &Path) -> Result<Self> {
        for kind in DocumentKind::ALL {
            fs::create_dir_all(root.join(kind.dir_name()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: DocumentKind, name: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.json", sanitize_name(name)))
    }

    pub fn exists(&self, kind: DocumentKind, name: &str) -> bool {
        self.path_for(kind, name).exists()
    }

    /// Stored names of one kind, sorted.
    pub fn list(&self, kind: DocumentKind) -> Result<Vec<String>> {
        let dir = self.root.join(kind.dir_name());
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn remove(&self, kind: DocumentKind, name: &str) -> Result<bool> {
        let path = self.path_for(kind, name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::info!(path = %path.display(), "removed document");
        Ok(true)
    }

    fn save<T: Serialize>(&self, kind: DocumentKind, name: &str, doc: &T) -> Result<PathBuf> {
        let path = self.path_for(kind, name);
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&path, json)?;
        tracing::info!(kind = kind.dir_name(), path = %path.display(), "saved document");
        Ok(path)
    }

    fn load<T: DeserializeOwned>(&self, kind: DocumentKind, name: &str) -> Result<T> {
        let path = self.path_for(kind, name);
        if !path.exists() {
            return Err(StoreError::NotFound(format!("{}/{name}", kind.dir_name())));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_timeline(&self, name: &str, doc: &TimelineData) -> Result<PathBuf> {
        self.save(DocumentKind::Timeline, name, doc)
    }

    pub fn load_timeline(&self, name: &str) -> Result<TimelineData> {
        self.load(DocumentKind::Timeline, name)
    }

    pub fn save_choreography(&self, name: &str, doc: &ChoreographySpec) -> Result<PathBuf> {
        self.save(DocumentKind::Choreography, name, doc)
    }

    pub fn load_choreography(&self, name: &str) -> Result<ChoreographySpec> {
        self.load(DocumentKind::Choreography, name)
    }

    pub fn save_preset(&self, name: &str, doc: &PresetDocument) -> Result<PathBuf> {
        self.save(DocumentKind::Preset, name, doc)
    }

    pub fn load_preset(&self, name: &str) -> Result<PresetDocument> {
        self.load(DocumentKind::Preset, name)
    }
}
