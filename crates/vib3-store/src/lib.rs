//! File-backed storage for vib3 documents.
//!
//! A [`Library`] keeps timelines, choreographies and color presets as JSON
//! files under the data directory; [`EngineConfig`] holds engine defaults in
//! `config.toml` next to them.

pub mod config;
pub mod error;
pub mod library;

pub use config::{EngineConfig, resolve_data_dir};
pub use error::{Result, StoreError};
pub use library::{DocumentKind, Library};
