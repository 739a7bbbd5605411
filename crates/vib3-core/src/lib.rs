//! VIB3 4D engine core.
//!
//! Rotates and projects four-dimensional geometry through six rotation
//! planes (Cl(4,0) rotors and column-major matrices), encodes 24 geometry
//! variants as `core * 8 + base`, and animates engine parameters with
//! transitions, keyframe timelines, multi-scene choreographies and color
//! presets.
//!
//! Zero I/O. Every animated component is driven by the host calling `tick`
//! with the current time in milliseconds and a [`ParameterSink`] that
//! receives the values.

pub mod aesthetic;
pub mod choreography;
pub mod color_presets;
pub mod constants;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod host;
pub mod matrix;
pub mod params;
pub mod postfx;
pub mod projection;
pub mod rotor;
pub mod timeline;
pub mod transition;
pub mod vec4;

pub use aesthetic::{AestheticMapper, AestheticResult};
pub use choreography::{ChoreographyPlayer, ChoreographySpec, PlaybackMode, Scene, SceneSpec};
pub use color_presets::{ApplyOptions, ColorPresetConfig, ColorPresetsSystem, PresetCategory};
pub use constants::{EPSILON, FORMAT_VERSION, LARGE_VALUE, MAX_GEOMETRY_INDEX};
pub use easing::Easing;
pub use error::{Error, Result};
pub use geometry::{BaseShape, CoreWarp, GeometryId, WarpContext, decode, encode, generate_geometry};
pub use host::{Engine, ParameterSink, ParameterState};
pub use matrix::Mat4;
pub use params::{Parameter, ParameterSet, VisualSystem};
pub use postfx::{Effect, PostProcessingPipeline};
pub use projection::{ProjectionMode, Vec3};
pub use rotor::{RotationPlane, Rotor4};
pub use timeline::{Keyframe, LoopMode, ParameterTimeline};
pub use transition::{SequenceStep, TransitionAnimator, TransitionId, TransitionSpec};
pub use vec4::Vec4;
