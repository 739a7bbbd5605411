/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-10;

/// Denominator magnitude below which a projection is treated as singular
pub const PROJECTION_EPSILON: f64 = 1e-6;

/// Finite stand-in for "infinitely far" when a projection hits its pole
pub const LARGE_VALUE: f64 = 1e6;

/// Plane angles below this are skipped when composing six-plane rotations
pub const ANGLE_EPSILON: f64 = 1e-8;

/// Default 4D camera distance for perspective projection
pub const DEFAULT_PROJECTION_DISTANCE: f64 = 2.0;

/// Number of base shapes per core warp
pub const BASE_SHAPE_COUNT: u8 = 8;

/// Number of core warps (Base, Hypersphere, Hypertetrahedron)
pub const CORE_WARP_COUNT: u8 = 3;

/// Largest valid geometry index: 3 cores x 8 bases - 1
pub const MAX_GEOMETRY_INDEX: u8 = 23;

/// Full hue circle in degrees
pub const HUE_CIRCLE: f64 = 360.0;

/// Version string written into every exported document
pub const FORMAT_VERSION: &str = "1.0";

/// Type tag of an exported parameter timeline
pub const TIMELINE_FORMAT: &str = "vib3-parameter-timeline";

/// Type tag of a single exported color preset
pub const COLOR_PRESET_FORMAT: &str = "vib3-color-preset";

/// Type tag of an exported custom color preset collection
pub const COLOR_PRESET_COLLECTION_FORMAT: &str = "vib3-color-preset-collection";

/// Type tag of an exported post-processing pipeline
pub const POSTPROCESS_FORMAT: &str = "vib3-postprocess-pipeline";
