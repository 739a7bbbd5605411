//! The 24-variant geometry scheme: `index = core * 8 + base`.
//!
//! Core warps:
//!   0 = Base (0-7), 1 = Hypersphere (8-15), 2 = Hypertetrahedron (16-23)
//!
//! Base shapes:
//!   0 = Tetrahedron    4 = Klein Bottle
//!   1 = Hypercube      5 = Fractal
//!   2 = Sphere         6 = Wave
//!   3 = Torus          7 = Crystal

pub mod lattice;
pub mod shapes;
pub mod warp;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BASE_SHAPE_COUNT, MAX_GEOMETRY_INDEX};
use crate::vec4::Vec4;

pub use lattice::lattice;
pub use warp::{WarpContext, evaluate};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreWarp {
    Base,
    Hypersphere,
    Hypertetrahedron,
}

impl CoreWarp {
    pub const ALL: [CoreWarp; 3] = [
        CoreWarp::Base,
        CoreWarp::Hypersphere,
        CoreWarp::Hypertetrahedron,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(i: u8) -> Option<Self> {
        Self::ALL.get(i as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            CoreWarp::Base => "Base",
            CoreWarp::Hypersphere => "Hypersphere",
            CoreWarp::Hypertetrahedron => "Hypertetrahedron",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseShape {
    Tetrahedron,
    Hypercube,
    Sphere,
    Torus,
    KleinBottle,
    Fractal,
    Wave,
    Crystal,
}

impl BaseShape {
    pub const ALL: [BaseShape; 8] = [
        BaseShape::Tetrahedron,
        BaseShape::Hypercube,
        BaseShape::Sphere,
        BaseShape::Torus,
        BaseShape::KleinBottle,
        BaseShape::Fractal,
        BaseShape::Wave,
        BaseShape::Crystal,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(i: u8) -> Option<Self> {
        Self::ALL.get(i as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseShape::Tetrahedron => "Tetrahedron",
            BaseShape::Hypercube => "Hypercube",
            BaseShape::Sphere => "Sphere",
            BaseShape::Torus => "Torus",
            BaseShape::KleinBottle => "Klein Bottle",
            BaseShape::Fractal => "Fractal",
            BaseShape::Wave => "Wave",
            BaseShape::Crystal => "Crystal",
        }
    }
}

/// Decoded geometry index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryId {
    pub core: CoreWarp,
    pub base: BaseShape,
}

impl GeometryId {
    pub fn new(core: CoreWarp, base: BaseShape) -> Self {
        Self { core, base }
    }

    pub fn index(self) -> u8 {
        encode(self.core, self.base)
    }

    /// `None` for indices above 23.
    pub fn from_index(index: u8) -> Option<Self> {
        decode(index)
    }

    /// Nearest valid geometry for a parameter value, which may be
    /// fractional mid-transition or out of range.
    pub fn from_parameter(value: f64) -> Self {
        let idx = if value.is_finite() {
            value.round().clamp(0.0, MAX_GEOMETRY_INDEX as f64) as u8
        } else {
            0
        };
        // idx is within 0..=23 so decode always succeeds
        decode(idx).unwrap_or(Self::new(CoreWarp::Base, BaseShape::Tetrahedron))
    }

    /// "Torus" for base geometries, "Hypersphere Torus" for warped ones.
    pub fn name(self) -> String {
        match self.core {
            CoreWarp::Base => self.base.name().to_string(),
            core => format!("{} {}", core.name(), self.base.name()),
        }
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// `core * 8 + base`.
pub fn encode(core: CoreWarp, base: BaseShape) -> u8 {
    core.index() * BASE_SHAPE_COUNT + base.index()
}

/// Numeric form of [`encode`]. `None` if either part is out of range.
pub fn encode_index(core: u8, base: u8) -> Option<u8> {
    Some(encode(CoreWarp::from_index(core)?, BaseShape::from_index(base)?))
}

/// `(index / 8, index % 8)`. `None` for indices above 23.
pub fn decode(index: u8) -> Option<GeometryId> {
    if index > MAX_GEOMETRY_INDEX {
        return None;
    }
    Some(GeometryId {
        core: CoreWarp::from_index(index / BASE_SHAPE_COUNT)?,
        base: BaseShape::from_index(index % BASE_SHAPE_COUNT)?,
    })
}

/// Display name for an index, `None` when out of range.
pub fn geometry_name(index: u8) -> Option<String> {
    decode(index).map(GeometryId::name)
}

/// All 24 geometries in index order.
pub fn all() -> impl Iterator<Item = GeometryId> {
    CoreWarp::ALL
        .into_iter()
        .flat_map(|core| BaseShape::ALL.into_iter().map(move |base| GeometryId::new(core, base)))
}

/// Point cloud for a geometry index: base shape then core warp.
/// Empty for an out-of-range index. `resolution` is clamped to 2..=256.
pub fn generate_geometry(index: u8, resolution: usize) -> Vec<Vec4> {
    let Some(id) = decode(index) else {
        tracing::warn!("geometry index {index} out of range 0..={MAX_GEOMETRY_INDEX}");
        return Vec::new();
    };
    let resolution = resolution.clamp(2, 256);
    let points = shapes::generate(id.base, resolution);
    match id.core {
        CoreWarp::Base => points,
        CoreWarp::Hypersphere => points.into_iter().map(|p| warp::hypersphere(p, 1.0)).collect(),
        CoreWarp::Hypertetrahedron => points.into_iter().map(warp::hypertetra).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        for i in 0..=MAX_GEOMETRY_INDEX {
            let id = decode(i).unwrap();
            assert_eq!(encode(id.core, id.base), i);
        }
    }

    #[test]
    fn test_hypersphere_torus_is_11() {
        assert_eq!(encode(CoreWarp::Hypersphere, BaseShape::Torus), 11);
        let id = decode(11).unwrap();
        assert_eq!(id.core, CoreWarp::Hypersphere);
        assert_eq!(id.base, BaseShape::Torus);
        assert_eq!(id.name(), "Hypersphere Torus");
        assert_eq!(geometry_name(4).as_deref(), Some("Klein Bottle"));
        assert_eq!(geometry_name(23).as_deref(), Some("Hypertetrahedron Crystal"));
    }

    #[test]
    fn test_out_of_range() {
        assert!(decode(24).is_none());
        assert!(decode(255).is_none());
        assert_eq!(encode_index(3, 0), None);
        assert_eq!(encode_index(0, 8), None);
        assert_eq!(encode_index(2, 7), Some(23));
        assert!(generate_geometry(24, 8).is_empty());
    }

    #[test]
    fn test_from_parameter_rounds_and_clamps() {
        assert_eq!(GeometryId::from_parameter(10.6).index(), 11);
        assert_eq!(GeometryId::from_parameter(-3.0).index(), 0);
        assert_eq!(GeometryId::from_parameter(99.0).index(), 23);
        assert_eq!(GeometryId::from_parameter(f64::NAN).index(), 0);
    }

    #[test]
    fn test_all_lists_24_in_order() {
        let ids: Vec<u8> = all().map(GeometryId::index).collect();
        assert_eq!(ids, (0..=23).collect::<Vec<u8>>());
    }

    #[test]
    fn test_hypersphere_warp_lands_on_s3() {
        for p in generate_geometry(encode(CoreWarp::Hypersphere, BaseShape::Hypercube), 4) {
            assert!(p.is_normalized(1e-9), "{p:?} not on S3");
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        for i in 0..=MAX_GEOMETRY_INDEX {
            assert_eq!(generate_geometry(i, 6), generate_geometry(i, 6));
            assert!(!generate_geometry(i, 6).is_empty());
        }
    }
}
