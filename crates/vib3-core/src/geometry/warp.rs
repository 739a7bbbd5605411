//! Core warps.
//!
//! Two flavours live here. Point warps (`hypersphere`, `hypertetra`,
//! `to_pentatope_edges`) act on generated point clouds. Field warps
//! (`hypersphere_field`, `hypertetra_field`) act on a 3D sample position
//! every frame and feed [`super::lattice`], which is what [`evaluate`] does.

use std::sync::LazyLock;

use super::{BaseShape, CoreWarp, decode, lattice};
use crate::constants::PROJECTION_EPSILON;
use crate::matrix::Mat4;
use crate::params::{Parameter, ParameterSet};
use crate::projection::{self, Vec3};
use crate::vec4::Vec4;

/// Five vertices of the reference pentatope.
static PENTATOPE: LazyLock<[Vec4; 5]> = LazyLock::new(|| {
    let t = (2.0f64 / 3.0).sqrt();
    let u = 1.0 / 3.0f64.sqrt();
    let v = 1.0 / 15.0f64.sqrt();
    [
        Vec4::new(t, 0.0, 0.0, -v),
        Vec4::new(-u, u, 0.0, -v),
        Vec4::new(-u, -u, 0.0, -v),
        Vec4::new(0.0, 0.0, t, -v),
        Vec4::new(0.0, 0.0, 0.0, 4.0 * v),
    ]
});

/// Tetrahedral basis directions for the faceted field warp.
static TETRA_BASIS: LazyLock<[Vec4; 4]> = LazyLock::new(|| {
    [
        Vec4::new(1.0, 1.0, 1.0, -1.0).normalized(),
        Vec4::new(1.0, -1.0, -1.0, 1.0).normalized(),
        Vec4::new(-1.0, 1.0, -1.0, 1.0).normalized(),
        Vec4::new(-1.0, -1.0, 1.0, -1.0).normalized(),
    ]
});

pub fn pentatope_vertices() -> [Vec4; 5] {
    *PENTATOPE
}

// ---- point warps ----

/// Push a point radially onto the 3-sphere of `radius`.
/// A point at the origin has no direction and maps to `(radius, 0, 0, 0)`.
pub fn hypersphere(p: Vec4, radius: f64) -> Vec4 {
    let len = p.length();
    if len < 1e-8 {
        return Vec4::new(radius, 0.0, 0.0, 0.0);
    }
    p * (radius / len)
}

/// Pull a point toward its nearest pentatope vertex, harder when close.
pub fn hypertetra(p: Vec4) -> Vec4 {
    let (nearest, dist_sq) = PENTATOPE
        .iter()
        .map(|&v| (v, p.distance_squared(v)))
        .fold((PENTATOPE[0], f64::INFINITY), |best, cur| {
            if cur.1 < best.1 { cur } else { best }
        });
    let strength = 1.0 / (1.0 + 2.0 * dist_sq.sqrt());
    p.lerp(nearest, strength)
}

/// Snap a point onto the closest of the pentatope's 10 edges.
pub fn to_pentatope_edges(p: Vec4) -> Vec4 {
    let mut best = p;
    let mut best_dist = f64::INFINITY;
    for i in 0..5 {
        for j in (i + 1)..5 {
            let (a, b) = (PENTATOPE[i], PENTATOPE[j]);
            let edge = b - a;
            let len_sq = edge.length_squared();
            if len_sq < 1e-10 {
                continue;
            }
            let t = ((p - a).dot(edge) / len_sq).clamp(0.0, 1.0);
            let q = a.lerp(b, t);
            let d = p.distance_squared(q);
            if d < best_dist {
                best_dist = d;
                best = q;
            }
        }
    }
    best
}

/// Map R³ (the w = 0 slice) onto the unit 3-sphere.
pub fn inverse_stereographic(p: Vec4) -> Vec4 {
    let r2 = p.x * p.x + p.y * p.y + p.z * p.z;
    let denom = 1.0 + r2;
    Vec4::new(
        2.0 * p.x / denom,
        2.0 * p.y / denom,
        2.0 * p.z / denom,
        (r2 - 1.0) / denom,
    )
}

/// Hopf fibration S³ → S². Returns the base point in xyz and the fibre
/// angle in w.
pub fn hopf_project(p: Vec4) -> Vec4 {
    let p = p.normalized();
    let n1 = 2.0 * (p.x * p.z + p.y * p.w);
    let n2 = 2.0 * (p.y * p.z - p.x * p.w);
    let n3 = p.x * p.x + p.y * p.y - p.z * p.z - p.w * p.w;
    let fibre = p.y.atan2(p.x) - p.w.atan2(p.z);
    Vec4::new(n1, n2, n3, fibre)
}

// ---- field warps ----

/// Per-frame inputs for the field warps. `time` is in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarpContext {
    pub time: f64,
    pub speed: f64,
    pub morph: f64,
    /// Perspective distance used when projecting the warped point back to 3D.
    pub dimension: f64,
    pub grid_density: f64,
    pub rotation: Mat4,
}

impl Default for WarpContext {
    fn default() -> Self {
        Self {
            time: 0.0,
            speed: Parameter::Speed.default_value(),
            morph: Parameter::MorphFactor.default_value(),
            dimension: Parameter::Dimension.default_value(),
            grid_density: Parameter::GridDensity.default_value(),
            rotation: Mat4::identity(),
        }
    }
}

impl WarpContext {
    /// Build from a parameter snapshot; missing values fall back to defaults.
    pub fn from_parameters(params: &ParameterSet, time: f64) -> Self {
        let angles = [
            params.get_or_default(Parameter::Rot4dXY),
            params.get_or_default(Parameter::Rot4dXZ),
            params.get_or_default(Parameter::Rot4dYZ),
            params.get_or_default(Parameter::Rot4dXW),
            params.get_or_default(Parameter::Rot4dYW),
            params.get_or_default(Parameter::Rot4dZW),
        ];
        Self {
            time,
            speed: params.get_or_default(Parameter::Speed),
            morph: params.get_or_default(Parameter::MorphFactor),
            dimension: params.get_or_default(Parameter::Dimension),
            grid_density: params.get_or_default(Parameter::GridDensity),
            rotation: Mat4::rotation_from_angles(angles),
        }
    }

    fn project(&self, p: Vec4) -> Vec3 {
        let distance = if self.dimension.abs() < PROJECTION_EPSILON {
            crate::constants::DEFAULT_PROJECTION_DISTANCE
        } else {
            self.dimension
        };
        projection::perspective(p, distance)
    }
}

fn mix(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    a + (b - a) * t
}

/// Radial breathing: w is a travelling wave in |p|, the lifted point is
/// rotated in 4D and projected back, then blended with the input by morph.
pub fn hypersphere_field(p: Vec3, base: BaseShape, ctx: &WarpContext) -> Vec3 {
    let radius = p.length();
    let phase = radius * (1.3 + base.index() as f64 * 0.12) + ctx.time * 0.0008 * ctx.speed;
    let w = phase.sin() * (0.4 + ctx.morph * 0.45);

    let lifted = (p * (1.0 + ctx.morph * 0.2)).extend(w);
    let projected = ctx.project(ctx.rotation * lifted);
    mix(p, projected, (ctx.morph * 0.6 + 0.3).clamp(0.0, 1.0))
}

/// Faceted interference: distances to four tetrahedral planes drive both a
/// displacement along the basis and the lifted w coordinate.
pub fn hypertetra_field(p: Vec3, base: BaseShape, ctx: &WarpContext) -> Vec3 {
    let t = ctx.time * 0.0006 * ctx.speed;
    let lifted = p.extend(0.5 + 0.5 * t.sin());

    let mut offset = Vec4::ZERO;
    let mut nearest = f64::INFINITY;
    for &c in TETRA_BASIS.iter() {
        let d = lifted.dot(c);
        offset += c * d;
        nearest = nearest.min(d.abs());
    }

    let facets = (nearest * (5.0 + base.index() as f64 * 0.3) + t).sin();
    let w = facets * (0.3 + ctx.morph * 0.4);
    let displaced = p + offset.xyz() * (0.15 * ctx.morph);
    let lifted = displaced.extend(w);
    let projected = ctx.project(ctx.rotation * lifted);
    mix(p, projected, (ctx.morph * 0.5 + 0.25).clamp(0.0, 1.0))
}

/// Field warp for a decoded core.
pub fn field(core: CoreWarp, base: BaseShape, p: Vec3, ctx: &WarpContext) -> Vec3 {
    match core {
        CoreWarp::Base => p,
        CoreWarp::Hypersphere => hypersphere_field(p, base, ctx),
        CoreWarp::Hypertetrahedron => hypertetra_field(p, base, ctx),
    }
}

/// Lattice intensity in [0, 1] for geometry `index` at sample position `p`.
/// Out-of-range indices evaluate to 0.
pub fn evaluate(index: u8, p: Vec3, ctx: &WarpContext) -> f64 {
    let Some(id) = decode(index) else {
        tracing::warn!("cannot evaluate geometry index {index}");
        return 0.0;
    };
    let warped = field(id.core, id.base, p, ctx);
    lattice(id.base, warped, ctx.grid_density * 0.1, ctx.time)
}
