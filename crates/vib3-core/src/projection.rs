//! 4D → 3D projections.
//!
//! Every projection is total over finite input: a denominator that collapses
//! toward zero is replaced by a large finite scale (`LARGE_VALUE`) instead of
//! producing `inf` or `NaN`.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PROJECTION_DISTANCE, LARGE_VALUE, PROJECTION_EPSILON};
use crate::vec4::Vec4;

/// Projected 3D point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Lift back into 4D with the given `w`.
    pub fn extend(self, w: f64) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Scale factor `numerator / denom`, clamped to ±LARGE_VALUE near the pole.
fn guarded_factor(numerator: f64, denom: f64) -> f64 {
    if denom.abs() < PROJECTION_EPSILON {
        let sign = if denom >= 0.0 { 1.0 } else { -1.0 };
        return sign * LARGE_VALUE;
    }
    (numerator / denom).clamp(-LARGE_VALUE, LARGE_VALUE)
}

/// `xyz * d / (d + w)`.
pub fn perspective(v: Vec4, distance: f64) -> Vec3 {
    let factor = guarded_factor(distance, distance + v.w);
    v.xyz() * factor
}

/// `xyz / (1 - w)`, the conformal map from S³ minus its pole at w = 1.
pub fn stereographic(v: Vec4) -> Vec3 {
    let factor = guarded_factor(1.0, 1.0 - v.w);
    v.xyz() * factor
}

pub fn orthographic(v: Vec4) -> Vec3 {
    v.xyz()
}

/// Shear `w` into the visible axes.
pub fn oblique(v: Vec4, shear: Vec3) -> Vec3 {
    Vec3::new(
        v.x + shear.x * v.w,
        v.y + shear.y * v.w,
        v.z + shear.z * v.w,
    )
}

/// A point that survived a w-slice, with its fade alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlicePoint {
    pub point: Vec3,
    pub alpha: f64,
}

/// Keep only points within `thickness` of the hyperplane `w = slice_w`.
pub fn slice(v: Vec4, slice_w: f64, thickness: f64, fade: bool) -> Option<SlicePoint> {
    let dist = (v.w - slice_w).abs();
    if dist > thickness {
        return None;
    }
    let alpha = if fade && thickness > 0.0 {
        (1.0 - dist / thickness).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Some(SlicePoint {
        point: v.xyz(),
        alpha,
    })
}

/// Projection selector exchanged with the render layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ProjectionMode {
    Perspective { distance: f64 },
    Stereographic,
    Orthographic,
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::Perspective {
            distance: DEFAULT_PROJECTION_DISTANCE,
        }
    }
}

impl ProjectionMode {
    pub fn project(self, v: Vec4) -> Vec3 {
        match self {
            ProjectionMode::Perspective { distance } => perspective(v, distance),
            ProjectionMode::Stereographic => stereographic(v),
            ProjectionMode::Orthographic => orthographic(v),
        }
    }

    pub fn project_all(self, points: &[Vec4]) -> Vec<Vec3> {
        points.iter().map(|&p| self.project(p)).collect()
    }

    /// Flat `[x0, y0, z0, x1, ...]` buffer ready for a vertex upload.
    pub fn project_to_f32(self, points: &[Vec4]) -> Vec<f32> {
        let mut out = Vec::with_capacity(points.len() * 3);
        for &p in points {
            let q = self.project(p);
            out.extend([q.x as f32, q.y as f32, q.z as f32]);
        }
        out
    }
}
