use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub, SubAssign};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::projection::{self, Vec3};

/// Point or direction in 4D space.
///
/// `w` is the fourth spatial axis, not a homogeneous coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0, 0.0);
    pub const W: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    /// Uniform random point on the unit 3-sphere (Marsaglia's method).
    pub fn random_unit(rng: &mut impl Rng) -> Self {
        let (x1, y1) = loop {
            let a: f64 = rng.random_range(-1.0..1.0);
            let b: f64 = rng.random_range(-1.0..1.0);
            let s1 = a * a + b * b;
            if s1 < 1.0 && s1 > EPSILON {
                break (a, b);
            }
        };
        let (x2, y2) = loop {
            let a: f64 = rng.random_range(-1.0..1.0);
            let b: f64 = rng.random_range(-1.0..1.0);
            let s2 = a * a + b * b;
            if s2 < 1.0 && s2 > EPSILON {
                break (a, b);
            }
        };
        let s1 = x1 * x1 + y1 * y1;
        let s2 = x2 * x2 + y2 * y2;
        let k = ((1.0 - s1) / s2).sqrt();
        Self::new(x1, y1, x2 * k, y2 * k)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit-length copy. Returns zero for a near-zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < EPSILON {
            return Self::ZERO;
        }
        self / len
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
            self.w.min(other.w),
        )
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
            self.w.max(other.w),
        )
    }

    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs(), self.w.abs())
    }

    /// Component of `self` along `other`. Zero when `other` is degenerate.
    pub fn project_onto(self, other: Self) -> Self {
        let denom = other.length_squared();
        if denom < EPSILON {
            return Self::ZERO;
        }
        other * (self.dot(other) / denom)
    }

    /// Mirror across the hyperplane with the given unit normal.
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }

    pub fn is_zero(self, epsilon: f64) -> bool {
        self.length_squared() < epsilon * epsilon
    }

    pub fn is_normalized(self, epsilon: f64) -> bool {
        (self.length_squared() - 1.0).abs() < epsilon
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// Drop `w`.
    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Perspective projection from a 4D camera at distance `distance` along w.
    pub fn perspective(self, distance: f64) -> Vec3 {
        projection::perspective(self, distance)
    }

    /// Stereographic projection from the pole of the unit 3-sphere.
    pub fn stereographic(self) -> Vec3 {
        projection::stereographic(self)
    }

    pub fn orthographic(self) -> Vec3 {
        projection::orthographic(self)
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub fn from_array(arr: [f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }
}

impl Add for Vec4 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Sub for Vec4 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl Mul<f64> for Vec4 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs)
    }
}

impl Mul<Vec4> for f64 {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Vec4 {
        rhs * self
    }
}

impl Div<f64> for Vec4 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs, self.w / rhs)
    }
}

impl Neg for Vec4 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl AddAssign for Vec4 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec4 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f64> for Vec4 {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl DivAssign<f64> for Vec4 {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

impl Index<usize> for Vec4 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 index out of range: {i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_arithmetic() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4::new(4.0, 3.0, 2.0, 1.0);
        assert_eq!(a + b, Vec4::splat(5.0));
        assert_eq!(a - a, Vec4::ZERO);
        assert_eq!(a * 2.0, Vec4::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(-a, Vec4::new(-1.0, -2.0, -3.0, -4.0));
        assert_abs_diff_eq!(a.dot(b), 20.0);
    }

    #[test]
    fn test_normalize() {
        let v = Vec4::new(3.0, 0.0, 4.0, 0.0).normalized();
        assert_abs_diff_eq!(v.length(), 1.0, epsilon = 1e-12);
        assert!(v.is_normalized(1e-9));
        assert_eq!(Vec4::ZERO.normalized(), Vec4::ZERO);
    }

    #[test]
    fn test_lerp_and_distance() {
        let a = Vec4::ZERO;
        let b = Vec4::new(2.0, 2.0, 2.0, 2.0);
        assert_eq!(a.lerp(b, 0.5), Vec4::ONE);
        assert_abs_diff_eq!(a.distance(b), 4.0);
    }

    #[test]
    fn test_reflect_and_project() {
        let v = Vec4::new(1.0, -1.0, 0.0, 0.0);
        assert_eq!(v.reflect(Vec4::Y), Vec4::new(1.0, 1.0, 0.0, 0.0));
        assert_eq!(v.project_onto(Vec4::X * 3.0), Vec4::X);
        assert_eq!(v.project_onto(Vec4::ZERO), Vec4::ZERO);
    }

    #[test]
    fn test_random_unit_on_sphere() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let v = Vec4::random_unit(&mut rng);
            assert!(v.is_normalized(1e-9), "not unit: {v:?}");
        }
    }

    #[test]
    fn test_projection_shortcuts() {
        let v = Vec4::new(1.0, 2.0, 3.0, 0.0);
        assert_eq!(v.orthographic(), Vec3::new(1.0, 2.0, 3.0));
        let p = v.perspective(2.0);
        assert_abs_diff_eq!(p.x, 1.0);
        assert_abs_diff_eq!(p.z, 3.0);
    }
}
