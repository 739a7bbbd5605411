//! Rotors in the even subalgebra of Cl(4,0).
//!
//! A rotor has 8 components: 1 scalar, 6 bivectors (one per rotation plane)
//! and 1 pseudoscalar. Bivector fields are coefficients on the blades
//! e_xy = e_x e_y, e_xz, e_yz, e_xw, e_yw, e_zw; the pseudoscalar is e_xyzw.
//!
//! Products are evaluated through a 16-blade multivector table so that the
//! sandwich `R v R̃` and rotor composition share one implementation.

use std::fmt;
use std::ops::{Mul, MulAssign, Neg};

use serde::{Deserialize, Serialize};

use crate::constants::{ANGLE_EPSILON, EPSILON};
use crate::matrix::Mat4;
use crate::vec4::Vec4;

/// The six planes of rotation in 4D.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotationPlane {
    XY,
    XZ,
    YZ,
    XW,
    YW,
    ZW,
}

impl RotationPlane {
    /// Canonical composition order.
    pub const ALL: [RotationPlane; 6] = [
        RotationPlane::XY,
        RotationPlane::XZ,
        RotationPlane::YZ,
        RotationPlane::XW,
        RotationPlane::YW,
        RotationPlane::ZW,
    ];

    /// Axis indices `(from, to)`; a positive angle turns `from` toward `to`.
    pub fn axes(self) -> (usize, usize) {
        match self {
            RotationPlane::XY => (0, 1),
            RotationPlane::XZ => (0, 2),
            RotationPlane::YZ => (1, 2),
            RotationPlane::XW => (0, 3),
            RotationPlane::YW => (1, 3),
            RotationPlane::ZW => (2, 3),
        }
    }

    /// True for the three planes that involve the w axis.
    pub fn is_hyperspatial(self) -> bool {
        matches!(self, RotationPlane::XW | RotationPlane::YW | RotationPlane::ZW)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RotationPlane::XY => "XY",
            RotationPlane::XZ => "XZ",
            RotationPlane::YZ => "YZ",
            RotationPlane::XW => "XW",
            RotationPlane::YW => "YW",
            RotationPlane::ZW => "ZW",
        }
    }
}

impl fmt::Display for RotationPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Blade bitmasks: x = 1, y = 2, z = 4, w = 8.
const S: usize = 0;
const XY: usize = 0b0011;
const XZ: usize = 0b0101;
const YZ: usize = 0b0110;
const XW: usize = 0b1001;
const YW: usize = 0b1010;
const ZW: usize = 0b1100;
const XYZW: usize = 0b1111;

type Multivector = [f64; 16];

/// Sign picked up by reordering the product of two basis blades into
/// canonical order. Euclidean metric, so squared basis vectors contribute +1.
fn reorder_sign(a: usize, b: usize) -> f64 {
    let mut a = a >> 1;
    let mut swaps = 0;
    while a != 0 {
        swaps += (a & b).count_ones();
        a >>= 1;
    }
    if swaps % 2 == 0 { 1.0 } else { -1.0 }
}

fn geometric_product(a: &Multivector, b: &Multivector) -> Multivector {
    let mut out = [0.0; 16];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            if bj == 0.0 {
                continue;
            }
            out[i ^ j] += reorder_sign(i, j) * ai * bj;
        }
    }
    out
}

fn vector_to_mv(v: Vec4) -> Multivector {
    let mut m = [0.0; 16];
    m[1] = v.x;
    m[2] = v.y;
    m[4] = v.z;
    m[8] = v.w;
    m
}

/// Even-grade element of Cl(4,0) representing a 4D rotation.
///
/// Unit rotors (magnitude 1) represent pure rotations. Repeated products
/// accumulate floating drift, so callers renormalize periodically.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rotor4 {
    pub s: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
    pub xw: f64,
    pub yw: f64,
    pub zw: f64,
    pub xyzw: f64,
}

impl Default for Rotor4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotor4 {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        s: f64,
        xy: f64,
        xz: f64,
        yz: f64,
        xw: f64,
        yw: f64,
        zw: f64,
        xyzw: f64,
    ) -> Self {
        Self {
            s,
            xy,
            xz,
            yz,
            xw,
            yw,
            zw,
            xyzw,
        }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Rotation by `angle` radians in a single plane: `cos(θ/2) - sin(θ/2) B`.
    pub fn from_plane_angle(plane: RotationPlane, angle: f64) -> Self {
        let half = angle * 0.5;
        let (sin_h, cos_h) = half.sin_cos();
        let mut r = Self::identity();
        r.s = cos_h;
        *r.bivector_mut(plane) = -sin_h;
        r
    }

    /// Compose six plane rotations in the order XY·XZ·YZ·XW·YW·ZW.
    /// Near-zero angles are skipped.
    pub fn from_euler6(angles: [f64; 6]) -> Self {
        let mut result = Self::identity();
        for (plane, angle) in RotationPlane::ALL.into_iter().zip(angles) {
            if angle.abs() > ANGLE_EPSILON {
                result *= Self::from_plane_angle(plane, angle);
            }
        }
        result
    }

    pub fn bivector(&self, plane: RotationPlane) -> f64 {
        match plane {
            RotationPlane::XY => self.xy,
            RotationPlane::XZ => self.xz,
            RotationPlane::YZ => self.yz,
            RotationPlane::XW => self.xw,
            RotationPlane::YW => self.yw,
            RotationPlane::ZW => self.zw,
        }
    }

    fn bivector_mut(&mut self, plane: RotationPlane) -> &mut f64 {
        match plane {
            RotationPlane::XY => &mut self.xy,
            RotationPlane::XZ => &mut self.xz,
            RotationPlane::YZ => &mut self.yz,
            RotationPlane::XW => &mut self.xw,
            RotationPlane::YW => &mut self.yw,
            RotationPlane::ZW => &mut self.zw,
        }
    }

    fn to_mv(self) -> Multivector {
        let mut m = [0.0; 16];
        m[S] = self.s;
        m[XY] = self.xy;
        m[XZ] = self.xz;
        m[YZ] = self.yz;
        m[XW] = self.xw;
        m[YW] = self.yw;
        m[ZW] = self.zw;
        m[XYZW] = self.xyzw;
        m
    }

    fn from_mv(m: &Multivector) -> Self {
        Self::new(m[S], m[XY], m[XZ], m[YZ], m[XW], m[YW], m[ZW], m[XYZW])
    }

    /// Reverse: negates bivectors, keeps scalar and pseudoscalar.
    pub fn reverse(self) -> Self {
        Self::new(
            self.s, -self.xy, -self.xz, -self.yz, -self.xw, -self.yw, -self.zw, self.xyzw,
        )
    }

    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Scale to unit magnitude. Returns identity if near-zero magnitude.
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / mag;
        Self::new(
            self.s * inv,
            self.xy * inv,
            self.xz * inv,
            self.yz * inv,
            self.xw * inv,
            self.yw * inv,
            self.zw * inv,
            self.xyzw * inv,
        )
    }

    pub fn is_normalized(self, epsilon: f64) -> bool {
        (self.magnitude_squared() - 1.0).abs() < epsilon
    }

    /// Reverse divided by squared magnitude. Identity for a degenerate rotor.
    pub fn inverse(self) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq < EPSILON {
            return Self::identity();
        }
        let rev = self.reverse();
        let inv = 1.0 / mag_sq;
        Self::new(
            rev.s * inv,
            rev.xy * inv,
            rev.xz * inv,
            rev.yz * inv,
            rev.xw * inv,
            rev.yw * inv,
            rev.zw * inv,
            rev.xyzw * inv,
        )
    }

    /// 8-component Euclidean inner product.
    pub fn dot(self, other: Self) -> f64 {
        self.s * other.s
            + self.xy * other.xy
            + self.xz * other.xz
            + self.yz * other.yz
            + self.xw * other.xw
            + self.yw * other.yw
            + self.zw * other.zw
            + self.xyzw * other.xyzw
    }

    /// Sandwich product `R v R̃`.
    pub fn rotate(self, v: Vec4) -> Vec4 {
        let r = self.to_mv();
        let rv = geometric_product(&r, &vector_to_mv(v));
        let out = geometric_product(&rv, &self.reverse().to_mv());
        Vec4::new(out[1], out[2], out[4], out[8])
    }

    /// Column-major rotation matrix whose columns are the rotated basis vectors.
    pub fn to_matrix(self) -> Mat4 {
        Mat4::from_columns([
            self.rotate(Vec4::X),
            self.rotate(Vec4::Y),
            self.rotate(Vec4::Z),
            self.rotate(Vec4::W),
        ])
    }

    /// Normalized linear interpolation.
    pub fn nlerp(self, other: Self, t: f64) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        Self::from_array(std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)).normalize()
    }

    /// Spherical linear interpolation along the shorter arc, with an NLERP
    /// fallback for nearly parallel rotors.
    pub fn slerp(self, other: Self, t: f64) -> Self {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }

        let mut d = self.dot(other);
        let target = if d < 0.0 {
            d = -d;
            -other
        } else {
            other
        };

        if d > 0.9995 {
            return self.nlerp(target, t);
        }

        let theta = d.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let w1 = ((1.0 - t) * theta).sin() / sin_theta;
        let w2 = (t * theta).sin() / sin_theta;

        let a = self.to_array();
        let b = target.to_array();
        Self::from_array(std::array::from_fn(|i| a[i] * w1 + b[i] * w2))
    }

    /// `[s, xy, xz, yz, xw, yw, zw, xyzw]`.
    pub fn to_array(self) -> [f64; 8] {
        [
            self.s, self.xy, self.xz, self.yz, self.xw, self.yw, self.zw, self.xyzw,
        ]
    }

    pub fn from_array(arr: [f64; 8]) -> Self {
        Self::new(
            arr[0], arr[1], arr[2], arr[3], arr[4], arr[5], arr[6], arr[7],
        )
    }
}

impl Neg for Rotor4 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(
            -self.s, -self.xy, -self.xz, -self.yz, -self.xw, -self.yw, -self.zw, -self.xyzw,
        )
    }
}

/// Geometric product. Not commutative: `(a * b).rotate(v)` applies `b` first.
impl Mul for Rotor4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_mv(&geometric_product(&self.to_mv(), &rhs.to_mv()))
    }
}

impl MulAssign for Rotor4 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_vec_eq(a: Vec4, b: Vec4, tol: f64) {
        assert!(
            a.distance(b) < tol,
            "vectors differ: {a:?} vs {b:?}"
        );
    }

    #[test]
    fn test_reorder_sign() {
        assert_eq!(reorder_sign(0b0001, 0b0010), 1.0);
        assert_eq!(reorder_sign(0b0010, 0b0001), -1.0);
        // e_xy e_xy = e_x e_y e_x e_y = -1
        assert_eq!(reorder_sign(XY, XY), -1.0);
        assert_eq!(reorder_sign(XYZW, XYZW), 1.0);
    }

    #[test]
    fn test_identity_rotation() {
        let v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_vec_eq(Rotor4::identity().rotate(v), v, 1e-12);
    }

    #[test]
    fn test_quarter_turns() {
        let r = Rotor4::from_plane_angle(RotationPlane::XY, FRAC_PI_2);
        assert_vec_eq(r.rotate(Vec4::X), Vec4::Y, 1e-12);
        assert_vec_eq(r.rotate(Vec4::Y), -Vec4::X, 1e-12);
        assert_vec_eq(r.rotate(Vec4::Z), Vec4::Z, 1e-12);

        let r = Rotor4::from_plane_angle(RotationPlane::XW, FRAC_PI_2);
        assert_vec_eq(r.rotate(Vec4::X), Vec4::W, 1e-12);

        let r = Rotor4::from_plane_angle(RotationPlane::ZW, FRAC_PI_2);
        assert_vec_eq(r.rotate(Vec4::Z), Vec4::W, 1e-12);
        assert_vec_eq(r.rotate(Vec4::X), Vec4::X, 1e-12);
    }

    #[test]
    fn test_rotation_preserves_length() {
        let r = Rotor4::from_euler6([0.3, -1.1, 0.7, 0.4, 1.9, -0.2]);
        let v = Vec4::new(1.0, -2.0, 3.0, 0.5);
        assert_abs_diff_eq!(r.rotate(v).length(), v.length(), epsilon = 1e-10);
    }

    #[test]
    fn test_product_is_not_commutative() {
        let a = Rotor4::from_plane_angle(RotationPlane::XY, 0.8);
        let b = Rotor4::from_plane_angle(RotationPlane::YZ, 0.5);
        let ab = a * b;
        let ba = b * a;
        assert!(ab.dot(ba) < 1.0 - 1e-6, "expected ab != ba");
    }

    #[test]
    fn test_composition_order() {
        let a = Rotor4::from_plane_angle(RotationPlane::XY, 0.8);
        let b = Rotor4::from_plane_angle(RotationPlane::ZW, -1.3);
        let v = Vec4::new(0.2, 0.4, -0.6, 1.0);
        assert_vec_eq((a * b).rotate(v), a.rotate(b.rotate(v)), 1e-12);
    }

    #[test]
    fn test_inverse_undoes_rotation() {
        let r = Rotor4::from_euler6([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_vec_eq(r.inverse().rotate(r.rotate(v)), v, 1e-10);
        let id = r * r.reverse();
        assert_abs_diff_eq!(id.s, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_normalize() {
        let r = Rotor4::new(2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0).normalize();
        assert!(r.is_normalized(1e-12));
        let zero = Rotor4::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(zero.normalize(), Rotor4::identity());
    }

    #[test]
    fn test_double_rotation_has_pseudoscalar() {
        let r = Rotor4::from_plane_angle(RotationPlane::XY, 1.0)
            * Rotor4::from_plane_angle(RotationPlane::ZW, 1.0);
        assert!(r.xyzw.abs() > 0.1);
        assert!(r.is_normalized(1e-12));
    }

    #[test]
    fn test_rotate_matches_matrix() {
        let r = Rotor4::from_euler6([0.9, -0.4, 1.2, 0.3, -1.7, 0.6]);
        let m = r.to_matrix();
        let v = Vec4::new(-1.0, 0.5, 2.0, -0.25);
        assert_vec_eq(r.rotate(v), m * v, 1e-12);
    }

    #[test]
    fn test_slerp_endpoints_and_midpoint() {
        let a = Rotor4::identity();
        let b = Rotor4::from_plane_angle(RotationPlane::XW, PI / 2.0);
        assert_eq!(a.slerp(b, 0.0), a);
        assert_eq!(a.slerp(b, 1.0), b);

        let mid = a.slerp(b, 0.5);
        let expected = Rotor4::from_plane_angle(RotationPlane::XW, PI / 4.0);
        assert_abs_diff_eq!(mid.dot(expected), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_slerp_takes_short_arc() {
        let a = Rotor4::identity();
        let b = -Rotor4::from_plane_angle(RotationPlane::XY, 0.2);
        let mid = a.slerp(b, 0.5);
        assert!(mid.s > 0.99, "expected short arc, got {mid:?}");
    }

    #[test]
    fn test_nlerp_stays_unit_between_endpoints() {
        let a = Rotor4::identity();
        let b = Rotor4::from_plane_angle(RotationPlane::YZ, 0.6);
        assert_abs_diff_eq!(a.nlerp(b, 1.0).dot(b), 1.0, epsilon = 1e-12);
        let mid = a.nlerp(b, 0.5);
        assert_abs_diff_eq!(mid.dot(mid), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.dot(a.slerp(b, 0.5)), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_array_roundtrip() {
        let r = Rotor4::from_euler6([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(Rotor4::from_array(r.to_array()), r);
    }
}
