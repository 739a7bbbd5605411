use std::ops::{Mul, MulAssign};

use serde::{Deserialize, Serialize};

use crate::constants::{ANGLE_EPSILON, EPSILON};
use crate::rotor::RotationPlane;
use crate::vec4::Vec4;

/// 4x4 matrix stored column-major, matching GPU uniform layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub data: [f64; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn zero() -> Self {
        Self { data: [0.0; 16] }
    }

    pub const fn identity() -> Self {
        let mut data = [0.0; 16];
        data[0] = 1.0;
        data[5] = 1.0;
        data[10] = 1.0;
        data[15] = 1.0;
        Self { data }
    }

    pub fn from_columns(cols: [Vec4; 4]) -> Self {
        let mut m = Self::zero();
        for (c, col) in cols.into_iter().enumerate() {
            m.set_column(c, col);
        }
        m
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[col * 4 + row]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[col * 4 + row] = value;
    }

    pub fn column(&self, col: usize) -> Vec4 {
        let b = col * 4;
        Vec4::new(self.data[b], self.data[b + 1], self.data[b + 2], self.data[b + 3])
    }

    pub fn set_column(&mut self, col: usize, v: Vec4) {
        let b = col * 4;
        self.data[b..b + 4].copy_from_slice(&v.to_array());
    }

    pub fn row(&self, row: usize) -> Vec4 {
        Vec4::new(
            self.at(row, 0),
            self.at(row, 1),
            self.at(row, 2),
            self.at(row, 3),
        )
    }

    /// Single-plane rotation. Differs from identity only in the plane's
    /// 2x2 block; a positive angle turns the first axis toward the second.
    pub fn rotation(plane: RotationPlane, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let (a, b) = plane.axes();
        let mut m = Self::identity();
        m.set(a, a, c);
        m.set(a, b, -s);
        m.set(b, a, s);
        m.set(b, b, c);
        m
    }

    pub fn rotation_xy(angle: f64) -> Self {
        Self::rotation(RotationPlane::XY, angle)
    }

    pub fn rotation_xz(angle: f64) -> Self {
        Self::rotation(RotationPlane::XZ, angle)
    }

    pub fn rotation_yz(angle: f64) -> Self {
        Self::rotation(RotationPlane::YZ, angle)
    }

    pub fn rotation_xw(angle: f64) -> Self {
        Self::rotation(RotationPlane::XW, angle)
    }

    pub fn rotation_yw(angle: f64) -> Self {
        Self::rotation(RotationPlane::YW, angle)
    }

    pub fn rotation_zw(angle: f64) -> Self {
        Self::rotation(RotationPlane::ZW, angle)
    }

    /// Product XY·XZ·YZ·XW·YW·ZW, the same order `Rotor4::from_euler6` uses.
    pub fn rotation_from_angles(angles: [f64; 6]) -> Self {
        let mut result = Self::identity();
        for (plane, angle) in RotationPlane::ALL.into_iter().zip(angles) {
            if angle.abs() > ANGLE_EPSILON {
                result *= Self::rotation(plane, angle);
            }
        }
        result
    }

    pub fn scale(s: Vec4) -> Self {
        let mut m = Self::zero();
        m.set(0, 0, s.x);
        m.set(1, 1, s.y);
        m.set(2, 2, s.z);
        m.set(3, 3, s.w);
        m
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zero();
        for r in 0..4 {
            for c in 0..4 {
                t.set(c, r, self.at(r, c));
            }
        }
        t
    }

    /// Cofactor expansion via 2x2 sub-determinants.
    pub fn determinant(&self) -> f64 {
        let (_, det) = self.adjugate_and_det();
        det
    }

    /// `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let (adj, det) = self.adjugate_and_det();
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let mut out = adj;
        for v in &mut out.data {
            *v *= inv_det;
        }
        Some(out)
    }

    fn adjugate_and_det(&self) -> (Self, f64) {
        let a = |r, c| self.at(r, c);

        let b00 = a(0, 0) * a(1, 1) - a(0, 1) * a(1, 0);
        let b01 = a(0, 0) * a(1, 2) - a(0, 2) * a(1, 0);
        let b02 = a(0, 0) * a(1, 3) - a(0, 3) * a(1, 0);
        let b03 = a(0, 1) * a(1, 2) - a(0, 2) * a(1, 1);
        let b04 = a(0, 1) * a(1, 3) - a(0, 3) * a(1, 1);
        let b05 = a(0, 2) * a(1, 3) - a(0, 3) * a(1, 2);
        let b06 = a(2, 0) * a(3, 1) - a(2, 1) * a(3, 0);
        let b07 = a(2, 0) * a(3, 2) - a(2, 2) * a(3, 0);
        let b08 = a(2, 0) * a(3, 3) - a(2, 3) * a(3, 0);
        let b09 = a(2, 1) * a(3, 2) - a(2, 2) * a(3, 1);
        let b10 = a(2, 1) * a(3, 3) - a(2, 3) * a(3, 1);
        let b11 = a(2, 2) * a(3, 3) - a(2, 3) * a(3, 2);

        let det = b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06;

        let mut adj = Self::zero();
        adj.set(0, 0, a(1, 1) * b11 - a(1, 2) * b10 + a(1, 3) * b09);
        adj.set(0, 1, -a(0, 1) * b11 + a(0, 2) * b10 - a(0, 3) * b09);
        adj.set(0, 2, a(3, 1) * b05 - a(3, 2) * b04 + a(3, 3) * b03);
        adj.set(0, 3, -a(2, 1) * b05 + a(2, 2) * b04 - a(2, 3) * b03);
        adj.set(1, 0, -a(1, 0) * b11 + a(1, 2) * b08 - a(1, 3) * b07);
        adj.set(1, 1, a(0, 0) * b11 - a(0, 2) * b08 + a(0, 3) * b07);
        adj.set(1, 2, -a(3, 0) * b05 + a(3, 2) * b02 - a(3, 3) * b01);
        adj.set(1, 3, a(2, 0) * b05 - a(2, 2) * b02 + a(2, 3) * b01);
        adj.set(2, 0, a(1, 0) * b10 - a(1, 1) * b08 + a(1, 3) * b06);
        adj.set(2, 1, -a(0, 0) * b10 + a(0, 1) * b08 - a(0, 3) * b06);
        adj.set(2, 2, a(3, 0) * b04 - a(3, 1) * b02 + a(3, 3) * b00);
        adj.set(2, 3, -a(2, 0) * b04 + a(2, 1) * b02 - a(2, 3) * b00);
        adj.set(3, 0, -a(1, 0) * b09 + a(1, 1) * b07 - a(1, 2) * b06);
        adj.set(3, 1, a(0, 0) * b09 - a(0, 1) * b07 + a(0, 2) * b06);
        adj.set(3, 2, -a(3, 0) * b03 + a(3, 1) * b01 - a(3, 2) * b00);
        adj.set(3, 3, a(2, 0) * b03 - a(2, 1) * b01 + a(2, 2) * b00);

        (adj, det)
    }

    /// True iff `M · Mᵀ` is within `tolerance` of identity, element-wise.
    pub fn is_orthogonal(&self, tolerance: f64) -> bool {
        (*self * self.transpose()).approx_eq(&Self::identity(), tolerance)
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Single-precision copy for GPU upload.
    pub fn to_f32_array(&self) -> [f32; 16] {
        self.data.map(|v| v as f32)
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = Self::zero();
        for c in 0..4 {
            out.set_column(c, self * rhs.column(c));
        }
        out
    }
}

impl MulAssign for Mat4 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Vec4 {
        Vec4::new(
            self.row(0).dot(v),
            self.row(1).dot(v),
            self.row(2).dot(v),
            self.row(3).dot(v),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotor::Rotor4;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_column_major_layout() {
        let mut m = Mat4::identity();
        m.set(0, 3, 5.0);
        assert_eq!(m.data[12], 5.0);
        assert_eq!(m.column(3), Vec4::new(5.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_plane_rotations_orthogonal() {
        for plane in RotationPlane::ALL {
            for angle in [-2.5, -0.3, 0.0, 0.7, 3.1, 12.0] {
                let m = Mat4::rotation(plane, angle);
                assert!(m.is_orthogonal(1e-12), "{plane} at {angle} not orthogonal");
                assert_abs_diff_eq!(m.determinant(), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_plane_rotation_touches_only_its_block() {
        let m = Mat4::rotation_yw(0.6);
        assert_eq!(m.at(0, 0), 1.0);
        assert_eq!(m.at(2, 2), 1.0);
        assert_eq!(m.at(0, 1), 0.0);
        assert_abs_diff_eq!(m.at(3, 1), 0.6f64.sin());
        assert_abs_diff_eq!(m.at(1, 3), -(0.6f64.sin()));
    }

    #[test]
    fn test_plane_matrices_match_rotors() {
        for plane in RotationPlane::ALL {
            let m = Mat4::rotation(plane, 0.9);
            let r = Rotor4::from_plane_angle(plane, 0.9).to_matrix();
            assert!(m.approx_eq(&r, 1e-12), "{plane} mismatch");
        }
    }

    #[test]
    fn test_composed_angles_match_rotor() {
        let angles = [0.4, -1.2, 2.2, 0.8, -0.5, 1.6];
        let m = Mat4::rotation_from_angles(angles);
        let r = Rotor4::from_euler6(angles).to_matrix();
        assert!(m.approx_eq(&r, 1e-10));
        assert!(m.is_orthogonal(1e-10));
    }

    #[test]
    fn test_inverse() {
        let m = Mat4::rotation_from_angles([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let inv = m.inverse().unwrap();
        assert!(inv.approx_eq(&m.transpose(), 1e-10));
        assert!((m * inv).approx_eq(&Mat4::identity(), 1e-10));

        let s = Mat4::scale(Vec4::new(2.0, 4.0, 0.5, 1.0));
        assert_abs_diff_eq!(s.determinant(), 4.0);
        assert!(Mat4::zero().inverse().is_none());
    }

    #[test]
    fn test_scale_not_orthogonal() {
        assert!(!Mat4::scale(Vec4::splat(2.0)).is_orthogonal(1e-6));
    }

    #[test]
    fn test_f32_upload() {
        let m = Mat4::identity().to_f32_array();
        assert_eq!(m[0], 1.0f32);
        assert_eq!(m[1], 0.0f32);
    }
}
