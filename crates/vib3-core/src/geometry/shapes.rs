//! Point-cloud generators for the eight base shapes.
//!
//! Edge-based shapes (tetrahedron, hypercube, crystal) sample `resolution`
//! points along every edge; surface shapes sample a `resolution²` grid.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

use super::BaseShape;
use crate::vec4::Vec4;

pub fn generate(shape: BaseShape, resolution: usize) -> Vec<Vec4> {
    match shape {
        BaseShape::Tetrahedron => tetrahedron(resolution),
        BaseShape::Hypercube => tesseract(resolution),
        BaseShape::Sphere => sphere(resolution),
        BaseShape::Torus => clifford_torus(resolution),
        BaseShape::KleinBottle => klein_bottle(resolution),
        BaseShape::Fractal => fractal(resolution),
        BaseShape::Wave => wave(resolution),
        BaseShape::Crystal => crystal(resolution),
    }
}

/// Sample `resolution` evenly spaced points on each edge, endpoints included.
fn sample_edges(vertices: &[Vec4], edges: &[(usize, usize)], resolution: usize) -> Vec<Vec4> {
    let resolution = resolution.max(2);
    let mut out = Vec::with_capacity(edges.len() * resolution);
    for &(a, b) in edges {
        for i in 0..resolution {
            let t = i as f64 / (resolution - 1) as f64;
            out.push(vertices[a].lerp(vertices[b], t));
        }
    }
    out
}

/// Regular tetrahedron with unit edge, centroid at the origin, in w = 0.
pub fn tetrahedron_vertices() -> [Vec4; 4] {
    let s = 0.5 * FRAC_1_SQRT_2;
    [
        Vec4::new(s, s, s, 0.0),
        Vec4::new(s, -s, -s, 0.0),
        Vec4::new(-s, s, -s, 0.0),
        Vec4::new(-s, -s, s, 0.0),
    ]
}

pub fn tetrahedron(resolution: usize) -> Vec<Vec4> {
    let edges = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    sample_edges(&tetrahedron_vertices(), &edges, resolution)
}

/// The 16 vertices (±1, ±1, ±1, ±1).
pub fn tesseract_vertices() -> Vec<Vec4> {
    (0..16u8)
        .map(|i| {
            let sign = |bit: u8| if i & bit != 0 { 1.0 } else { -1.0 };
            Vec4::new(sign(1), sign(2), sign(4), sign(8))
        })
        .collect()
}

/// The 32 edges: vertex pairs differing in exactly one coordinate.
pub fn tesseract_edges() -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(32);
    for i in 0..16usize {
        for bit in 0..4 {
            let j = i ^ (1 << bit);
            if j > i {
                edges.push((i, j));
            }
        }
    }
    edges
}

pub fn tesseract(resolution: usize) -> Vec<Vec4> {
    sample_edges(&tesseract_vertices(), &tesseract_edges(), resolution)
}

/// Unit 3-sphere in Hopf coordinates (psi, theta, phi).
pub fn sphere(resolution: usize) -> Vec<Vec4> {
    let resolution = resolution.max(4);
    let psi_steps = (resolution / 2).max(2);
    let mut out = Vec::with_capacity(psi_steps * resolution * resolution);
    for ip in 0..psi_steps {
        let psi = FRAC_PI_2 * ip as f64 / (psi_steps - 1) as f64;
        let (sin_psi, cos_psi) = psi.sin_cos();
        for it in 0..resolution {
            let theta = TAU * it as f64 / resolution as f64;
            let (sin_t, cos_t) = theta.sin_cos();
            for iphi in 0..resolution {
                let phi = TAU * iphi as f64 / resolution as f64;
                let (sin_p, cos_p) = phi.sin_cos();
                out.push(Vec4::new(
                    cos_psi * cos_t,
                    cos_psi * sin_t,
                    sin_psi * cos_p,
                    sin_psi * sin_p,
                ));
            }
        }
    }
    out
}

/// Flat torus S¹ × S¹ with equal radii, lying on the unit 3-sphere.
pub fn clifford_torus(resolution: usize) -> Vec<Vec4> {
    let resolution = resolution.max(4);
    let r = FRAC_1_SQRT_2;
    let mut out = Vec::with_capacity(resolution * resolution);
    for iu in 0..resolution {
        let (sin_u, cos_u) = (TAU * iu as f64 / resolution as f64).sin_cos();
        for iv in 0..resolution {
            let (sin_v, cos_v) = (TAU * iv as f64 / resolution as f64).sin_cos();
            out.push(Vec4::new(r * cos_u, r * sin_u, r * cos_v, r * sin_v));
        }
    }
    out
}

/// Figure-eight Klein bottle lifted into R⁴ so it does not self-intersect.
pub fn klein_bottle(resolution: usize) -> Vec<Vec4> {
    let resolution = resolution.max(4);
    let (a, b) = (2.0, 1.0);
    let mut out = Vec::with_capacity(resolution * resolution);
    for iu in 0..resolution {
        let u = TAU * iu as f64 / resolution as f64;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_hu, cos_hu) = (u * 0.5).sin_cos();
        for iv in 0..resolution {
            let (sin_v, cos_v) = (TAU * iv as f64 / resolution as f64).sin_cos();
            let r = a + b * cos_v;
            out.push(Vec4::new(
                r * cos_u,
                r * sin_u,
                b * sin_v * cos_hu,
                b * sin_v * sin_hu,
            ));
        }
    }
    out
}

/// Pentatope attractors for the chaos game.
fn fractal_attractor(index: usize) -> Vec4 {
    let k = FRAC_1_SQRT_2;
    match index {
        0 => Vec4::new(1.0, 1.0, 1.0, -k),
        1 => Vec4::new(1.0, -1.0, -1.0, -k),
        2 => Vec4::new(-1.0, 1.0, -1.0, -k),
        3 => Vec4::new(-1.0, -1.0, 1.0, -k),
        _ => Vec4::new(0.0, 0.0, 0.0, 4.0 * k),
    }
}

fn xorshift(mut seed: u32) -> u32 {
    seed ^= seed << 13;
    seed ^= seed >> 17;
    seed ^= seed << 5;
    seed
}

/// 4D Sierpinski-style set via the chaos game, `resolution²` points.
/// Fixed seed, so output is reproducible.
pub fn fractal(resolution: usize) -> Vec<Vec4> {
    const WARM_UP: usize = 64;
    let resolution = resolution.max(4);
    let count = resolution * resolution;
    let mut out = Vec::with_capacity(count);
    let mut current = Vec4::ZERO;
    let mut seed: u32 = 0xDEAD_BEEF;

    for i in 0..WARM_UP + count {
        seed = xorshift(seed);
        current = current.lerp(fractal_attractor((seed % 5) as usize), 0.5);
        if i >= WARM_UP {
            out.push(current);
        }
    }
    out
}

/// XZ grid displaced in y and w by three interfering wave sources.
pub fn wave(resolution: usize) -> Vec<Vec4> {
    // (frequency, amp_y, amp_w, phase_x, phase_z)
    const SOURCES: [(f64, f64, f64, f64, f64); 3] = [
        (1.0, 0.5, 0.3, 0.0, 0.0),
        (2.3, 0.25, 0.15, PI * 0.5, PI * 0.25),
        (3.7, 0.125, 0.1, PI * 0.75, PI * 0.6),
    ];
    const EXTENT: f64 = 2.0;

    let resolution = resolution.max(4);
    let step = 2.0 * EXTENT / (resolution - 1) as f64;
    let mut out = Vec::with_capacity(resolution * resolution);
    for ix in 0..resolution {
        let x = -EXTENT + ix as f64 * step;
        for iz in 0..resolution {
            let z = -EXTENT + iz as f64 * step;
            let (mut y, mut w) = (0.0, 0.0);
            for (freq, amp_y, amp_w, ph_x, ph_z) in SOURCES {
                let px = freq * x * PI + ph_x;
                let pz = freq * z * PI + ph_z;
                y += amp_y * px.sin() * pz.cos();
                w += amp_w * (px + pz).cos();
            }
            out.push(Vec4::new(x, y, z, w));
        }
    }
    out
}

/// 16-cell wireframe (24 edges) plus the 16 dual vertices at (±½, ±½, ±½, ±½).
pub fn crystal(resolution: usize) -> Vec<Vec4> {
    let vertices = [
        Vec4::X,
        -Vec4::X,
        Vec4::Y,
        -Vec4::Y,
        Vec4::Z,
        -Vec4::Z,
        Vec4::W,
        -Vec4::W,
    ];
    let mut edges = Vec::with_capacity(24);
    for i in 0..8usize {
        for j in (i + 1)..8 {
            // antipodal pairs share an axis: (0,1), (2,3), ...
            if i ^ j == 1 && i % 2 == 0 {
                continue;
            }
            edges.push((i, j));
        }
    }
    let mut out = sample_edges(&vertices, &edges, resolution);
    out.extend(tesseract_vertices().into_iter().map(|v| v * 0.5));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tetrahedron_unit_edges() {
        let v = tetrahedron_vertices();
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_abs_diff_eq!(v[i].distance(v[j]), 1.0, epsilon = 1e-12);
            }
        }
        assert_eq!(tetrahedron(5).len(), 30);
    }

    #[test]
    fn test_tesseract_topology() {
        assert_eq!(tesseract_vertices().len(), 16);
        assert_eq!(tesseract_edges().len(), 32);
        assert_eq!(tesseract(3).len(), 96);
    }

    #[test]
    fn test_sphere_and_torus_on_s3() {
        for p in sphere(8).into_iter().chain(clifford_torus(8)) {
            assert_abs_diff_eq!(p.length(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_crystal_counts() {
        assert_eq!(crystal(2).len(), 24 * 2 + 16);
    }

    #[test]
    fn test_fractal_bounded_and_reproducible() {
        let a = fractal(6);
        assert_eq!(a.len(), 36);
        assert_eq!(a, fractal(6));
        for p in &a {
            assert!(p.length() < 3.5);
        }
    }

    #[test]
    fn test_surface_counts() {
        assert_eq!(klein_bottle(5).len(), 25);
        assert_eq!(wave(4).len(), 16);
        assert_eq!(clifford_torus(2).len(), 16);
    }
}
