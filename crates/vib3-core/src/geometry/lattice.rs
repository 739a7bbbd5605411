//! Per-sample lattice fields, one per base shape.
//!
//! Each function maps a 3D sample position to an intensity in `[0, 1]`.
//! `density` is lattice cells per unit, `time` is in milliseconds.

use std::f64::consts::TAU;

use super::BaseShape;
use crate::projection::Vec3;

fn fract(x: f64) -> f64 {
    x - x.floor()
}

/// Cell-local coordinates centred on the cell, each in [-0.5, 0.5).
fn cell(p: Vec3, density: f64) -> Vec3 {
    Vec3::new(
        fract(p.x * density) - 0.5,
        fract(p.y * density) - 0.5,
        fract(p.z * density) - 0.5,
    )
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// 1 on the feature, falling to 0 at `width`.
fn line(distance: f64, width: f64) -> f64 {
    1.0 - smoothstep(0.0, width, distance)
}

pub fn lattice(shape: BaseShape, p: Vec3, density: f64, time: f64) -> f64 {
    let density = if density.is_finite() && density > 0.0 { density } else { 1.0 };
    let value = match shape {
        BaseShape::Tetrahedron => tetrahedron(p, density),
        BaseShape::Hypercube => hypercube(p, density, time),
        BaseShape::Sphere => sphere(p, density, time),
        BaseShape::Torus => torus(p, density),
        BaseShape::KleinBottle => klein(p, density, time),
        BaseShape::Fractal => fractal(p, density),
        BaseShape::Wave => wave(p, density, time),
        BaseShape::Crystal => crystal(p, density),
    };
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

fn tetrahedron(p: Vec3, density: f64) -> f64 {
    const C: f64 = 0.25;
    let q = cell(p, density);
    let corners = [
        Vec3::new(C, C, C),
        Vec3::new(C, -C, -C),
        Vec3::new(-C, C, -C),
        Vec3::new(-C, -C, C),
    ];
    let nearest = corners
        .iter()
        .map(|&c| (q - c).length())
        .fold(f64::INFINITY, f64::min);
    line(nearest, 0.12)
}

fn hypercube(p: Vec3, density: f64, time: f64) -> f64 {
    let q = cell(p, density);
    // distance of each coordinate to its cell face
    let mut d = [0.5 - q.x.abs(), 0.5 - q.y.abs(), 0.5 - q.z.abs()];
    d.sort_by(f64::total_cmp);
    // An edge is where two faces meet, so the second smallest decides.
    let edges = line(d[1], 0.06);
    let pulse = 0.85 + 0.15 * (time * 0.001).sin();
    edges * pulse
}

fn sphere(p: Vec3, density: f64, time: f64) -> f64 {
    let r = cell(p, density).length();
    let shell_radius = 0.3 + 0.05 * (time * 0.001).sin();
    line((r - shell_radius).abs(), 0.05)
}

fn torus(p: Vec3, density: f64) -> f64 {
    let q = cell(p, density);
    let ring = (q.x * q.x + q.z * q.z).sqrt() - 0.3;
    let tube = (ring * ring + q.y * q.y).sqrt();
    line((tube - 0.1).abs(), 0.05)
}

fn klein(p: Vec3, density: f64, time: f64) -> f64 {
    let u = fract(p.x * density) * TAU;
    let v = fract(p.y * density) * TAU;
    let phase = time * 0.0005;
    let (sin_hu, cos_hu) = (u * 0.5).sin_cos();
    let surface = (cos_hu * v.sin() - sin_hu * (2.0 * v).sin() + (p.z * density * TAU + phase).sin()) / 3.0;
    line(surface.abs(), 0.15)
}

fn fractal(p: Vec3, density: f64) -> f64 {
    let mut z = p * (density * 0.25);
    let mut scale = 1.0;
    let mut trap = f64::INFINITY;
    for _ in 0..5 {
        z = Vec3::new(z.x.abs(), z.y.abs(), z.z.abs()) * 2.0 - Vec3::new(1.0, 1.0, 1.0);
        scale *= 2.0;
        trap = trap.min(z.length() / scale);
    }
    line(trap, 0.08)
}

fn wave(p: Vec3, density: f64, time: f64) -> f64 {
    let t = time * 0.001;
    let a = (p.x * density + t).sin() * (p.y * density - t * 0.7).sin();
    let b = (p.z * density * 0.5 + t * 1.3).cos();
    0.5 + 0.5 * (a * 0.7 + b * 0.3)
}

fn crystal(p: Vec3, density: f64) -> f64 {
    let q = cell(p, density);
    let octahedron = (q.x.abs() + q.y.abs() + q.z.abs() - 0.5).abs();
    let facets = q.x.abs().max(q.y.abs()).max(q.z.abs());
    line(octahedron, 0.08).max(line(0.5 - facets, 0.03) * 0.5)
}
