use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vib3_core::{Mat4, ProjectionMode, Rotor4, generate_geometry};

const ANGLES: [f64; 6] = [0.3, -0.2, 0.9, 0.5, -1.1, 0.25];

fn bench_rotation(c: &mut Criterion) {
    let points = generate_geometry(1, 32);

    c.bench_function("rotor_rotate_tesseract", |b| {
        let rotor = Rotor4::from_euler6(ANGLES);
        b.iter(|| points.iter().map(|&p| rotor.rotate(black_box(p))).collect::<Vec<_>>())
    });

    c.bench_function("matrix_rotate_tesseract", |b| {
        let m = Mat4::rotation_from_angles(ANGLES);
        b.iter(|| points.iter().map(|&p| m * black_box(p)).collect::<Vec<_>>())
    });

    c.bench_function("rotor_compose_euler6", |b| {
        b.iter(|| Rotor4::from_euler6(black_box(ANGLES)).normalize())
    });

    c.bench_function("project_to_f32", |b| {
        let mode = ProjectionMode::default();
        b.iter(|| mode.project_to_f32(black_box(&points)))
    });
}

criterion_group!(benches, bench_rotation);
criterion_main!(benches);
