//! Integration tests exercising the runtime end to end:
//! geometry encoding → rotation/projection, and timeline/choreography/preset
//! playback through a recording host.

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use vib3_core::{
    ApplyOptions, BaseShape, ChoreographyPlayer, ColorPresetsSystem, CoreWarp, Easing, Engine,
    LoopMode, Mat4, Parameter, ParameterSet, ParameterSink, ParameterState, ParameterTimeline,
    ProjectionMode, Rotor4, TransitionAnimator, TransitionSpec, Vec4, VisualSystem, decode,
    encode, generate_geometry,
};

const CHOREOGRAPHY: &str = r#"{
    "name": "integration",
    "scenes": [
        {"time_start": 0, "time_end": 1000, "system": "faceted", "geometry": 1},
        {"time_start": 1000, "time_end": 2500, "system": "quantum", "geometry": 11,
         "color_preset": "Nebula",
         "tracks": {"speed": [{"time": 0, "value": 1.0}, {"time": 1500, "value": 2.5}]}},
        {"time_start": 2500, "time_end": 4000, "system": "holographic", "geometry": 21,
         "transition_in": {"type": "crossfade", "duration": 500}}
    ]
}"#;

/// Scenario A: Hypersphere core over a torus base.
#[test]
fn hypersphere_torus_encoding() {
    assert_eq!(encode(CoreWarp::Hypersphere, BaseShape::Torus), 11);
    let id = decode(11).unwrap();
    assert_eq!((id.core.index(), id.base.index()), (1, 3));
    assert_eq!(id.name(), "Hypersphere Torus");

    // Every warped torus point lies on the unit 3-sphere.
    for p in generate_geometry(11, 12) {
        assert_abs_diff_eq!(p.length(), 1.0, epsilon = 1e-9);
    }
}

/// Scenario B: full hue sweep at the midpoint of a linear 8 s timeline.
#[test]
fn timeline_full_hue_sweep() {
    let mut tl = ParameterTimeline::new(8000.0);
    tl.set_loop_mode(LoopMode::Once);
    tl.add_keyframe(Parameter::Hue, 0.0, 0.0, Easing::Linear);
    tl.add_keyframe(Parameter::Hue, 8000.0, 360.0, Easing::Linear);

    let mut host = ParameterState::new();
    tl.play(0.0, None);
    tl.tick(4000.0, &mut host);
    assert_abs_diff_eq!(host.value(Parameter::Hue).unwrap(), 180.0, epsilon = 1e-9);
}

/// Scenario C: an immediate preset writes exactly three values.
#[test]
fn ocean_deep_snaps() {
    let mut presets = ColorPresetsSystem::new();
    let mut host = ParameterState::new();
    presets.apply_preset("Ocean Deep", ApplyOptions::immediate(), 0.0, &mut host);
    assert_eq!(host.value(Parameter::Hue), Some(200.0));
    assert_eq!(host.value(Parameter::Saturation), Some(0.75));
    assert_eq!(host.value(Parameter::Intensity), Some(0.55));
    assert_eq!(host.update_count(), 3);
    assert!(!presets.tick(16.0, &mut host));
}

#[test]
fn rotation_pipeline_matches_matrix_pipeline() {
    let angles = [0.3, -0.2, 0.9, 0.5, -1.1, 0.25];
    let rotor = Rotor4::from_euler6(angles);
    let matrix = Mat4::rotation_from_angles(angles);
    assert!(matrix.is_orthogonal(1e-9));
    assert_abs_diff_eq!(matrix.determinant(), 1.0, epsilon = 1e-9);

    let mode = ProjectionMode::default();
    for p in generate_geometry(1, 4) {
        let a = mode.project(rotor.rotate(p));
        let b = mode.project(matrix * p);
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-6);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-6);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-6);
        assert!(a.is_finite());
    }
}

#[test]
fn perspective_near_singularity_is_finite() {
    for eps in [1e-3, 1e-7, 0.0, -1e-9] {
        let p = Vec4::new(1.0, -2.0, 0.5, -2.0 + eps).perspective(2.0);
        assert!(p.is_finite(), "eps {eps} gave {p:?}");
    }
}

#[test]
fn choreography_drives_engine() {
    let mut player = ChoreographyPlayer::new();
    player.load_json(CHOREOGRAPHY).unwrap();
    let mut host = ParameterState::new();
    host.update_parameter(Parameter::Intensity, 0.7);

    let completed = Rc::new(Cell::new(false));
    let c = completed.clone();
    player.on_complete(move || c.set(true));

    player.play(0.0, &mut host);
    assert_eq!(host.current_system(), VisualSystem::Faceted);
    assert_eq!(host.value(Parameter::Geometry), Some(1.0));

    let mut now = 0.0;
    let mut saw_dark = false;
    let mut speed_at_mid = None;
    while player.tick(now, &mut host) {
        if player.current_scene_index() == Some(1) && (1740.0..1760.0).contains(&now) {
            speed_at_mid = host.value(Parameter::Speed);
        }
        if host.value(Parameter::Intensity) == Some(0.0) {
            saw_dark = true;
            // The system only changes once the fade-out has bottomed out.
            assert_ne!(host.current_system(), VisualSystem::Faceted);
        }
        now += 10.0;
    }

    assert!(completed.get());
    assert!(saw_dark, "crossfade into the last scene should pass through black");
    assert_eq!(host.current_system(), VisualSystem::Holographic);
    assert_eq!(host.value(Parameter::Geometry), Some(21.0));
    assert_abs_diff_eq!(speed_at_mid.unwrap(), 1.75, epsilon = 1e-9);
    // Nebula's intensity is restored after the fade-in.
    assert_abs_diff_eq!(host.value(Parameter::Intensity).unwrap(), 0.6, epsilon = 1e-9);
}

#[test]
fn choreography_scene_boundaries() {
    let mut player = ChoreographyPlayer::new();
    let mut host = ParameterState::new();
    player.load_json(
        r#"{"scenes": [
            {"time_start": 0, "time_end": 1000},
            {"time_start": 1000, "time_end": 2500},
            {"time_start": 2500, "time_end": 4000}
        ]}"#,
    )
    .unwrap();
    player.seek(1500.0, 0.0, &mut host);
    assert_eq!(player.current_scene_index(), Some(1));
    player.seek(4000.0, 0.0, &mut host);
    assert_eq!(player.current_scene_index(), Some(2));
    player.seek(999.0, 0.0, &mut host);
    assert_eq!(player.current_scene_index(), Some(0));
    player.seek_to_percent(0.5, 0.0, &mut host);
    assert_eq!(player.current_scene_index(), Some(1));
}

#[test]
fn cancelled_transition_leaves_host_untouched() {
    let mut anim = TransitionAnimator::new();
    let mut host = ParameterState::new();
    host.update_parameter(Parameter::MorphFactor, 0.5);
    let id = anim.transition(
        TransitionSpec::new(ParameterSet::new().with(Parameter::MorphFactor, 2.0), 800.0),
        0.0,
        &host,
    );
    anim.cancel(id);
    assert!(!anim.tick(400.0, &mut host));
    assert_eq!(host.get_parameter(Parameter::MorphFactor), Some(0.5));
}

#[test]
fn timeline_export_survives_json() {
    let mut tl = ParameterTimeline::new(4000.0);
    tl.set_loop_mode(LoopMode::Bounce);
    tl.add_keyframe(Parameter::Rot4dXW, 0.0, -1.0, Easing::SineInOut);
    tl.add_keyframe(Parameter::Rot4dXW, 4000.0, 1.0, Easing::SineInOut);
    let json = tl.export_json().unwrap();
    assert!(json.contains("\"type\": \"vib3-parameter-timeline\""));
    assert!(json.contains("\"rot4dXW\""));

    let mut restored = ParameterTimeline::default();
    restored.import_json(&json).unwrap();
    assert_eq!(restored.loop_mode(), LoopMode::Bounce);
    assert_eq!(restored.value_at(Parameter::Rot4dXW, 2000.0), tl.value_at(Parameter::Rot4dXW, 2000.0));
}
