//! CLI command integration tests.
//! Each test points VIB3_DATA_DIR at a temp directory for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vib3_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vib3").unwrap();
    cmd.env("VIB3_DATA_DIR", data_dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

const RAMP_TIMELINE: &str = r#"{
  "type": "vib3-parameter-timeline",
  "version": "1.0",
  "duration": 1000,
  "tracks": {
    "chaos": {
      "keyframes": [
        {"time": 0, "value": 0, "easing": "linear"},
        {"time": 1000, "value": 1, "easing": "linear"}
      ]
    }
  }
}"#;

const TWO_SCENES: &str = r#"{
  "name": "two scenes",
  "scenes": [
    {"time_start": 0, "time_end": 1000, "system": "faceted", "geometry": 3},
    {"time_start": 1000, "time_end": 2000, "system": "quantum", "color_preset": "Nebula"}
  ]
}"#;

#[test]
fn geometry_list_names_all_indices() {
    let dir = TempDir::new().unwrap();
    let output = vib3_cmd(&dir).args(["geometry", "list"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 24);
    assert!(stdout.contains(" 0  Tetrahedron"));
    assert!(stdout.contains("11  Hypersphere Torus"));
    assert!(stdout.contains("23  Hypertetrahedron Crystal"));
}

#[test]
fn geometry_decode_and_encode() {
    let dir = TempDir::new().unwrap();
    vib3_cmd(&dir)
        .args(["geometry", "decode", "13"])
        .assert()
        .success()
        .stdout(predicate::str::contains("core:  Hypersphere (1)"))
        .stdout(predicate::str::contains("base:  Fractal (5)"));

    vib3_cmd(&dir)
        .args(["geometry", "encode", "2", "7"])
        .assert()
        .success()
        .stdout("23\n");
}

#[test]
fn geometry_out_of_range_fails() {
    let dir = TempDir::new().unwrap();
    vib3_cmd(&dir)
        .args(["geometry", "decode", "24"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    vib3_cmd(&dir)
        .args(["geometry", "encode", "3", "0"])
        .assert()
        .failure();
}

#[test]
fn geometry_points_tesseract() {
    let dir = TempDir::new().unwrap();
    let output = vib3_cmd(&dir)
        .args(["geometry", "points", "1", "--resolution", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // 32 edges, two samples each
    assert_eq!(stdout.lines().count(), 64);
    for line in stdout.lines() {
        let coords: Vec<f64> = line.split(' ').map(|c| c.parse().unwrap()).collect();
        assert_eq!(coords.len(), 3);
        assert!(coords.iter().all(|c| c.is_finite()));
    }
}

#[test]
fn geometry_points_with_rotation() {
    let dir = TempDir::new().unwrap();
    vib3_cmd(&dir)
        .args([
            "geometry",
            "points",
            "9",
            "--resolution",
            "4",
            "--projection",
            "stereographic",
            "--rotate",
            "0.1,0.2,-0.3,0.4,0.5,0.6",
        ])
        .assert()
        .success();
}

#[test]
fn timeline_sample_prints_json_lines() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("ramp.json");
    std::fs::write(&file, RAMP_TIMELINE).unwrap();

    let output = vib3_cmd(&dir)
        .args(["timeline", "sample", "--step", "500"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    let mid: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(mid["time"], 500.0);
    assert_eq!(mid["values"]["chaos"], 0.5);
}

#[test]
fn timeline_play_reaches_final_keyframe() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("ramp.json");
    std::fs::write(&file, RAMP_TIMELINE).unwrap();

    vib3_cmd(&dir)
        .args(["timeline", "play", "--fps", "50"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("frames: 50"))
        .stdout(predicate::str::contains("\"chaos\": 1.0"));
}

#[test]
fn timeline_from_library_by_name() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("timelines")).unwrap();
    std::fs::write(dir.path().join("timelines/ramp.json"), RAMP_TIMELINE).unwrap();

    vib3_cmd(&dir)
        .args(["timeline", "sample", "ramp", "--step", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"chaos\":1.0"));
}

#[test]
fn timeline_wrong_type_tag_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.json");
    std::fs::write(&file, RAMP_TIMELINE.replace("vib3-parameter-timeline", "something-else"))
        .unwrap();

    vib3_cmd(&dir)
        .args(["timeline", "sample"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timeline"));
}

#[test]
fn choreo_play_switches_scenes() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("show.json");
    std::fs::write(&file, TWO_SCENES).unwrap();

    vib3_cmd(&dir)
        .args(["choreo", "play", "--fps", "100"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("scene 0 (0-1000ms)"))
        .stdout(predicate::str::contains("scene 1 (1000-2000ms)"))
        .stdout(predicate::str::contains("complete"))
        .stdout(predicate::str::contains("system: quantum"))
        .stdout(predicate::str::contains("\"hue\": 285.0"));
}

#[test]
fn choreo_without_scenes_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("empty.json");
    std::fs::write(&file, r#"{"scenes": []}"#).unwrap();

    vib3_cmd(&dir)
        .args(["choreo", "play"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid choreography"));
}

#[test]
fn preset_list_and_filter() {
    let dir = TempDir::new().unwrap();
    let output = vib3_cmd(&dir).args(["preset", "list"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ocean Deep\tNatural"));
    assert!(stdout.lines().count() >= 24);

    vib3_cmd(&dir)
        .args(["preset", "list", "--category", "natural"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forest Canopy"))
        .stdout(predicate::str::contains("Nebula").not());
}

#[test]
fn preset_show_unknown_fails() {
    let dir = TempDir::new().unwrap();
    vib3_cmd(&dir)
        .args(["preset", "show", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset"));
}

#[test]
fn preset_export_to_library() {
    let dir = TempDir::new().unwrap();
    vib3_cmd(&dir)
        .args(["preset", "export", "Ocean Deep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exported Ocean Deep"));

    let saved = std::fs::read_to_string(dir.path().join("presets/Ocean_Deep.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(doc["type"], "vib3-color-preset");
    assert_eq!(doc["preset"]["hue"], 200.0);
}

#[test]
fn preset_import_then_show() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mine.json");
    std::fs::write(
        &file,
        r#"{"type":"vib3-color-preset","version":"1.0","name":"Mine",
            "preset":{"hue":42,"saturation":0.5,"intensity":0.5}}"#,
    )
    .unwrap();

    vib3_cmd(&dir)
        .args(["preset", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported Mine"));

    vib3_cmd(&dir)
        .args(["preset", "show", "Mine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hue\": 42.0"));
}

#[test]
fn preset_import_refuses_builtin_name() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("shadow.json");
    std::fs::write(
        &file,
        r#"{"type":"vib3-color-preset","version":"1.0","name":"Nebula",
            "preset":{"hue":1,"saturation":0.5,"intensity":0.5}}"#,
    )
    .unwrap();

    vib3_cmd(&dir)
        .args(["preset", "import"])
        .arg(&file)
        .assert()
        .failure();
    assert!(!dir.path().join("presets/Nebula.json").exists());
}

#[test]
fn describe_maps_words() {
    let dir = TempDir::new().unwrap();
    let output = vib3_cmd(&dir)
        .args(["describe", "calm", "blue", "sphere"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["parameters"]["hue"], 220.0);
    assert_eq!(result["parameters"]["speed"], 0.5);
    assert!(
        result["matched"]
            .as_array()
            .unwrap()
            .iter()
            .any(|w| w == "sphere")
    );
}

#[test]
fn config_file_sets_resolution() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "resolution = 3\n").unwrap();

    let output = vib3_cmd(&dir)
        .args(["geometry", "points", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 32 * 3);
}
