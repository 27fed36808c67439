//! Writing outputs through the library entry points and the binary.

use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../tests/fixtures")
        .join(name)
}

/// Copy the API fixture into `dir` next to a config with `toml` contents.
fn scratch_config(dir: &Path, toml: &str) -> PathBuf {
    std::fs::copy(fixture("lvgl_api.json"), dir.join("lvgl_api.json")).unwrap();
    let cfg = dir.join("lvgl-json-gen.toml");
    std::fs::write(&cfg, toml).unwrap();
    cfg
}

#[test]
fn run_writes_source_and_header_next_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = scratch_config(
        dir.path(),
        r#"
        [input]
        api = "lvgl_api.json"

        [output]
        file = "ui.c"
        header = "ui.h"
        "#,
    );

    let written = lvgl_json_gen::run(&cfg, None).expect("run");
    assert_eq!(written, dir.path().join("ui.c"));

    let source = std::fs::read_to_string(dir.path().join("ui.c")).unwrap();
    assert!(source.contains("#include \"ui.h\""));
    let header = std::fs::read_to_string(dir.path().join("ui.h")).unwrap();
    assert!(header.contains("#ifndef UI_H"));
}

#[test]
fn output_override_wins_over_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = scratch_config(dir.path(), "[input]\napi = \"lvgl_api.json\"\n");
    let out = dir.path().join("elsewhere.c");

    let written = lvgl_json_gen::run(&cfg, Some(&out)).expect("run");
    assert_eq!(written, out);
    assert!(out.exists());
    assert!(!dir.path().join("lvgl_json_gen.c").exists());
}

#[test]
fn missing_api_description_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("lvgl-json-gen.toml");
    std::fs::write(&cfg, "[input]\napi = \"nope.json\"\n").unwrap();

    let err = lvgl_json_gen::run(&cfg, None).unwrap_err();
    assert!(
        format!("{err:#}").contains("could not load API description"),
        "unexpected error: {err:#}"
    );
    assert!(!dir.path().join("lvgl_json_gen.c").exists());
}

#[test]
fn malformed_api_description_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lvgl_api.json"), "[1, 2, 3]").unwrap();
    let cfg = dir.path().join("lvgl-json-gen.toml");
    std::fs::write(&cfg, "[input]\napi = \"lvgl_api.json\"\n").unwrap();

    assert!(lvgl_json_gen::generate(&cfg).is_err());
}

#[test]
fn config_without_api_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("lvgl-json-gen.toml");
    std::fs::write(&cfg, "[registry]\ncapacity = 8\n").unwrap();

    let err = lvgl_json_gen::generate(&cfg).unwrap_err();
    assert!(format!("{err:#}").contains("no API description configured"));
}

#[test]
fn zero_capacity_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = scratch_config(
        dir.path(),
        "[input]\napi = \"lvgl_api.json\"\n\n[registry]\ncapacity = 0\n",
    );
    assert!(lvgl_json_gen::generate(&cfg).is_err());
}

#[test]
fn binary_runs_without_a_config() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen.c");

    let status = Command::new(env!("CARGO_BIN_EXE_lvgl-json-gen"))
        .arg("--api")
        .arg(fixture("lvgl_api.json"))
        .arg("--output")
        .arg(&out)
        .args(["--registry", "hash-map"])
        .status()
        .expect("spawn lvgl-json-gen");
    assert!(status.success());

    let source = std::fs::read_to_string(&out).unwrap();
    assert!(source.contains("#define LVGL_JSON_REGISTRY_BUCKETS 256"));
}

#[test]
fn binary_overrides_config_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = scratch_config(dir.path(), "[input]\napi = \"lvgl_api.json\"\n");

    let status = Command::new(env!("CARGO_BIN_EXE_lvgl-json-gen"))
        .arg(&cfg)
        .args(["--capacity", "3"])
        .status()
        .expect("spawn lvgl-json-gen");
    assert!(status.success());

    let source = std::fs::read_to_string(dir.path().join("lvgl_json_gen.c")).unwrap();
    assert!(source.contains("#define LVGL_JSON_REGISTRY_CAPACITY 3"));
}

#[test]
fn binary_fails_without_api() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_lvgl-json-gen"))
        .current_dir(dir.path())
        .output()
        .expect("spawn lvgl-json-gen");
    assert!(!output.status.success());
}
