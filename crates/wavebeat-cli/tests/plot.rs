use assert_cmd::cargo::cargo_bin_cmd;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn plot_requires_a_readable_recording() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("wavebeat");
    cmd.args([
        "plot",
        "--input",
        dir.path().join("missing.txt").to_str().unwrap(),
        "--out",
        dir.path().join("out.png").to_str().unwrap(),
    ]);
    cmd.assert().failure();
    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn plot_validates_settings_before_rendering() {
    let dir = tempdir().unwrap();
    let recording = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test_data/synthetic_recording.txt");
    let out = dir.path().join("panels.png");
    let mut cmd = cargo_bin_cmd!("wavebeat");
    cmd.args([
        "plot",
        "--input",
        recording.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--window",
        "4",
    ]);
    cmd.assert().failure();
    assert!(!out.exists());
}
