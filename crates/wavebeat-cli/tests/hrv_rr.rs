use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Deserialize)]
struct Hrv {
    n: usize,
    avnn: f64,
    rmssd: f64,
}

#[derive(Deserialize)]
struct Summary {
    mean_rr_s: f64,
    mean_hr_bpm: f64,
    instantaneous_hr_bpm: Vec<f64>,
    time_axis_s: Vec<f64>,
    hrv: Hrv,
}

#[test]
fn beat_indices_from_stdin() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("wavebeat");
    cmd.args(["hrv-rr", "--fs", "125"])
        .write_stdin("0\n100\n225\n");
    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&output)?;

    assert!((summary.mean_rr_s - 0.9).abs() < 1e-12);
    assert!((summary.mean_hr_bpm - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.instantaneous_hr_bpm.len(), 2);
    assert!((summary.instantaneous_hr_bpm[0] - 75.0).abs() < 1e-9);
    assert!((summary.instantaneous_hr_bpm[1] - 60.0).abs() < 1e-9);
    assert!((summary.time_axis_s[1] - 1.8).abs() < 1e-12);
    assert_eq!(summary.hrv.n, 2);
    assert!((summary.hrv.avnn - 0.9).abs() < 1e-12);
    assert!((summary.hrv.rmssd - 0.2).abs() < 1e-12);
    Ok(())
}

#[test]
fn beat_indices_from_file() -> Result<(), Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "# beats\n250\n0\n125")?;
    let mut cmd = cargo_bin_cmd!("wavebeat");
    cmd.args([
        "hrv-rr",
        "--fs",
        "125",
        "--input",
        file.path().to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&output)?;
    assert!((summary.mean_hr_bpm - 60.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn single_beat_is_rejected() {
    let mut cmd = cargo_bin_cmd!("wavebeat");
    cmd.args(["hrv-rr", "--fs", "125"]).write_stdin("42\n");
    let output = cmd.assert().failure().get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("insufficient beats"), "{stderr}");
}
