// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the whole capture-calibrate-evaluate workflow against the
//! simulated bench.

use std::path::Path;

use tempfile::TempDir;

use crate::{get_cmd_output, plight, write_rig};

/// Run a subcommand against the experiment "run" in `dir`, returning whether
/// it succeeded along with its stdout and stderr.
fn run_in(dir: &Path, args: &[&str]) -> (bool, String, String) {
    let rig = write_rig(dir);
    let data_dir = dir.join("data");
    #[rustfmt::skip]
    let cmd = plight()
        .args(args)
        .args([
            "--data-dir", &format!("{}", data_dir.display()),
            "--rig", &format!("{}", rig.display()),
            "--experiment", "run",
            "--simulate",
            "--no-progress-bars",
        ])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    (ok, stdout, stderr)
}

fn calibrate(dir: &Path) {
    for capture in ["mapping", "gamma", "contrast"] {
        let (ok, stdout, stderr) = run_in(dir, &["capture-calib", "-c", capture]);
        assert!(ok, "capture-calib {capture} failed:\n{stdout}\n{stderr}");
    }
    let (ok, stdout, stderr) = run_in(dir, &["calibrate"]);
    assert!(ok, "calibrate failed:\n{stdout}\n{stderr}");
    assert!(stdout.contains("Fitted 128 of 128 wavelengths"), "{stdout}");
    assert!(stdout.contains("Contrast ratio"), "{stdout}");
}

#[test]
fn test_capture_and_calibrate() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let experiment = tmp_dir.path().join("data").join("run");
    calibrate(tmp_dir.path());

    for file in ["mapping_data.json", "gamma_data.json", "contrast_data.json", "device.json"] {
        assert!(experiment.join(file).exists(), "{file} wasn't written");
    }
    let device: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(experiment.join("device.json")).unwrap())
            .unwrap();
    assert!(device["mapping"].is_object());
    assert!(device["gamma"].is_object());
}

#[test]
fn test_metrics_after_calibrating() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let experiment = tmp_dir.path().join("data").join("run");
    calibrate(tmp_dir.path());

    let (ok, stdout, stderr) = run_in(tmp_dir.path(), &["capture-metrics", "-m", "fwhm"]);
    assert!(ok, "capture-metrics failed:\n{stdout}\n{stderr}");
    assert!(experiment.join("fwhm_test.json").exists());
    let (ok, stdout, stderr) = run_in(tmp_dir.path(), &["evaluate-metrics", "-m", "fwhm"]);
    assert!(ok, "evaluate-metrics failed:\n{stdout}\n{stderr}");
    assert!(stdout.contains("Spectral resolution"), "{stdout}");
    assert!(experiment.join("fwhm_results.json").exists());

    let (ok, stdout, stderr) = run_in(tmp_dir.path(), &["capture-metrics", "-m", "profiles"]);
    assert!(ok, "capture-metrics failed:\n{stdout}\n{stderr}");
    let (ok, stdout, stderr) = run_in(tmp_dir.path(), &["evaluate-metrics", "-m", "Profiles"]);
    assert!(ok, "evaluate-metrics failed:\n{stdout}\n{stderr}");
    assert!(stdout.contains("ramp up"), "{stdout}");
    assert!(experiment.join("profiles_results.json").exists());
}

#[test]
fn test_scans_after_calibrating() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let experiment = tmp_dir.path().join("data").join("run");
    calibrate(tmp_dir.path());

    let (ok, stdout, stderr) = run_in(tmp_dir.path(), &["scan", "-b", "hadamard", "-w", "4"]);
    assert!(ok, "hadamard scan failed:\n{stdout}\n{stderr}");
    assert!(stdout.contains("4 bands between 505 and 620 nm"), "{stdout}");
    assert!(experiment.join("hadamard_4.json").exists());

    let (ok, stdout, stderr) = run_in(tmp_dir.path(), &["scan", "-b", "identity", "-w", "3"]);
    assert!(ok, "identity scan failed:\n{stdout}\n{stderr}");
    assert!(experiment.join("identity_3.json").exists());

    let (ok, _, stderr) = run_in(tmp_dir.path(), &["scan", "-b", "hadamard", "-w", "3"]);
    assert!(!ok);
    assert!(stderr.contains("power-of-two"), "{stderr}");
}

#[test]
fn test_metrics_need_a_calibration() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let (ok, _, stderr) = run_in(tmp_dir.path(), &["capture-metrics", "-m", "gamma"]);
    assert!(!ok);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("Run 'plight capture-calib'"), "{stderr}");
}

#[test]
fn test_bad_choice_lists_valid_ones() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let (ok, _, stderr) = run_in(tmp_dir.path(), &["capture-calib", "-c", "everything"]);
    assert!(!ok);
    assert!(stderr.contains("'everything'"), "{stderr}");
    assert!(stderr.contains("Valid choices are: gamma, mapping, contrast"), "{stderr}");
}

#[test]
fn test_hardware_is_unavailable() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let rig = write_rig(tmp_dir.path());
    #[rustfmt::skip]
    let cmd = plight()
        .args([
            "capture-calib",
            "-c", "mapping",
            "--data-dir", &format!("{}", tmp_dir.path().display()),
            "--rig", &format!("{}", rig.display()),
            "-e", "run",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--simulate"), "{stderr}");
}
