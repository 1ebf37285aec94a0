// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod generate_codes;
mod simulated_rig;

use std::{
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use indoc::indoc;

fn plight() -> Command {
    Command::cargo_bin("plight").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// An 8x64 SLM on a small simulated bench; 128 wavelengths between 500 and
/// 627 nm land on columns 6 + 0.4 (l - 500).
const RIG_TOML: &str = indoc! {r#"
    [display]
    height = 8
    width = 64
    settle_ms = 0

    [spectrometer]
    lambda_limits = [505.0, 620.0]

    [camera]
    backend = "simulated"
    ndrops = 0

    [bench]
    wavelength_range = [500.0, 627.0]
    num_samples = 128
    dispersion = [6.0, 0.4]
    gamma = 2.0
    leakage = 0.01
    dark = 10.0
    source_peak = 100.0
    source_centre = 560.0
    source_width = 80.0
    camera_height = 4
    camera_width = 8
"#};

/// Write the rig file into `dir`.
fn write_rig(dir: &Path) -> PathBuf {
    let path = dir.join("rig.toml");
    std::fs::write(&path, RIG_TOML).unwrap();
    path
}
