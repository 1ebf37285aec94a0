// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{get_cmd_output, plight};

#[test]
fn test_binary_codes_summary() {
    #[rustfmt::skip]
    let cmd = plight()
        .args([
            "generate-codes",
            "--height", "4",
            "--width", "100",
        ])
        .ok();
    assert!(cmd.is_ok(), "generate-codes failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stdout.contains("7 binary codes for a 4x100 display"), "{stdout}");
    assert!(stdout.contains("Every pixel decodes back to its own column"), "{stdout}");
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_hadamard_codes_to_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("codes.json");

    #[rustfmt::skip]
    let cmd = plight()
        .args([
            "generate-codes",
            "--height", "16",
            "--width", "4",
            "--rows",
            "--hadamard",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "generate-codes failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Using rows [1, 2, 3, 4] of the order-16 Hadamard basis"), "{stdout}");
    assert!(stdout.contains("4 hadamard codes"), "{stdout}");

    let planes: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(planes["dim"], serde_json::json!([16, 4, 4]));
}

#[test]
fn test_zero_sized_display_fails() {
    #[rustfmt::skip]
    let cmd = plight()
        .args([
            "generate-codes",
            "--height", "0",
            "--width", "100",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
}

#[test]
fn test_checkerboard() {
    #[rustfmt::skip]
    let cmd = plight()
        .args([
            "generate-codes",
            "--height", "4",
            "--width", "6",
            "--checkerboard", "2",
        ])
        .ok();
    assert!(cmd.is_ok(), "generate-codes failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("Checkerboard of 2-pixel squares for a 4x6 display (12 pixels lit)"),
        "{stdout}"
    );
}
