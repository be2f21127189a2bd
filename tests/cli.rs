// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use mandelzoom::{render_single, RenderConfig};
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn writes_the_first_frame_as_ppm() -> TestResult {
    let dir = tempdir()?;
    let out = dir.path().join("zoom.ppm");
    Command::cargo_bin("zoom")?
        .arg("-o")
        .arg(&out)
        .args(&["-s", "32x24"])
        .assert()
        .success();

    let bytes = fs::read(&out)?;
    assert!(bytes.starts_with(b"P6"));
    let expected = render_single(&RenderConfig {
        width: 32,
        height: 24,
        ..RenderConfig::default()
    })
    .unwrap();
    assert!(bytes.len() > expected.len());
    assert_eq!(&bytes[bytes.len() - expected.len()..], &expected[..]);
    Ok(())
}

#[test]
fn writes_numbered_frames_into_a_directory() -> TestResult {
    let dir = tempdir()?;
    let out = dir.path().join("frames");
    Command::cargo_bin("zoom")?
        .arg("-o")
        .arg(&out)
        .args(&["-s", "16x16", "-f", "3", "-b", "1", "--interior", "cardioid"])
        .assert()
        .success();

    for frame in 0..3 {
        assert!(out.join(format!("frame-{:05}.ppm", frame)).is_file());
    }
    assert!(!out.join("frame-00003.ppm").exists());
    Ok(())
}

#[test]
fn rejects_a_zero_band_count() -> TestResult {
    let dir = tempdir()?;
    Command::cargo_bin("zoom")?
        .arg("-o")
        .arg(dir.path().join("never.ppm"))
        .args(&["-b", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Band count must be between"));
    Ok(())
}

#[test]
fn rejects_more_bands_than_rows() -> TestResult {
    let dir = tempdir()?;
    Command::cargo_bin("zoom")?
        .arg("-o")
        .arg(dir.path().join("never.ppm"))
        .args(&["-s", "4x1", "-b", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
    Ok(())
}
