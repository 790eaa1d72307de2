use assert_cmd::{Command, cargo::cargo_bin_cmd};
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::tempdir;

fn tryon_cli() -> Command {
    cargo_bin_cmd!("tryon-cli")
}

#[test]
fn help_lists_modes() {
    tryon_cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--webcam"))
        .stdout(predicate::str::contains("--earring"))
        .stdout(predicate::str::contains("--necklace"));
}

#[test]
fn input_or_webcam_is_required() {
    tryon_cli()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}

#[test]
fn input_and_webcam_conflict() {
    tryon_cli()
        .args(["--input", "faces", "--webcam"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn empty_directory_reports_no_images() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("faces");
    std::fs::create_dir_all(&input).unwrap();

    tryon_cli()
        .current_dir(dir.path())
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no images found"));
}

#[test]
fn missing_model_is_reported() {
    let dir = tempdir().expect("tempdir");
    let image_path = dir.path().join("face.png");
    RgbImage::from_pixel(32, 32, Rgb([200, 170, 150]))
        .save(&image_path)
        .expect("save image");

    tryon_cli()
        .current_dir(dir.path())
        .arg("--input")
        .arg(&image_path)
        .args(["--model", "models/missing.onnx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("face-mesh model not found"));
}
