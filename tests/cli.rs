use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

fn fractal() -> Command {
    Command::cargo_bin("fractal").unwrap()
}

#[test]
fn renders_a_png() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("mandel.png");
    fractal()
        .args(&["-o", out.to_str().unwrap(), "--size", "64x32", "--iterations", "100"])
        .assert()
        .success();
    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 32));
}

#[test]
fn renders_a_direct_color_png() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("direct.png");
    fractal()
        .args(&["-o", out.to_str().unwrap(), "--size", "40x40", "--direct", "--palette", "gb"])
        .assert()
        .success();
    assert!(out.exists());
}

#[test]
fn renders_a_zooming_gif() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("zoom.gif");
    fractal()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "--mode",
            "gif",
            "--size",
            "32x24",
            "--frames",
            "6",
            "--zoom",
            "0.8",
            "--center",
            "-0.75,0.1",
            "--jobs",
            "3",
            "--iterations",
            "200",
        ])
        .assert()
        .success();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn sequential_and_parallel_gifs_are_identical() {
    let dir = tempdir().unwrap();
    let seq = dir.path().join("seq.gif");
    let par = dir.path().join("par.gif");
    let common = [
        "--mode",
        "gif",
        "--size",
        "24x24",
        "--frames",
        "5",
        "--orbit",
        "0.7885",
        "--plot",
        "3x3",
        "--palette",
        "bw",
    ];
    fractal()
        .args(&common)
        .args(&["-o", seq.to_str().unwrap(), "--sequential"])
        .assert()
        .success();
    fractal()
        .args(&common)
        .args(&["-o", par.to_str().unwrap(), "--jobs", "4"])
        .assert()
        .success();
    assert_eq!(std::fs::read(&seq).unwrap(), std::fs::read(&par).unwrap());
}

#[test]
fn progress_lines_are_logged() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("p.gif");
    fractal()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "--mode",
            "gif",
            "--size",
            "16x16",
            "--frames",
            "3",
            "--progress",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Rendered 3 of 3 frames"));
}

#[test]
fn empty_raster_is_a_render_failure() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("nothing.png");
    fractal()
        .args(&["-o", out.to_str().unwrap(), "--size", "0x10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
}

#[test]
fn unknown_palette_is_rejected() {
    fractal()
        .args(&["-o", "unused.png", "--palette", "rainbow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid palette"));
}

#[test]
fn missing_output_is_rejected() {
    fractal().assert().failure();
}
