use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;
use tempfile::tempdir;

/// Binary with small procedural budgets so the solar system builds quickly.
fn diorama() -> Command {
    let mut cmd = Command::cargo_bin("diorama").expect("binary exists");
    cmd.env("DIORAMA_SOLAR__STAR_COUNT", "200")
        .env("DIORAMA_SOLAR__ASTEROID_COUNT", "100")
        .env("DIORAMA_SOLAR__SUN_PARTICLE_COUNT", "100")
        .env("DIORAMA_SOLAR__NEBULA_TEXTURE_SIZE", "64");
    cmd
}

#[test]
fn solar_summary_lists_every_body() {
    let mut cmd = diorama();
    cmd.args(["solar", "--summary-only", "--seed", "7"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene 'solar' with "))
        .stdout(contains("(17 pickable)"))
        .stdout(contains(" - Sun visible=true clicks=0 pos=(0.00, 0.00, 0.00)"))
        .stdout(contains(" - Titan visible=true"))
        .stdout(contains("Status: speed 1.0x"));
}

#[test]
fn third_click_explodes_a_planet() {
    let mut cmd = diorama();
    cmd.args([
        "--summary-only",
        "--seed",
        "7",
        "--click",
        "Mars",
        "--click",
        "mars",
        "--click",
        "Mars",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("Info: EXPLOSION!: Mars has exploded!"))
        .stdout(contains(" - Mars visible=false"));
}

#[test]
fn speed_keys_adjust_simulation() {
    let mut cmd = diorama();
    cmd.args(["--summary-only", "--key", "Plus", "--key", "+", "--frames", "5"]);
    cmd.assert()
        .success()
        .stdout(contains("Status: speed 1.2x"));
}

#[test]
fn house_door_opens_after_click() {
    let mut cmd = diorama();
    cmd.args(["house", "--summary-only", "--click", "Front door", "--frames", "90"]);
    cmd.assert()
        .success()
        .stdout(contains("(4 pickable)"))
        .stdout(contains(" - Front door: open angle=-90.0"))
        .stdout(contains(" - Back door: closed angle=0.0"))
        .stdout(contains("Info: Front door: opening"));
}

#[test]
fn unknown_pickable_is_reported() {
    let mut cmd = diorama();
    cmd.args(["house", "--summary-only", "--click", "Garage"]);
    cmd.assert()
        .success()
        .stdout(contains("No visible object named 'Garage'"));
}

#[test]
fn exports_painted_textures() {
    let dir = tempdir().expect("temp dir");
    let mut cmd = diorama();
    cmd.arg("house")
        .arg("--summary-only")
        .arg("--export-textures")
        .arg(dir.path());
    cmd.assert()
        .success()
        .stdout(contains("Exported 1 textures"));
    assert!(dir.path().join("bricks.png").is_file());
}

#[test]
fn rejects_unknown_arguments() {
    let mut cmd = diorama();
    cmd.args(["solar", "--warp-drive"]);
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --warp-drive"));
}

#[test]
fn rejects_unknown_scene() {
    let mut cmd = diorama();
    cmd.args(["moonbase", "--summary-only"]);
    cmd.assert()
        .failure()
        .stderr(contains("unknown scene 'moonbase'"));
}

#[test]
fn config_directory_caps_speed() {
    let dir = tempdir().expect("temp dir");
    std::fs::write(dir.path().join("default.toml"), "[solar]\nmax_speed = 1.0\n")
        .expect("write config");
    let mut cmd = diorama();
    cmd.arg("--summary-only")
        .arg("--config")
        .arg(dir.path())
        .args(["--key", "Plus"]);
    cmd.assert()
        .success()
        .stdout(contains("Status: speed 1.0x"));
}

#[test]
fn rejects_non_finite_speed() {
    let mut cmd = diorama();
    cmd.args(["--summary-only", "--speed", "NaN"]);
    cmd.assert()
        .failure()
        .stderr(contains("--speed expects a finite number"));
}
