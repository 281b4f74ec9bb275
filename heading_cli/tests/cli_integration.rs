use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Fast timings so a full approach+align cycle finishes in well under a second.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[robot]
base_address = "http://127.0.0.1:9/"

[navigator]
tick_ms = 10
align_ms = 100

[vision]
fps = 100
"#;
    let path = dir.path().join("heading.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_replay(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("replay.jsonl");
    fs::write(
        &path,
        "# one marker 1 cm ahead, a farther one, then an empty frame\n\
         {\"markers\":[{\"id\":4,\"distance_m\":0.01},{\"id\":9,\"distance_m\":0.5}]}\n\
         {\"markers\":[]}\n",
    )
    .unwrap();
    path
}

fn heading(cfg: &Path, settings: &Path) -> Command {
    let mut cmd = Command::cargo_bin("heading").unwrap();
    cmd.arg("--config")
        .arg(cfg)
        .arg("--settings")
        .arg(settings)
        .env_remove("RUST_LOG")
        .env_remove("HEADING_SIM_FAIL");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["duration", "--distance", "0.5"], 0, "1777 ms", "stdout")]
#[case(&["duration", "--distance", "-1"], 3, "cannot be driven", "stderr")]
#[case(&["send", "FORWARD", "--simulate"], 0, "OK FORWARD", "stdout")]
#[case(&["send", "jump", "--simulate"], 2, "unknown command", "stderr")]
#[case(&["send", "LEFT", "--left", "101", "--simulate"], 2, "101", "stderr")]
#[case(&["settings", "get", "bogus"], 1, "unknown setting", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");

    let assert = heading(&cfg, &settings).args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn simulated_run_completes_one_cycle() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");
    let replay = write_replay(&dir);

    heading(&cfg, &settings)
        .args(["run", "--simulate", "--loop", "--cycles", "1", "--replay"])
        .arg(&replay)
        .assert()
        .success()
        .stdout(predicate::str::contains("detecting -> approaching"))
        .stdout(predicate::str::contains("approaching -> aligning"))
        .stdout(predicate::str::contains("cycle 1 complete"))
        .stdout(predicate::str::contains("cycles_reached"));
}

#[test]
fn json_run_summary_is_machine_readable() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");
    let replay = write_replay(&dir);

    let out = heading(&cfg, &settings)
        .args(["--json", "run", "--simulate", "--loop", "--cycles", "1", "--replay"])
        .arg(&replay)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let line = stdout.lines().last().expect("summary line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["end"], "cycles_reached");
    assert_eq!(v["cycles"], 1);
    // FORWARD, STOP, LEFT, STOP at minimum
    assert!(v["commands"].as_u64().unwrap() >= 4);
    assert_eq!(v["dispatch_failures"], 0);
}

#[test]
fn settings_round_trip_through_the_file() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");

    heading(&cfg, &settings)
        .args(["settings", "set", "movePowerLeft", "60"])
        .assert()
        .success();
    assert!(settings.exists());

    heading(&cfg, &settings)
        .args(["settings", "get", "movePowerLeft"])
        .assert()
        .success()
        .stdout(predicate::str::contains("60"));

    heading(&cfg, &settings)
        .args(["settings", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wheelDiameterMm = 43 "))
        .stdout(predicate::str::contains("(read-only)"))
        .stdout(predicate::str::contains("movePowerLeft = 60"));

    // The forward command picks the new power up.
    heading(&cfg, &settings)
        .args(["--json", "send", "forward", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""left":60"#));
}

#[test]
fn read_only_setting_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");

    heading(&cfg, &settings)
        .args(["settings", "set", "wheelDiameterMm", "50"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("read-only"));
    assert!(!settings.exists());
}

#[test]
fn simulated_transport_failure_exits_4() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");

    heading(&cfg, &settings)
        .env("HEADING_SIM_FAIL", "FORWARD")
        .args(["--json", "send", "FORWARD", "--simulate"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(r#""reason":"Transport""#));
}

#[test]
fn zero_rpm_setting_faults_the_run() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "[settings]\nwheelRpm = 0\n").unwrap();
    let replay = write_replay(&dir);

    heading(&cfg, &settings)
        .args(["run", "--simulate", "--loop", "--replay"])
        .arg(&replay)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("-> fault"))
        .stderr(predicate::str::contains("wheelRpm"));
}

#[rstest]
#[case("[robot]\nbase_address = \"ftp://robot/\"\n", "http or https")]
#[case("[robot]\nbase_address = \"http://robot/\"\n[navigator]\ntick_ms = 0\n", "tick_ms")]
#[case("[drive]\nwheel_rpm = 125\n", "could not be loaded")]
fn bad_config_exits_1(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();
    let settings = dir.path().join("settings.toml");

    heading(&cfg, &settings)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn bad_settings_file_is_rejected_whole() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "[settings]\nmovePowerLeft = 50\nmovePowerRight = 250\n").unwrap();

    heading(&cfg, &settings)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("movePowerRight"));
}
