use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[control]
dilute_period_s = 1
use_aux_pulse = false

[runtime]
startup_delay_s = 0
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Every data log line (file and stdout echo) carries time, OD, Z and U.
#[rstest]
fn data_log_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("turbidostat_cli").unwrap();
    cmd.current_dir(dir.path())
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["--cycles", "2"])
        .env("TURBIDOSTAT_SIM_OD", "0.3");

    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&out);
    let echoed: Vec<&str> = stdout.lines().filter(|l| l.starts_with('{')).collect();
    assert_eq!(echoed.len(), 2, "stdout was: {stdout}");

    let file = fs::read_to_string(dir.path().join("log.dat")).unwrap();
    let lines: Vec<&str> = file.lines().collect();
    assert_eq!(lines, echoed);

    for line in lines {
        let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON line");
        let obj = v.as_object().expect("object");
        assert_eq!(obj.len(), 4, "unexpected keys in {line}");
        assert!(v["time"].is_i64());
        assert!(v["OD"].is_number());
        let z = v["Z"].as_f64().unwrap();
        assert!((0.0..=255.0).contains(&z));
        let u = v["U"].as_u64().unwrap();
        assert!(u <= 255);
    }
}

/// With --json, failures are reported as one JSON object on stderr.
#[rstest]
fn json_error_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("turbidostat_cli").unwrap();
    cmd.current_dir(dir.path())
        .arg("--json")
        .arg("--log-level")
        .arg("off")
        .arg("--config")
        .arg(&cfg)
        .arg("--test")
        .env("TURBIDOSTAT_SIM_TIMEOUT", "1");

    let out = cmd.assert().code(1).get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&out);
    let line = stderr
        .lines()
        .find(|l| l.contains("\"reason\""))
        .unwrap_or("")
        .to_string();
    assert!(!line.is_empty(), "no JSON error line; stderr was: {stderr}");

    let v: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(v["reason"], "Timeout");
    assert_eq!(v["exit_code"], 1);
    assert!(v["message"].as_str().unwrap().contains("did not answer"));
}
