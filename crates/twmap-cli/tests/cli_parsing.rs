//! CLI tests for the twmap command
//!
//! Argument parsing plus end-to-end runs against a scratch database. Every
//! test runs with HOME and the working directory pointed at a temp dir so no
//! real configuration is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the twmap binary, isolated in `dir`
#[allow(deprecated)]
fn twmap(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("twmap").expect("Failed to find twmap binary");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("TWMAP_DATABASE")
        .env_remove("TWMAP_CONFIG");
    cmd
}

/// Write a captured session (CR LF lines) and return its path.
fn write_log(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push_str("\r\n");
    }
    let path = dir.join("session.log");
    std::fs::write(&path, content).expect("Failed to write log");
    path
}

fn small_map(dir: &Path) {
    let log = write_log(
        dir,
        &[
            "\x1b[1;33mSector 11 has warps to sector(s) : 12\x1b[0m",
            "Sector 12 has warps to sector(s) : 11 - 13",
            "  The StarDock is located in sector 13.",
            "  12 - 1500 100%   2000  90% - 3000  45%",
        ],
    );
    twmap(dir).arg("parse").arg(&log).assert().success();
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_shows_all_commands() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("pairs"))
        .stdout(predicate::str::contains("traverse"))
        .stdout(predicate::str::contains("settings"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("twmap"));
}

#[test]
fn test_global_options_in_help() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--database"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--quiet"));
}

#[test]
fn test_invalid_subcommand() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .arg("explore")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_path_requires_start() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path()).arg("path").assert().failure();
}

#[test]
fn test_path_rejects_bad_port_type() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["path", "1", "--port-type", "XYZ"])
        .assert()
        .failure();
}

// ============================================================================
// Parse Command Tests
// ============================================================================

#[test]
fn test_parse_reports_map_statistics() {
    let dir = TempDir::new().unwrap();
    let log = write_log(
        dir.path(),
        &[
            "Sector 1 has warps to sector(s) : 2 - 3",
            "Sector 2 has warps to sector(s) : 1",
        ],
    );

    twmap(dir.path())
        .arg("parse")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Parsed 2 lines"))
        .stdout(predicate::str::contains("Warps:    3"))
        .stdout(predicate::str::contains("Explored: 2"));

    assert!(dir.path().join("tw2002.db").exists());
}

#[test]
fn test_parse_reads_stdin() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["parse", "--json"])
        .write_stdin("Sector 7 has warps to sector(s) : 8\r\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"warps\": 1"));
}

#[test]
fn test_parse_dry_run_leaves_no_database() {
    let dir = TempDir::new().unwrap();
    let log = write_log(dir.path(), &["Sector 1 has warps to sector(s) : 2"]);

    twmap(dir.path())
        .args(["parse", "--dry-run"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("record_warps"));

    assert!(!dir.path().join("tw2002.db").exists());
}

#[test]
fn test_parse_replies_use_configured_login() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("login.toml");
    std::fs::write(&config, "[session.login]\nname = \"pilot\"\n").unwrap();
    let log = dir.path().join("login.log");
    std::fs::write(&log, "Welcome!\r\nPlease enter your name (ENTER for none):").unwrap();

    twmap(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["parse", "--dry-run", "--replies"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("login: pilot"));
}

#[test]
fn test_auto_haggle_flag_enables_counter_offers() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("trade.log");
    std::fs::write(
        &log,
        "How many holds of Equipment do you want to sell [30]?\r\nYour offer [1,000] ?",
    )
    .unwrap();

    twmap(dir.path())
        .args(["parse", "--dry-run", "--replies"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("haggle:").not());

    twmap(dir.path())
        .args(["--auto-haggle", "parse", "--dry-run", "--replies"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("haggle: 1070"));
}

#[test]
fn test_auto_haggle_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["--auto-haggle", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auto_haggle = true"));

    twmap(dir.path())
        .args(["--auto-haggle", "--no-auto-haggle", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auto_haggle = false"));
}

#[test]
fn test_parse_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["parse", "no-such.log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such.log"));
}

// ============================================================================
// Route Planning Tests
// ============================================================================

#[test]
fn test_path_prints_route_with_hops() {
    let dir = TempDir::new().unwrap();
    small_map(dir.path());

    twmap(dir.path())
        .args(["path", "11", "13"])
        .assert()
        .success()
        .stdout(predicate::str::contains("11 > 12 > 13\t(2 hops)"));
}

#[test]
fn test_path_unreachable() {
    let dir = TempDir::new().unwrap();
    small_map(dir.path());

    twmap(dir.path())
        .args(["path", "13", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No route found."));
}

#[test]
fn test_path_to_stardock_via_fedspace() {
    let dir = TempDir::new().unwrap();
    small_map(dir.path());

    // federation space is out of reach, the StarDock is not
    twmap(dir.path())
        .args(["path", "11", "--fedspace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("11 > 12 > 13\t(2 hops)"));
}

#[test]
fn test_probe_prints_script() {
    let dir = TempDir::new().unwrap();
    small_map(dir.path());

    twmap(dir.path())
        .args(["probe", "11", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended route:"))
        .stdout(predicate::str::contains("QQQQQQQQQNC"))
        .stdout(predicate::str::contains("F11"));
}

#[test]
fn test_probe_without_start_fails() {
    let dir = TempDir::new().unwrap();
    small_map(dir.path());

    twmap(dir.path())
        .arg("probe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No launch sectors"));
}

#[test]
fn test_pairs_with_no_ports_prints_nothing() {
    let dir = TempDir::new().unwrap();
    small_map(dir.path());

    twmap(dir.path())
        .args(["pairs", "--port-type", "SBS-BSB"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_traverse_uses_stored_game_size() {
    let dir = TempDir::new().unwrap();
    let log = write_log(
        dir.path(),
        &["     Maximum players 20, sectors 3, ports 2, planets 1."],
    );
    twmap(dir.path()).arg("parse").arg(&log).assert().success();

    twmap(dir.path())
        .args(["traverse", "--count"])
        .assert()
        .success()
        .stdout("6\n");

    twmap(dir.path())
        .args(["traverse", "-m", "2"])
        .assert()
        .success()
        .stdout("F1\n2\nF2\n1\nF1\n2\n");
}

// ============================================================================
// Settings and Config Tests
// ============================================================================

#[test]
fn test_settings_round_trip() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["settings", "set", "stardock", "42"])
        .assert()
        .success();

    twmap(dir.path())
        .args(["settings", "get", "stardock"])
        .assert()
        .success()
        .stdout("42\n");

    twmap(dir.path())
        .args(["settings", "set", "stardock", "dock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sector number"));
}

#[test]
fn test_database_flag_selects_file() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["-d", "other.db", "settings", "set", "max_sector", "5000"])
        .assert()
        .success();

    assert!(dir.path().join("other.db").exists());
    assert!(!dir.path().join("tw2002.db").exists());
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    twmap(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".twmap"));

    assert!(dir.path().join(".twmap").join("config.toml").exists());

    twmap(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[storage]"))
        .stdout(predicate::str::contains("auto_haggle = false"));
}

#[test]
fn test_bad_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[session\n").unwrap();

    twmap(dir.path())
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.toml"));
}
