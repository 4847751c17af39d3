//! CLI end-to-end tests
//!
//! Tests for the playwire command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the playwire binary
#[allow(deprecated)]
fn playwire_cmd() -> Command {
    Command::cargo_bin("playwire").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = playwire_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = playwire_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("playwire"));
}

#[test]
fn test_cli_check_tools_lists_backends() {
    let mut cmd = playwire_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("mplayer"))
        .stdout(predicate::str::contains("mpv"));
}

#[test]
fn test_cli_args_mpv_dvd_title_is_zero_based() {
    let mut cmd = playwire_cmd();
    cmd.args(["args", "--backend", "mpv", "dvd://3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--term-status-msg="))
        .stdout(predicate::str::ends_with("--\ndvd://2\n"));
}

#[test]
fn test_cli_args_mplayer_uses_identify() {
    let mut cmd = playwire_cmd();
    cmd.args(["args", "--backend", "mplayer", "--volume", "40", "/media/a.mkv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-identify"))
        .stdout(predicate::str::contains("/media/a.mkv"));
}

#[test]
fn test_cli_args_unknown_backend_fails() {
    let mut cmd = playwire_cmd();
    cmd.args(["args", "--backend", "vlc", "/media/a.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown backend"));
}

#[test]
fn test_cli_validate_default_config() {
    let mut cmd = playwire_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Backend: mpv"));
}

#[test]
fn test_cli_validate_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("playwire.json");
    fs::write(
        &path,
        r#"{"player": {"backend": "mplayer", "osd_level": 9}}"#,
    )
    .unwrap();

    let mut cmd = playwire_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Backend: mplayer"))
        .stdout(predicate::str::contains("osd_level 9 is out of range"));
}

#[test]
fn test_cli_validate_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{not json").unwrap();

    let mut cmd = playwire_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}

#[test]
fn test_cli_play_missing_player_fails() {
    let mut cmd = playwire_cmd();
    cmd.args([
        "play",
        "--player",
        "/nonexistent/player-xyz",
        "/media/a.mkv",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to start"));
}

#[cfg(unix)]
#[test]
fn test_cli_play_prints_notifications() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let script = dir.path().join("fake-mpv");
    fs::write(
        &script,
        "#!/bin/sh\n\
         echo 'STATUS: 1.000000 / 5.000000 P: no B: no I: no'\n\
         echo 'Exiting... (End of file)'\n\
         exit 0\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut cmd = playwire_cmd();
    cmd.arg("play")
        .arg("--backend")
        .arg("mpv")
        .arg("--player")
        .arg(&script)
        .arg("/media/a.mkv")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\":\"fully_loaded\""))
        .stdout(predicate::str::contains("\"type\":\"end_of_file\""))
        .stdout(predicate::str::contains("\"type\":\"process_exited\""));
}

#[cfg(unix)]
#[test]
fn test_cli_play_exit_code_carries_reason() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let script = dir.path().join("fake-mplayer");
    fs::write(
        &script,
        "#!/bin/sh\necho 'Server returned 404: Not Found'\nexit 1\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut cmd = playwire_cmd();
    cmd.arg("play")
        .arg("--backend")
        .arg("mplayer")
        .arg("--player")
        .arg(&script)
        .arg("http://example.invalid/a.mp4")
        .assert()
        .code(6)
        .stdout(predicate::str::contains("\"type\":\"fatal\""));
}

#[cfg(unix)]
#[test]
fn test_cli_play_advances_to_next_title() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let script = dir.path().join("fake-mplayer");
    fs::write(
        &script,
        "#!/bin/sh\n\
         case \"$*\" in\n\
         *dvd://2*)\n\
         echo 'ID_DVD_TITLES=3'\n\
         echo 'ID_DVD_TITLE_1_LENGTH=100.000'\n\
         echo 'ID_DVD_TITLE_2_LENGTH=100.000'\n\
         echo 'ID_DVD_TITLE_3_LENGTH=100.000'\n\
         echo 'Invalid DVD title number: 2'\n\
         echo 'ID_DVD_CURRENT_TITLE=1'\n\
         ;;\n\
         *dvd://3*)\n\
         echo 'Exiting... (End of file)'\n\
         ;;\n\
         esac\n\
         exit 0\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut cmd = playwire_cmd();
    let output = cmd
        .arg("play")
        .arg("--backend")
        .arg("mplayer")
        .arg("--player")
        .arg(&script)
        .arg("dvd://2")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"type\":\"play_next_requested\""), "{stdout}");
    assert_eq!(stdout.matches("\"type\":\"process_exited\"").count(), 2);
    assert!(stdout.contains("\"type\":\"end_of_file\""));
}
