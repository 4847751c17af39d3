//! Sessions against a shell script that imitates a backend.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pw_core::config::{BackendKind, Config};
use pw_core::events::{Event, PlayerEvent};
use pw_core::{ExitReason, Locator, TrackKind};
use pw_process::{PlayerDriver, SessionState};
use pw_proto::{LaunchOptions, PlayerCommand};
use tokio::sync::broadcast;

/// Write an executable script that prints `output`, then, if `interactive`,
/// logs every input line to `input.log` and exits with the code of `quit N`.
fn fake_backend(dir: &Path, output: &[&str], interactive: bool, exit_code: i32) -> PathBuf {
    let log = dir.join("input.log");
    let mut script = String::from("#!/bin/sh\n");
    for line in output {
        let quoted = line.replace('\'', "'\\''");
        script.push_str(&format!("printf '%s\\n' '{quoted}'\n"));
    }
    if interactive {
        script.push_str(&format!(
            "while read -r line; do\n\
             \x20 printf '%s\\n' \"$line\" >> '{}'\n\
             \x20 case \"$line\" in\n\
             \x20   quit*) exit \"${{line#quit }}\" ;;\n\
             \x20 esac\n\
             done\n",
            log.display()
        ));
    }
    script.push_str(&format!("exit {exit_code}\n"));

    let path = dir.join("fake-player");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn driver(backend: BackendKind, program: PathBuf) -> PlayerDriver {
    PlayerDriver::new(Config::default())
        .with_backend(backend)
        .with_program(program)
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.payload);
    }
    events
}

fn input_log(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("input.log")).unwrap_or_default()
}

#[tokio::test]
async fn mpv_session_reaches_end_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(
        dir.path(),
        &[
            "INFO_VIDEO_WIDTH=640",
            "INFO_VIDEO_HEIGHT=480",
            "INFO_LENGTH=10.000000",
            "(+) Audio --aid=1 --alang=eng 'English' (aac 2ch 48000Hz)",
            "STATUS: 1.000000 / 10.000000 P: no B: no I: no",
            "STATUS: 2.000000 / 10.000000 P: no B: no I: no",
            "Exiting... (End of file)",
        ],
        false,
        0,
    );

    let mut driver = driver(BackendKind::Mpv, program);
    let mut rx = driver.events().subscribe();
    let session = driver
        .start_player(LaunchOptions::new(Locator::parse("/media/clip.mkv")))
        .await
        .unwrap();
    let handle = session.handle();

    let report = tokio::time::timeout(Duration::from_secs(10), session.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(report.normal);
    assert!(report.end_of_file);
    assert_eq!(report.reason, ExitReason::Clean);
    assert_eq!(handle.state(), SessionState::Finished);

    let md = handle.media();
    assert_eq!(md.video.width, 640);
    assert_eq!(md.duration().as_millis(), 10_000);
    assert_eq!(md.gui_position().as_millis(), 2_000);
    assert_eq!(md.audios.selected(), Some(1));

    let events = drain(&mut rx);
    assert!(matches!(events.first(), Some(PlayerEvent::ProcessStarted { .. })));
    assert!(events.contains(&PlayerEvent::FullyLoaded));
    assert!(events.contains(&PlayerEvent::EndOfFile));
    assert_eq!(
        events.last(),
        Some(&PlayerEvent::ProcessExited {
            normal: true,
            reason: ExitReason::Clean,
            end_of_file: true,
        })
    );
}

#[tokio::test]
async fn commands_reach_backend_and_quit_is_sent_once() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(
        dir.path(),
        &["STATUS: 1.000000 / 10.000000 P: no B: no I: no"],
        true,
        0,
    );

    let mut driver = driver(BackendKind::Mpv, program);
    let session = driver
        .start_player(LaunchOptions::new(Locator::parse("/media/clip.mkv")))
        .await
        .unwrap();
    let handle = session.handle();

    assert_eq!(
        handle.send(PlayerCommand::SetVolume { volume: 50 }).await.unwrap(),
        1
    );
    assert!(handle.quit(ExitReason::Clean).await.unwrap());
    let again = handle.quit(ExitReason::Clean).await;
    assert!(!matches!(again, Ok(true)));

    let report = tokio::time::timeout(Duration::from_secs(10), session.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(report.normal);
    assert!(!report.end_of_file);
    assert_eq!(input_log(dir.path()), "set volume 50\nquit 0\n");

    let late = handle.send(PlayerCommand::TogglePause).await;
    assert!(late.is_err());
}

#[tokio::test]
async fn latched_condition_overrides_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(
        dir.path(),
        &["Failed to recognize file format."],
        false,
        1,
    );

    let mut driver = driver(BackendKind::MPlayer, program);
    let mut rx = driver.events().subscribe();
    let session = driver
        .start_player(LaunchOptions::new(Locator::parse("/media/broken.bin")))
        .await
        .unwrap();

    let report = session.wait().await.unwrap();
    assert!(!report.normal);
    assert_eq!(report.reason, ExitReason::UnsupportedFormat);
    assert_eq!(report.exit_code, Some(1));

    let events = drain(&mut rx);
    assert!(events.contains(&PlayerEvent::fatal(ExitReason::UnsupportedFormat)));
    assert!(!events.contains(&PlayerEvent::EndOfFile));
}

#[tokio::test]
async fn crash_is_not_disguised_as_end_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(dir.path(), &["ID_EXIT=EOF"], false, 139);

    let mut driver = driver(BackendKind::MPlayer, program);
    let session = driver
        .start_player(LaunchOptions::new(Locator::parse("/media/clip.avi")))
        .await
        .unwrap();

    let report = session.wait().await.unwrap();
    assert!(!report.normal);
    assert!(!report.end_of_file);
    assert_eq!(report.reason, ExitReason::Crash);
}

#[tokio::test]
async fn missing_disc_quits_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(dir.path(), &["No medium found"], true, 0);

    let mut driver = driver(BackendKind::MPlayer, program);
    let session = driver
        .start_player(LaunchOptions::new(Locator::parse("dvd://1")))
        .await
        .unwrap();

    let report = tokio::time::timeout(Duration::from_secs(10), session.wait())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.reason, ExitReason::NoDisc);
    assert_eq!(report.exit_code, Some(ExitReason::NoDisc.code()));
    assert_eq!(input_log(dir.path()), "quit 2\n");
}

#[tokio::test]
async fn tracks_announced_after_loading_notify() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(
        dir.path(),
        &[
            "STATUS: 1.000000 / 10.000000 P: no B: no I: no",
            "Audio --aid=2 --alang=fre 'French' (aac 2ch 48000Hz)",
            "Audio --aid=2 --alang=fre 'French' (aac 2ch 48000Hz)",
        ],
        false,
        0,
    );

    let mut driver = driver(BackendKind::Mpv, program);
    let mut rx = driver.events().subscribe();
    let session = driver
        .start_player(LaunchOptions::new(Locator::parse("/media/clip.mkv")))
        .await
        .unwrap();
    session.wait().await.unwrap();

    let changed = drain(&mut rx)
        .into_iter()
        .filter(|e| *e == PlayerEvent::TracksChanged { kind: TrackKind::Audio })
        .count();
    assert_eq!(changed, 1);
}

#[tokio::test]
async fn sessions_can_follow_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_backend(dir.path(), &["Exiting... (End of file)"], false, 0);

    let mut driver = driver(BackendKind::Mpv, program);
    for name in ["/media/a.mkv", "/media/b.mkv"] {
        let session = driver
            .start_player(LaunchOptions::new(Locator::parse(name)))
            .await
            .unwrap();
        let handle = session.handle();
        let report = session.wait().await.unwrap();
        assert!(report.end_of_file);
        assert_eq!(handle.media().locator.as_str(), name);
    }
    assert_eq!(driver.state(), SessionState::Finished);
}
