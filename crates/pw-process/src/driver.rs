//! The session driver: owns the backend process from spawn to exit.
//!
//! Output lines from both streams go through the session's [`LineParser`]
//! strictly in arrival order. Caller commands arrive over a channel and
//! are serialized with line processing on the same task, so the media
//! model is never touched from two places at once.

use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::RwLock;
use pw_core::config::{BackendKind, Config};
use pw_core::events::{EventBus, PlayerEvent};
use pw_core::{ExitReason, MediaData};
use pw_proto::{
    dialect, Dialect, LaunchOptions, LineParser, Outcome, Outgoing, ParserSettings, PlayerCommand,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::codec::FramedRead;

use crate::command::LaunchCommand;
use crate::handle::{Control, PlayerHandle, Reply};
use crate::lines::LineCodec;
use crate::tools;
use crate::writer::CommandWriter;

const CONTROL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    QuitRequested,
    Finished,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::QuitRequested)
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Clean OS exit and no fatal condition latched during parsing.
    pub normal: bool,
    pub reason: ExitReason,
    /// The end of the file was seen and the exit was normal.
    pub end_of_file: bool,
    /// Raw OS exit code, when the process exited with one.
    pub exit_code: Option<i32>,
}

/// Combine the OS exit status with what parsing observed.
///
/// A latched condition overrides the OS status, and an end of file is never
/// reported for an abnormal exit.
pub fn final_status(
    os_success: bool,
    latched: Option<ExitReason>,
    end_of_file_seen: bool,
) -> (bool, ExitReason, bool) {
    let normal = os_success && latched.is_none();
    let reason = match latched {
        Some(reason) => reason,
        None if os_success => ExitReason::Clean,
        None => ExitReason::Crash,
    };
    (normal, reason, normal && end_of_file_seen)
}

/// A running session: a control handle plus the run loop's completion.
#[derive(Debug)]
pub struct Session {
    handle: PlayerHandle,
    task: JoinHandle<SessionReport>,
}

impl Session {
    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Wait for the backend to exit.
    pub async fn wait(self) -> pw_core::Result<SessionReport> {
        self.task
            .await
            .map_err(|e| pw_core::Error::Internal(format!("session task failed: {e}")))
    }
}

/// Launches sessions for one backend. Sessions are sequential: a new one
/// may only start once the previous one finished.
pub struct PlayerDriver {
    config: Config,
    dialect: &'static dyn Dialect,
    program: Option<PathBuf>,
    events: Arc<EventBus>,
    state: Arc<RwLock<SessionState>>,
}

impl PlayerDriver {
    pub fn new(config: Config) -> Self {
        Self {
            dialect: dialect(config.player.backend),
            config,
            program: None,
            events: Arc::new(EventBus::default()),
            state: Arc::new(RwLock::new(SessionState::Idle)),
        }
    }

    /// Use a different backend dialect than the configured one.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.dialect = dialect(backend);
        self
    }

    /// Launch this executable instead of searching for the backend.
    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = Some(program);
        self
    }

    pub fn backend(&self) -> BackendKind {
        self.dialect.kind()
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// The backend's argument list for `opts`.
    pub fn launch_args(&self, opts: &LaunchOptions) -> Vec<String> {
        self.dialect.launch_args(opts)
    }

    /// Start a new session.
    ///
    /// Returns once the OS has confirmed the process start. Every session
    /// begins with a fresh media model, parser and writer.
    ///
    /// # Errors
    ///
    /// - [`pw_core::Error::State`] if a session is still active.
    /// - [`pw_core::Error::Launch`] / [`pw_core::Error::StartTimeout`] if the
    ///   backend could not be started; no session exists in that case.
    pub async fn start_player(&mut self, opts: LaunchOptions) -> pw_core::Result<Session> {
        {
            let mut state = self.state.write();
            if state.is_active() {
                return Err(pw_core::Error::State(format!(
                    "a session is already {:?}",
                    *state
                )));
            }
            *state = SessionState::Starting;
        }

        match self.spawn(&opts).await {
            Ok(session) => Ok(session),
            Err(e) => {
                *self.state.write() = SessionState::Idle;
                tracing::warn!("Backend failed to start: {e}");
                Err(e)
            }
        }
    }

    async fn spawn(&self, opts: &LaunchOptions) -> pw_core::Result<Session> {
        let backend = self.dialect.kind();
        let program = match &self.program {
            Some(p) => p.clone(),
            None => tools::locate(backend, &self.config.tools)?,
        };

        let mut cmd = LaunchCommand::new(program);
        cmd.args(self.dialect.launch_args(opts))
            .current_dir(self.dialect.working_dir(opts))
            .start_timeout(Duration::from_millis(self.config.player.start_timeout_ms));
        let mut child = cmd.spawn().await?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(pw_core::Error::launch(
                cmd.program_name(),
                "standard streams were not piped",
            ));
        };

        let pid = child.id();
        tracing::info!(%backend, ?pid, locator = %opts.locator, "Backend started");
        *self.state.write() = SessionState::Running;

        let media = Arc::new(RwLock::new(MediaData::new(opts.locator.clone())));
        let (tx, rx) = mpsc::channel(CONTROL_CAPACITY);
        let handle = PlayerHandle {
            tx,
            media: Arc::clone(&media),
            events: Arc::clone(&self.events),
            state: Arc::clone(&self.state),
        };

        self.events.broadcast(PlayerEvent::ProcessStarted { pid });

        let run = RunLoop {
            parser: LineParser::new(self.dialect, ParserSettings::from(&self.config.player)),
            writer: CommandWriter::new(stdin),
            dialect: self.dialect,
            media,
            events: Arc::clone(&self.events),
            state: Arc::clone(&self.state),
            end_of_file: false,
            requested_quit: None,
            forced_quit: None,
        };

        let lines = futures::stream::select(
            FramedRead::new(stdout, LineCodec),
            FramedRead::new(stderr, LineCodec),
        );
        let task = tokio::spawn(run.run(child, lines, rx));

        Ok(Session { handle, task })
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

struct RunLoop<W> {
    parser: LineParser,
    writer: CommandWriter<W>,
    dialect: &'static dyn Dialect,
    media: Arc<RwLock<MediaData>>,
    events: Arc<EventBus>,
    state: Arc<RwLock<SessionState>>,
    end_of_file: bool,
    /// Reason given by a caller-requested quit.
    requested_quit: Option<ExitReason>,
    /// Pending quit that fakes an end of file before a title boundary.
    forced_quit: Option<Pin<Box<Sleep>>>,
}

impl<W: AsyncWrite + Unpin> RunLoop<W> {
    async fn run<S>(
        mut self,
        mut child: Child,
        mut lines: S,
        mut rx: mpsc::Receiver<Control>,
    ) -> SessionReport
    where
        S: futures::Stream<Item = std::io::Result<String>> + Unpin,
    {
        let mut control_open = true;

        loop {
            tokio::select! {
                line = lines.next() => match line {
                    Some(Ok(line)) => self.on_line(&line).await,
                    Some(Err(e)) => tracing::warn!("Failed reading backend output: {e}"),
                    None => break,
                },
                control = rx.recv(), if control_open => match control {
                    Some(control) => self.on_control(control).await,
                    None => control_open = false,
                },
                _ = fire(&mut self.forced_quit) => {
                    self.forced_quit = None;
                    tracing::info!("Title end reached; forcing quit");
                    self.end_of_file = true;
                    self.writer.mark_end_of_file();
                    let _ = self.quit(ExitReason::Clean).await;
                }
            }
        }

        let status = child.wait().await;
        self.finish(status)
    }

    async fn on_line(&mut self, line: &str) {
        tracing::trace!("<- {line}");
        let outcome = {
            let mut md = self.media.write();
            self.parser.parse_line(&mut md, line)
        };
        self.apply(outcome).await;
    }

    async fn apply(&mut self, outcome: Outcome) {
        for event in outcome.events {
            self.events.broadcast(event);
        }
        if outcome.end_of_file {
            self.end_of_file = true;
            self.writer.mark_end_of_file();
        }
        if let Err(e) = self.write_lines(&outcome.commands).await {
            tracing::warn!("Failed to send follow-up query: {e}");
        }
        if let Some(delay) = outcome.schedule_quit {
            tracing::info!(?delay, "Scheduling quit before the title ends");
            self.forced_quit = Some(Box::pin(tokio::time::sleep(delay)));
        }
        if let Some(reason) = outcome.quit {
            let _ = self.quit(reason).await;
        }
    }

    async fn on_control(&mut self, control: Control) {
        match control {
            Control::Command(command, reply) => {
                let result = self.send_command(&command).await;
                respond(reply, result);
            }
            Control::Raw(text, reply) => {
                let result = self.writer.write_line(&text).await.map(usize::from);
                respond(reply, result);
            }
            Control::Quit(reason, reply) => {
                self.requested_quit.get_or_insert(reason);
                let result = self.quit(reason).await;
                respond(reply, result);
            }
        }
    }

    async fn send_command(&mut self, command: &PlayerCommand) -> pw_core::Result<usize> {
        let lines = {
            let md = self.media.read();
            self.dialect.translate(command, &md)
        };
        if lines.is_empty() {
            tracing::debug!(
                backend = %self.dialect.kind(),
                "Command {} not supported; dropped",
                command.name()
            );
            return Ok(0);
        }

        self.write_lines(&lines).await
    }

    /// Write lines in order. Only queries that reach the backend await an
    /// answer; ones dropped after a quit or end of file never get one.
    async fn write_lines(&mut self, lines: &[Outgoing]) -> pw_core::Result<usize> {
        let mut written = 0;
        let mut answers = 0;
        let mut result = Ok(());
        for line in lines {
            match self.writer.write_line(&line.text).await {
                Ok(true) => {
                    written += 1;
                    answers += u32::from(line.answer);
                }
                Ok(false) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.parser.expect_answers(answers);
        result.map(|()| written)
    }

    async fn quit(&mut self, reason: ExitReason) -> pw_core::Result<usize> {
        let command = self.dialect.quit_command(reason);
        let sent = self.writer.quit(&command).await;
        if matches!(sent, Ok(true)) {
            tracing::info!(%reason, "Quit sent to backend");
            *self.state.write() = SessionState::QuitRequested;
        }
        match sent {
            Ok(sent) => Ok(usize::from(sent)),
            Err(e) => {
                tracing::warn!("Failed to send quit: {e}");
                Err(e)
            }
        }
    }

    fn finish(self, status: std::io::Result<std::process::ExitStatus>) -> SessionReport {
        let (os_success, exit_code) = match &status {
            Ok(status) => (status.success(), status.code()),
            Err(e) => {
                tracing::warn!("Failed to wait for backend: {e}");
                (false, None)
            }
        };

        let latched = self
            .parser
            .latched_fatal()
            .or(self.requested_quit.filter(|r| r.is_fatal()));
        let (normal, reason, end_of_file) = final_status(os_success, latched, self.end_of_file);

        tracing::info!(normal, %reason, ?exit_code, end_of_file, "Backend exited");

        if end_of_file {
            self.events.broadcast(PlayerEvent::EndOfFile);
        }
        if let Some(reason) = latched {
            self.events.broadcast(PlayerEvent::fatal(reason));
        }
        self.events.broadcast(PlayerEvent::ProcessExited {
            normal,
            reason,
            end_of_file,
        });
        *self.state.write() = SessionState::Finished;

        SessionReport {
            normal,
            reason,
            end_of_file,
            exit_code,
        }
    }
}

async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

fn respond(reply: Reply, result: pw_core::Result<usize>) {
    // The caller may have stopped waiting.
    let _ = reply.send(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pw_core::Locator;
    use pw_proto::SeekTarget;

    #[test]
    fn clean_exit_with_eof_is_normal() {
        assert_eq!(final_status(true, None, true), (true, ExitReason::Clean, true));
    }

    #[test]
    fn latched_condition_overrides_clean_exit() {
        assert_eq!(
            final_status(true, Some(ExitReason::Http404), true),
            (false, ExitReason::Http404, false)
        );
    }

    #[test]
    fn crash_never_reports_eof() {
        assert_eq!(final_status(false, None, true), (false, ExitReason::Crash, false));
    }

    #[test]
    fn latched_condition_overrides_crash() {
        assert_eq!(
            final_status(false, Some(ExitReason::NoDisc), false),
            (false, ExitReason::NoDisc, false)
        );
    }

    #[tokio::test]
    async fn only_one_session_at_a_time() {
        let mut driver = PlayerDriver::new(Config::default());
        *driver.state.write() = SessionState::Running;
        let err = driver
            .start_player(LaunchOptions::new(Locator::parse("/tmp/a.mkv")))
            .await
            .unwrap_err();
        assert!(matches!(err, pw_core::Error::State(_)));
        assert_eq!(driver.state(), SessionState::Running);
    }

    #[tokio::test]
    async fn missing_program_reports_launch_failure() {
        let mut driver = PlayerDriver::new(Config::default())
            .with_program(PathBuf::from("/nonexistent/backend-xyz"));
        let err = driver
            .start_player(LaunchOptions::new(Locator::parse("/tmp/a.mkv")))
            .await
            .unwrap_err();
        assert!(err.is_launch_failure());
        assert_eq!(driver.state(), SessionState::Idle);
    }

    fn run_loop(writer: Vec<u8>) -> RunLoop<Vec<u8>> {
        let dialect = dialect(BackendKind::Mpv);
        RunLoop {
            parser: LineParser::new(dialect, ParserSettings::default()),
            writer: CommandWriter::new(writer),
            dialect,
            media: Arc::new(RwLock::new(MediaData::new(Locator::parse("/tmp/a.mkv")))),
            events: Arc::new(EventBus::default()),
            state: Arc::new(RwLock::new(SessionState::Running)),
            end_of_file: false,
            requested_quit: None,
            forced_quit: None,
        }
    }

    #[tokio::test]
    async fn commands_are_translated_and_counted() {
        let mut run = run_loop(Vec::new());
        let written = run
            .send_command(&PlayerCommand::Seek {
                target: SeekTarget::Percent(50.0),
                precise: false,
            })
            .await
            .unwrap();
        assert_eq!(written, 1);
        let text = String::from_utf8(run.writer.get_ref().clone()).unwrap();
        assert!(text.starts_with("seek 50"), "{text}");
    }

    #[tokio::test]
    async fn selection_queries_hold_back_loading() {
        let mut run = run_loop(Vec::new());
        run.send_command(&PlayerCommand::SelectAudio { id: 2 })
            .await
            .unwrap();
        assert_eq!(run.parser.pending_answers(), 1);
    }

    #[tokio::test]
    async fn written_follow_ups_await_answers() {
        let mut run = run_loop(Vec::new());
        run.on_line("INFO_CHAPTERS=4").await;
        assert_eq!(run.writer.writes(), 1);
        assert_eq!(run.parser.pending_answers(), 1);
    }

    #[tokio::test]
    async fn dropped_follow_ups_await_nothing() {
        let mut run = run_loop(Vec::new());
        run.on_line("Exiting... (End of file)").await;
        run.on_line("INFO_TITLES=2").await;
        assert_eq!(run.writer.writes(), 0);
        assert_eq!(run.parser.pending_answers(), 0);
    }

    #[tokio::test]
    async fn end_of_file_blocks_commands() {
        let mut run = run_loop(Vec::new());
        run.on_line("Exiting... (End of file)").await;
        assert!(run.end_of_file);
        let written = run
            .send_command(&PlayerCommand::TogglePause)
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert_eq!(run.writer.writes(), 0);
    }

    #[tokio::test]
    async fn no_disc_quits_once() {
        let mut run = run_loop(Vec::new());
        run.on_line("Couldn't open DVD device: /dev/sr0").await;
        run.on_line("Couldn't open DVD device: /dev/sr0").await;
        assert_eq!(run.writer.writes(), 1);
        assert_eq!(*run.state.read(), SessionState::QuitRequested);
        let text = String::from_utf8(run.writer.get_ref().clone()).unwrap();
        assert_eq!(text, "quit 2\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fatal_is_broadcast_at_exit() {
        let mut run = run_loop(Vec::new());
        let mut rx = run.events.subscribe();
        run.on_line("HTTP error 404 Not Found").await;
        let report = run.finish(Ok(exit_status(0)));
        assert!(!report.normal);
        assert_eq!(report.reason, ExitReason::Http404);
        assert!(!report.end_of_file);

        let mut payloads = Vec::new();
        while let Ok(event) = rx.try_recv() {
            payloads.push(event.payload);
        }
        assert!(payloads.contains(&PlayerEvent::fatal(ExitReason::Http404)));
        assert!(matches!(
            payloads.last(),
            Some(PlayerEvent::ProcessExited { normal: false, .. })
        ));
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code << 8)
    }
}
