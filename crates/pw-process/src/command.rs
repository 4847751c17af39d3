//! Builder for spawning the backend with piped standard streams.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

/// Default start confirmation timeout: 10 seconds.
const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);

/// A builder for launching one backend process.
///
/// # Example
///
/// ```no_run
/// use pw_process::LaunchCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> pw_core::Result<()> {
/// let child = LaunchCommand::new(PathBuf::from("mpv"))
///     .arg("--idle=no")
///     .arg("--")
///     .arg("/path/to/video.mkv")
///     .spawn()
///     .await?;
/// println!("pid {:?}", child.id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LaunchCommand {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    start_timeout: Duration,
}

impl LaunchCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            working_dir: None,
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(&mut self, dir: Option<PathBuf>) -> &mut Self {
        self.working_dir = dir;
        self
    }

    /// How long to wait for the operating system to confirm the start.
    pub fn start_timeout(&mut self, d: Duration) -> &mut Self {
        self.start_timeout = d;
        self
    }

    /// Short name of the program, used in errors and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Spawn the process with all three standard streams piped.
    ///
    /// The child is killed if the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// - [`pw_core::Error::Launch`] if the executable is missing or the OS
    ///   refuses to spawn it.
    /// - [`pw_core::Error::StartTimeout`] if the start is not confirmed within
    ///   the start timeout.
    pub async fn spawn(&self) -> pw_core::Result<Child> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %self.program.display(), args = ?self.args, "Spawning backend");

        let spawned = tokio::time::timeout(
            self.start_timeout,
            tokio::task::spawn_blocking(move || cmd.spawn()),
        )
        .await;

        match spawned {
            Ok(Ok(Ok(child))) => Ok(child),
            Ok(Ok(Err(e))) => Err(pw_core::Error::launch(
                program_name,
                format!("failed to spawn: {e}"),
            )),
            Ok(Err(join)) => Err(pw_core::Error::Internal(format!(
                "spawn task for {program_name} failed: {join}"
            ))),
            Err(_elapsed) => Err(pw_core::Error::StartTimeout {
                program: program_name,
                millis: self.start_timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_cat_echoes_stdin() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut child = match LaunchCommand::new(PathBuf::from("cat")).spawn().await {
            Ok(child) => child,
            // Minimal environments may lack `cat`.
            Err(_) => return,
        };
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"hello\n").await.unwrap();
        drop(stdin);

        let mut out = String::new();
        child
            .stdout
            .take()
            .unwrap()
            .read_to_string(&mut out)
            .await
            .unwrap();
        assert_eq!(out, "hello\n");
        assert!(child.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn nonexistent_program_is_launch_error() {
        let err = LaunchCommand::new(PathBuf::from("nonexistent_player_xyz_12345"))
            .spawn()
            .await
            .unwrap_err();
        assert!(err.is_launch_failure());
        assert!(err.to_string().contains("nonexistent_player_xyz_12345"));
    }

    #[test]
    fn builder_collects_args() {
        let mut cmd = LaunchCommand::new(PathBuf::from("/usr/bin/mpv"));
        cmd.arg("--idle=no").args(["--", "a.mkv"]);
        assert_eq!(cmd.args, ["--idle=no", "--", "a.mkv"]);
        assert_eq!(cmd.program_name(), "mpv");
    }
}
