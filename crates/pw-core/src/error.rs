//! Unified error type for the playwire crates.
//!
//! Only operations that talk to the operating system can fail: launching the
//! backend, writing to its input stream, and loading configuration. Output
//! parsing never produces an [`Error`]; unrecognised lines are ignored.

/// Unified error type covering all failure modes in playwire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend executable could not be located or spawned.
    #[error("Launch error [{program}]: {message}")]
    Launch {
        /// Program that failed to launch.
        program: String,
        /// Human-readable error description.
        message: String,
    },

    /// The operating system did not confirm the process start in time.
    #[error("Start timeout [{program}]: no confirmation after {millis} ms")]
    StartTimeout {
        /// Program that failed to start.
        program: String,
        /// Configured start timeout.
        millis: u64,
    },

    /// Writing to the backend's input stream failed.
    #[error("Write error: {source}")]
    Write {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The operation is not valid in the current session state.
    #[error("Invalid state: {0}")]
    State(String),

    /// Configuration data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Launch`].
    pub fn launch(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Launch {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Write`].
    pub fn write(source: std::io::Error) -> Self {
        Error::Write { source }
    }

    /// Whether this error was raised before a session came into existence.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Error::Launch { .. } | Error::StartTimeout { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_display() {
        let err = Error::launch("mpv", "not found in PATH");
        assert_eq!(err.to_string(), "Launch error [mpv]: not found in PATH");
        assert!(err.is_launch_failure());
    }

    #[test]
    fn start_timeout_display() {
        let err = Error::StartTimeout {
            program: "mplayer".into(),
            millis: 250,
        };
        assert_eq!(
            err.to_string(),
            "Start timeout [mplayer]: no confirmation after 250 ms"
        );
        assert!(err.is_launch_failure());
    }

    #[test]
    fn write_is_not_launch_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = Error::write(io);
        assert!(err.to_string().contains("pipe closed"));
        assert!(!err.is_launch_failure());
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn validation_display() {
        let err = Error::Validation("bad json".into());
        assert_eq!(err.to_string(), "Validation error: bad json");
    }
}
