//! Exit-reason taxonomy reported when a playback session ends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a session ended.
///
/// Latched conditions recorded while parsing override the operating-system
/// exit status when the backend terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Clean,
    NoDisc,
    FileOpen,
    UnsupportedFormat,
    Http403,
    Http404,
    TitleNotFound,
    Crash,
}

impl ExitReason {
    /// Stable numeric code, independent of the backend that produced it.
    pub fn code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::NoDisc => 2,
            Self::FileOpen => 3,
            Self::UnsupportedFormat => 4,
            Self::Http403 => 5,
            Self::Http404 => 6,
            Self::TitleNotFound => 7,
            Self::Crash => 255,
        }
    }

    /// Human-readable reason suitable for direct display.
    pub fn message(self) -> &'static str {
        match self {
            Self::Clean => "Playback finished",
            Self::NoDisc => "No disc in drive",
            Self::FileOpen => "Failed to open file",
            Self::UnsupportedFormat => "File format not recognized",
            Self::Http403 => "Access forbidden (HTTP 403)",
            Self::Http404 => "Resource not found (HTTP 404)",
            Self::TitleNotFound => "Title not found on disc",
            Self::Crash => "Player exited unexpectedly",
        }
    }

    /// Whether this reason describes a failure.
    pub fn is_fatal(self) -> bool {
        self != Self::Clean
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
