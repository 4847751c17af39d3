//! Per-backend protocol dialects.
//!
//! A [`Dialect`] supplies the three things that differ between backends:
//! launch-argument rendering, command translation, and the ordered output
//! pattern table. Everything else is shared by the line parser and the
//! process driver.

mod mplayer;
mod mpv;

pub use mplayer::MPlayerDialect;
pub use mpv::MpvDialect;

use std::path::PathBuf;

use pw_core::config::BackendKind;
use pw_core::{ExitReason, MediaData};
use regex::{Captures, Regex};

use crate::command::PlayerCommand;
use crate::launch::LaunchOptions;
use crate::line::{Classified, CountKind, Line};

/// One line for the backend's input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub text: String,
    /// The backend will print a reply the parser must wait for.
    pub answer: bool,
}

impl Outgoing {
    pub fn command(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            answer: false,
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            answer: true,
        }
    }
}

/// A named output pattern and the decoder for its captures.
pub struct Rule {
    pub name: &'static str,
    re: Regex,
    decode: fn(&Captures<'_>) -> Option<Line>,
}

impl Rule {
    /// Patterns are literals; an invalid one is a programming error.
    pub(crate) fn new(
        name: &'static str,
        pattern: &str,
        decode: fn(&Captures<'_>) -> Option<Line>,
    ) -> Self {
        let re = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid pattern for rule {name}: {e}"));
        Self { name, re, decode }
    }

    fn apply(&self, line: &str) -> Option<Classified> {
        let caps = self.re.captures(line)?;
        Some(match (self.decode)(&caps) {
            Some(decoded) => Classified::Line(decoded),
            None => Classified::Malformed(self.name),
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.re.as_str())
            .finish()
    }
}

/// Run `line` through `rules` in order; the first matching rule wins even
/// if its captures fail to decode.
pub fn classify_with(rules: &[Rule], line: &str) -> Classified {
    rules
        .iter()
        .find_map(|rule| rule.apply(line))
        .unwrap_or(Classified::Unhandled)
}

pub trait Dialect: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// The backend's number for the first disc title.
    fn title_base(&self) -> u32;

    /// Full argument list, excluding the program name.
    fn launch_args(&self, opts: &LaunchOptions) -> Vec<String>;

    /// Directory the backend should run in, if it matters.
    fn working_dir(&self, _opts: &LaunchOptions) -> Option<PathBuf> {
        None
    }

    /// Lines implementing `cmd`, empty when the backend cannot express it.
    fn translate(&self, cmd: &PlayerCommand, md: &MediaData) -> Vec<Outgoing>;

    /// Output patterns in priority order.
    fn patterns(&self) -> &'static [Rule];

    /// Queries to send after the backend reports how many titles or
    /// chapters exist.
    fn follow_up(&self, kind: CountKind, count: u32) -> Vec<Outgoing>;

    /// Queries to send once playback has started.
    fn startup_queries(&self) -> Vec<Outgoing> {
        Vec::new()
    }

    fn classify(&self, line: &str) -> Classified {
        classify_with(self.patterns(), line)
    }

    fn quit_command(&self, reason: ExitReason) -> String {
        format!("quit {}", reason.code())
    }

    /// Backend title number to the 1-based logical number.
    fn logical_title(&self, native: u32) -> u32 {
        (native + 1).saturating_sub(self.title_base())
    }

    /// 1-based logical title number to the backend's number.
    fn native_title(&self, logical: u32) -> u32 {
        (logical + self.title_base()).saturating_sub(1)
    }
}

static MPLAYER: MPlayerDialect = MPlayerDialect;
static MPV: MpvDialect = MpvDialect;

pub fn dialect(kind: BackendKind) -> &'static dyn Dialect {
    match kind {
        BackendKind::MPlayer => &MPLAYER,
        BackendKind::Mpv => &MPV,
    }
}

// ---------------------------------------------------------------------------
// Shared decoding helpers
// ---------------------------------------------------------------------------

pub(crate) fn cap<'t>(caps: &Captures<'t>, i: usize) -> Option<&'t str> {
    caps.get(i).map(|m| m.as_str())
}

pub(crate) fn cap_u32(caps: &Captures<'_>, i: usize) -> Option<u32> {
    cap(caps, i)?.trim().parse().ok()
}

/// Quote a string argument for a backend input line.
pub(crate) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Split an ICY `StreamTitle='..';StreamUrl='..';` payload.
pub(crate) fn parse_icy(payload: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut rest = payload;
    while let Some(eq) = rest.find("='") {
        let key = rest[..eq].trim().trim_start_matches(';').trim();
        let after = &rest[eq + 2..];
        let Some(end) = after.find("';") else {
            let value = after.trim_end_matches('\'');
            entries.push((key.to_string(), value.to_string()));
            break;
        };
        entries.push((key.to_string(), after[..end].to_string()));
        rest = &after[end + 2..];
    }
    entries
}
