//! # pw-proto
//!
//! The textual protocol spoken with MPlayer and MPV, with no I/O of its own.
//!
//! This crate provides:
//!
//! - **Command surface** ([`PlayerCommand`]) -- backend-independent player
//!   commands, video/audio filters, and subtitle styling.
//! - **Launch options** ([`LaunchOptions`]) -- everything needed to build the
//!   backend's command line.
//! - **Dialects** ([`Dialect`], [`MPlayerDialect`], [`MpvDialect`]) -- the
//!   per-backend hooks: launch-argument rendering, command translation, and
//!   the priority-ordered output pattern table.
//! - **Line parser** ([`LineParser`]) -- applies recognized output lines to
//!   [`pw_core::MediaData`] and reports notifications, follow-up queries,
//!   and quit requests.

pub mod backend;
pub mod command;
pub mod launch;
pub mod line;
pub mod parser;
pub mod style;

// ---- Re-exports for convenience ----

pub use backend::{dialect, Dialect, MPlayerDialect, MpvDialect, Outgoing};
pub use command::{
    AudioFilter, ChannelMode, Deinterlace, Denoise, PlayerCommand, Rotation, SeekTarget,
    VideoFilter,
};
pub use launch::LaunchOptions;
pub use line::{Classified, CountKind, Line, Status, TrackSlot};
pub use parser::{LineParser, Outcome, ParserSettings};
pub use style::{BorderStyle, Color, HAlign, SubtitleStyle, VAlign};
