//! # pw-process
//!
//! Runs an MPlayer or MPV backend as a child process and drives it with the
//! `pw-proto` dialects.
//!
//! This crate provides:
//!
//! - **Backend discovery** ([`tools`]) -- locate `mplayer`/`mpv` from config
//!   overrides or `PATH` and report their version banners.
//! - **Process launch** ([`LaunchCommand`]) -- spawn with piped standard
//!   streams and a start timeout.
//! - **Output framing** ([`LineCodec`]) -- split output on `\r` or `\n`.
//! - **Guarded writes** ([`CommandWriter`]) -- one-shot quit, and no writes
//!   once the backend is closing.
//! - **Session driver** ([`PlayerDriver`], [`Session`], [`PlayerHandle`]) --
//!   the per-session run loop and its control surface.

pub mod command;
pub mod driver;
pub mod handle;
pub mod lines;
pub mod tools;
pub mod writer;

// ---- Re-exports for convenience ----

pub use command::LaunchCommand;
pub use driver::{final_status, PlayerDriver, Session, SessionReport, SessionState};
pub use handle::PlayerHandle;
pub use lines::LineCodec;
pub use tools::{check_all, locate, BackendInfo};
pub use writer::CommandWriter;
