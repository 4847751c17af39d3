//! pw-core: shared types, errors, configuration, timing, and event system.
//!
//! This crate is the foundational dependency for the other pw-* crates,
//! providing the per-session [`MediaData`] model, the exit-reason taxonomy,
//! timing reconciliation between player and GUI clocks, a unified error
//! type, application configuration, and a broadcast event bus.

pub mod config;
pub mod error;
pub mod events;
pub mod exit;
pub mod locator;
pub mod media;
pub mod timing;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use exit::ExitReason;
pub use locator::{Locator, MediaType};
pub use media::*;
pub use timing::{Time, Timing};
