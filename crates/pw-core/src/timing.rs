//! Timing reconciliation between backend-reported time and GUI time.
//!
//! All times are kept as ticks of a 90 kHz clock, the native MPEG system
//! clock. The transport-stream PTS wraps at 2^33 ticks, so the rollover
//! period is exactly representable and the player/GUI transforms are exact
//! integer arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Ticks per second of the 90 kHz clock.
pub const TICKS_PER_SEC: i64 = 90_000;

/// MPEG-TS PTS wraparound: 2^33 / 90000 seconds.
pub const ROLLOVER: Time = Time(1 << 33);

/// A point in time or a span, measured in 90 kHz ticks.
///
/// Arithmetic saturates at the `i64` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Time(i64);

impl Time {
    pub const ZERO: Time = Time(0);

    /// Largest magnitude accepted from backend output, about 400 years.
    pub const LIMIT: Time = Time(1 << 50);

    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> i64 {
        self.0
    }

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms.saturating_mul(TICKS_PER_SEC / 1000))
    }

    /// Convert from milliseconds, rejecting values beyond [`Time::LIMIT`].
    pub fn checked_from_millis(ms: i64) -> Option<Self> {
        ms.checked_mul(TICKS_PER_SEC / 1000)
            .map(Self)
            .filter(|t| t.in_range())
    }

    /// Convert from seconds, rounding to the nearest tick.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() {
            return Self::ZERO;
        }
        Self((secs * TICKS_PER_SEC as f64).round() as i64)
    }

    /// Convert from seconds, rejecting non-finite values and values beyond
    /// [`Time::LIMIT`].
    pub fn checked_from_secs_f64(secs: f64) -> Option<Self> {
        let ticks = (secs * TICKS_PER_SEC as f64).round();
        (ticks.is_finite() && ticks.abs() <= Self::LIMIT.0 as f64).then(|| Self(ticks as i64))
    }

    fn in_range(self) -> bool {
        self.0.unsigned_abs() <= Self::LIMIT.0.unsigned_abs()
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_SEC as f64
    }

    pub fn as_millis(self) -> i64 {
        self.0 / (TICKS_PER_SEC / 1000)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn max(self, other: Time) -> Time {
        Time(self.0.max(other.0))
    }

    /// Parse a decimal seconds value as printed by the backends.
    ///
    /// Accepts a leading sign and an optional fractional part; also accepts
    /// `hh:mm:ss(.fff)` clock notation.
    pub fn parse_secs(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.contains(':') {
            return Self::parse_clock(text);
        }
        Self::checked_from_secs_f64(text.parse().ok()?)
    }

    fn parse_clock(text: &str) -> Option<Self> {
        let mut total = 0.0f64;
        for part in text.split(':') {
            let value: f64 = part.parse().ok()?;
            total = total * 60.0 + value;
        }
        Self::checked_from_secs_f64(total)
    }

    /// Parse a CD `mm:ss:ff` address, where a second has 75 frames.
    pub fn parse_msf(text: &str) -> Option<Self> {
        let mut parts = text.trim().split(':');
        let m: i64 = parts.next()?.parse().ok()?;
        let s: i64 = parts.next()?.parse().ok()?;
        let f: i64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || f >= 75 {
            return None;
        }
        let secs = m.checked_mul(60)?.checked_add(s)?;
        let ticks = secs
            .checked_mul(TICKS_PER_SEC)?
            .checked_add(f * TICKS_PER_SEC / 75)?;
        Some(Self(ticks)).filter(|t| t.in_range())
    }
}

impl From<f64> for Time {
    fn from(secs: f64) -> Self {
        Self::from_secs_f64(secs)
    }
}

impl From<Time> for f64 {
    fn from(t: Time) -> f64 {
        t.as_secs_f64()
    }
}

impl Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.as_secs_f64())
    }
}

/// Where the session's start offset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSource {
    #[default]
    Unset,
    Reported,
    Inferred,
}

/// Per-session transform between player time and GUI time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    start: Time,
    source: StartSource,
    mpegts: bool,
}

impl Timing {
    pub fn start(&self) -> Time {
        self.start
    }

    pub fn start_source(&self) -> StartSource {
        self.source
    }

    /// Use a start timestamp reported by the backend.
    pub fn set_start(&mut self, start: Time) {
        self.start = start;
        self.source = StartSource::Reported;
    }

    /// Infer the start offset from a player timestamp.
    ///
    /// Only the first negative timestamp of a session is used, and only when
    /// no start time was reported. Returns `true` when the offset changed.
    pub fn observe(&mut self, player_time: Time) -> bool {
        if self.source == StartSource::Unset && player_time.is_negative() {
            self.start = player_time;
            self.source = StartSource::Inferred;
            return true;
        }
        false
    }

    pub fn is_mpegts(&self) -> bool {
        self.mpegts
    }

    /// Enable rollover correction for transport-stream content.
    pub fn set_mpegts(&mut self, mpegts: bool) {
        self.mpegts = mpegts;
    }

    pub fn player_to_gui(&self, player_time: Time) -> Time {
        let gui = player_time - self.start;
        if self.mpegts && gui.is_negative() {
            gui + ROLLOVER
        } else {
            gui
        }
    }

    /// Inverse of [`Timing::player_to_gui`], used for absolute seeks.
    pub fn gui_to_player(&self, gui_time: Time) -> Time {
        let player = gui_time + self.start;
        if self.mpegts && player >= ROLLOVER && (player - ROLLOVER) < self.start {
            player - ROLLOVER
        } else {
            player
        }
    }
}
