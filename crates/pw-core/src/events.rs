//! Session notifications for the UI layer.
//!
//! [`EventBus`] fans timestamped events out over a `tokio::sync::broadcast`
//! channel. Subscribers that fall behind see `RecvError::Lagged`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::exit::ExitReason;
use crate::media::TrackKind;
use crate::timing::Time;

// ---------------------------------------------------------------------------
// PlayerEvent
// ---------------------------------------------------------------------------

/// What changed in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    // -- Lifecycle -----------------------------------------------------------
    ProcessStarted {
        pid: Option<u32>,
    },
    FullyLoaded,
    EndOfFile,
    ProcessExited {
        normal: bool,
        reason: ExitReason,
        end_of_file: bool,
    },
    /// The session cannot continue with this item; the caller should move on
    /// to the next playable one.
    PlayNextRequested,
    Fatal {
        reason: ExitReason,
        code: i32,
        message: String,
    },

    // -- Timing --------------------------------------------------------------
    PositionChanged {
        position: Time,
    },
    DurationChanged {
        duration: Time,
    },
    BufferingStarted,
    BufferingEnded,
    PauseChanged {
        paused: bool,
    },

    // -- Tracks and navigation -----------------------------------------------
    TracksChanged {
        kind: TrackKind,
    },
    TrackSelected {
        kind: TrackKind,
        id: Option<u32>,
    },
    TitleChanged {
        title: u32,
    },
    ChapterChanged {
        chapter: u32,
    },
    TitlesChanged,
    ChaptersChanged,
    MetadataChanged,
    VideoOutputChanged {
        width: u32,
        height: u32,
    },
}

impl PlayerEvent {
    /// Construct a [`PlayerEvent::Fatal`] from a reason.
    pub fn fatal(reason: ExitReason) -> Self {
        PlayerEvent::Fatal {
            reason,
            code: reason.code(),
            message: reason.message().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A timestamped event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: PlayerEvent,
}

impl Event {
    /// Create a new event with a fresh UUID and the current timestamp.
    pub fn new(payload: PlayerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Notification fan-out shared by every session of one driver.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is how many events a slow subscriber may fall behind.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Stamp and send an event; dropped when nobody is listening.
    pub fn broadcast(&self, payload: PlayerEvent) {
        tracing::trace!(?payload, "Notify");
        let _ = self.tx.send(Event::new(payload));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.broadcast(PlayerEvent::TitleChanged { title: 3 });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.payload, PlayerEvent::TitleChanged { title: 3 });
    }

    #[test]
    fn slow_subscriber_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for secs in 0..4 {
            bus.broadcast(PlayerEvent::PositionChanged {
                position: Time::from_millis(secs * 1_000),
            });
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(2))
        ));
        let event = rx.try_recv().unwrap();
        assert_eq!(
            event.payload,
            PlayerEvent::PositionChanged {
                position: Time::from_millis(2_000)
            }
        );
    }

    #[test]
    fn no_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.broadcast(PlayerEvent::fatal(ExitReason::Crash));
    }

    #[test]
    fn fatal_carries_code_and_message() {
        match PlayerEvent::fatal(ExitReason::Http403) {
            PlayerEvent::Fatal {
                reason,
                code,
                message,
            } => {
                assert_eq!(reason, ExitReason::Http403);
                assert_eq!(code, 5);
                assert!(message.contains("403"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = Event::new(PlayerEvent::TrackSelected {
            kind: TrackKind::Audio,
            id: Some(2),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"track_selected\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.payload, event.payload);
    }
}
