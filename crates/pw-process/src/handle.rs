//! Cloneable control surface for a running session.

use std::sync::Arc;

use parking_lot::RwLock;
use pw_core::events::{Event, EventBus};
use pw_core::{ExitReason, MediaData};
use pw_proto::PlayerCommand;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::driver::SessionState;

pub(crate) type Reply = oneshot::Sender<pw_core::Result<usize>>;

/// Requests from callers to the session loop.
#[derive(Debug)]
pub(crate) enum Control {
    Command(PlayerCommand, Reply),
    Raw(String, Reply),
    Quit(ExitReason, Reply),
}

/// Talks to one session's run loop.
///
/// The media model is shared read-only; only the session's line parser
/// writes to it.
#[derive(Clone)]
pub struct PlayerHandle {
    pub(crate) tx: mpsc::Sender<Control>,
    pub(crate) media: Arc<RwLock<MediaData>>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) state: Arc<RwLock<SessionState>>,
}

impl PlayerHandle {
    /// Translate and send a command. Returns how many lines were written,
    /// zero when the backend cannot express it or the session is closing.
    pub async fn send(&self, command: PlayerCommand) -> pw_core::Result<usize> {
        self.request(|reply| Control::Command(command, reply)).await
    }

    /// Write a backend-specific line verbatim, still subject to the
    /// quit/end-of-file guard.
    pub async fn send_raw(&self, text: impl Into<String>) -> pw_core::Result<usize> {
        let text = text.into();
        self.request(|reply| Control::Raw(text, reply)).await
    }

    /// Ask the backend to quit with `reason`. Only the first call writes.
    pub async fn quit(&self, reason: ExitReason) -> pw_core::Result<bool> {
        let written = self.request(|reply| Control::Quit(reason, reply)).await?;
        Ok(written > 0)
    }

    async fn request(&self, make: impl FnOnce(Reply) -> Control) -> pw_core::Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| finished())?;
        rx.await.map_err(|_| finished())?
    }

    /// Snapshot of the media model.
    pub fn media(&self) -> MediaData {
        self.media.read().clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn finished() -> pw_core::Error {
    pw_core::Error::State("session has finished".into())
}
