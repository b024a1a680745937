//! Page-level notifications backed by a `tokio::sync::broadcast` channel.
//!
//! A front end (or the agent binary) subscribes to render alerts, refresh
//! views after a snapshot, and react to an expired session.

use serde::Serialize;
use tokio::sync::broadcast;

use ikd_core::evidence::EvidenceKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// A user-facing failure (blocking alert dialog).
    Alert { message: String },
    /// A poll replaced the evidence map.
    SnapshotApplied { records: usize },
    EvidenceUploaded { key: EvidenceKey },
    EvidenceDeleted { key: EvidenceKey },
    ScoreCommitted { key: EvidenceKey, score: Option<f64> },
    /// The backend answered 401; the session must log in again.
    LoggedOut,
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

pub struct PageEvents {
    sender: broadcast::Sender<PageEvent>,
}

impl PageEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped if nobody listens.
    pub fn publish(&self, event: PageEvent) {
        let _ = self.sender.send(event);
    }

    pub fn alert(&self, message: impl Into<String>) {
        self.publish(PageEvent::Alert {
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }
}

impl Default for PageEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
