//! In-memory notice broadcast.
//!
//! Notices are facts for the surrounding page: a reward banner to show, a
//! status line to render or clear. Delivery is at-most-once - notices are
//! not persisted, lagged receivers miss them, and emitting with no receiver
//! at all is fine (the scan view may be the only thing mounted).

use tokio::sync::broadcast;
use tracing::debug;

const NOTICE_CHANNEL_CAPACITY: usize = 64;

/// Severity of a status notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    /// Blocking, alert-equivalent.
    Error,
}

/// A fact for the hosting page to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The customer being checked in has a reward to redeem; trigger the
    /// banner.
    RewardDue,
    /// Human-readable status line with a severity.
    Status { text: String, severity: Severity },
    /// Remove the currently displayed status line.
    ClearStatus,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice::Status {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Notice::Status {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice::Status {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

/// Broadcast channel for [`Notice`]s.
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Emit a notice to all current subscribers.
    ///
    /// A send with no subscribers is not an error.
    pub fn emit(&self, notice: Notice) {
        debug!(?notice, "emitting notice");
        let _ = self.tx.send(notice);
    }

    /// Subscribe to notices emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_does_not_panic() {
        let bus = NoticeBus::new();
        bus.emit(Notice::RewardDue);
    }

    #[tokio::test]
    async fn test_subscribers_receive_notices_in_order() {
        let bus = NoticeBus::new();
        let mut rx = bus.subscribe();

        bus.emit(Notice::RewardDue);
        bus.emit(Notice::success("checked in"));
        bus.emit(Notice::ClearStatus);

        assert_eq!(rx.recv().await.unwrap(), Notice::RewardDue);
        assert_eq!(rx.recv().await.unwrap(), Notice::success("checked in"));
        assert_eq!(rx.recv().await.unwrap(), Notice::ClearStatus);
    }
}
