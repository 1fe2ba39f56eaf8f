//! Core types shared across the session manager and the pipeline.

use uuid::Uuid;

/// Lifecycle of the single scan session.
///
/// Transitions: `Uninitialized → Initializing → Ready → Scanning ⇄ Stopped`.
/// A load failure during `Initializing` falls back to `Uninitialized`;
/// re-entering the scan view is the only retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// No scanner module loaded yet.
    Uninitialized,
    /// Library load and device enumeration in progress.
    Initializing,
    /// Scanner constructed and bound to the display target.
    Ready,
    /// Continuous decode scanning against the active device.
    Scanning,
    /// Scanning halted, scanner still constructed.
    Stopped,
}

/// One decode-triggered check-in attempt.
///
/// Created per decode event, ends when its outcome is reported. Never
/// persisted.
#[derive(Debug, Clone)]
pub struct CheckInAttempt {
    pub id: Uuid,
    pub decoded_text: String,
    /// `None` until the reward lookup has answered.
    pub reward_due: Option<bool>,
    /// `None` while the attempt is still in flight.
    pub outcome: Option<AttemptOutcome>,
}

impl CheckInAttempt {
    pub fn new(decoded_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            decoded_text: decoded_text.into(),
            reward_due: None,
            outcome: None,
        }
    }

    /// Close the attempt with a successful check-in.
    pub fn succeeded(mut self, customer_name: impl Into<String>) -> Self {
        self.outcome = Some(AttemptOutcome::Success {
            customer_name: customer_name.into(),
        });
        self
    }

    /// Close the attempt with a failure message.
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.outcome = Some(AttemptOutcome::Failure {
            message: message.into(),
        });
        self
    }
}

/// Terminal state of a [`CheckInAttempt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { customer_name: String },
    Failure { message: String },
}
