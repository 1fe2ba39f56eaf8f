//! Error taxonomy for the scan-to-check-in workflow.
//!
//! Camera and library failures require user action (grant permission,
//! re-enter the view) and surface as blocking error notices. API failures
//! during a pipeline run are transient and self-heal by resuming the scan
//! loop. Nothing here is ever silently swallowed.

use thiserror::Error;

/// Failures raised by the camera session manager.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The scanning library could not be loaded. Terminal for the session:
    /// state returns to `Uninitialized` and the user must re-enter the view.
    #[error("failed to load the scanning library: {source}")]
    LibraryLoad {
        #[source]
        source: anyhow::Error,
    },

    /// Device enumeration yielded no usable camera. Terminal, same as
    /// `LibraryLoad`.
    #[error("no camera devices available")]
    NoCamera,

    /// The scanner refused to start against the active device. The session
    /// stays `Stopped` so a restart can be attempted.
    #[error("failed to start scanning: {source}")]
    Start {
        #[source]
        source: anyhow::Error,
    },

    /// The scanner failed to halt. The pipeline aborts and the session is
    /// left `Stopped` so the stop can be retried.
    #[error("failed to stop scanning: {source}")]
    Stop {
        #[source]
        source: anyhow::Error,
    },

    /// A persisted or user-chosen device id does not match any enumerated
    /// device. Never halts the session: initialization falls back to the
    /// first device, a manual change keeps the current one.
    #[error("unknown camera device: {device_id}")]
    DeviceSelection { device_id: String },
}

/// A failed backend call, with the user-facing message already resolved.
///
/// Message precedence when a response has several possible sources: the
/// structured `details` field wins over the raw response body, which wins
/// over a generic fallback string.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status, when the request made it to the server.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    /// A failure that never reached the server (DNS, connect, timeout).
    pub fn transport(source: impl std::fmt::Display) -> Self {
        Self {
            status: None,
            message: source.to_string(),
        }
    }

    /// Resolve the user-facing message from an error response body.
    ///
    /// Accepts both the documented `{"details": ..}` shape and the legacy
    /// `{"error": ..}` shape the backend still emits on some routes.
    pub fn from_response(status: u16, body: &str) -> Self {
        let details = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("details")
                    .or_else(|| value.get("error"))
                    .and_then(|d| d.as_str().map(str::to_owned))
            });

        let body = body.trim();
        let message = match details {
            Some(details) => details,
            None if !body.is_empty() => body.to_owned(),
            None => format!("request failed with status {status}"),
        };

        Self {
            status: Some(status),
            message,
        }
    }
}

/// Failures of one decode-triggered pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Step 1 failed; the run is aborted before any network call.
    #[error("check-in aborted: {0}")]
    Stop(#[from] CameraError),

    /// The reward-eligibility lookup failed. Recoverable: the message is
    /// shown, then scanning resumes.
    #[error("reward lookup failed: {0}")]
    Lookup(ApiError),

    /// The check-in submission failed. Same recovery policy as `Lookup`.
    #[error("check-in submission failed: {0}")]
    Submit(ApiError),
}
