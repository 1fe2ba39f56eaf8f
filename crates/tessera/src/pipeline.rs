//! Scan submission pipeline.
//!
//! Turns one decoded code into a durable check-in record with correct
//! ordering and user feedback, then resumes scanning or navigates away.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::{Backend, CheckInRequest};
use crate::bus::{Notice, NoticeBus};
use crate::core::CheckInAttempt;
use crate::error::PipelineError;
use crate::router::{Router, View};
use crate::session::CameraManager;

/// Where one decode-triggered run left the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Check-in recorded; the kiosk navigated to the customer list.
    Navigated,
    /// The attempt failed transiently; scanning resumed.
    Resumed,
    /// The camera could not be stopped or restarted; scanning stays halted.
    Stopped,
    /// The session was torn down mid-run; the result was dropped.
    Ignored,
}

/// The strictly ordered per-decode sequence: stop camera, look up reward
/// eligibility, submit the check-in, report, then resume or leave.
pub struct CheckInPipeline {
    camera: Arc<CameraManager>,
    backend: Arc<dyn Backend>,
    notices: NoticeBus,
    router: Arc<dyn Router>,
    resume_delay: Duration,
}

impl CheckInPipeline {
    pub fn new(
        camera: Arc<CameraManager>,
        backend: Arc<dyn Backend>,
        notices: NoticeBus,
        router: Arc<dyn Router>,
        resume_delay: Duration,
    ) -> Self {
        Self {
            camera,
            backend,
            notices,
            router,
            resume_delay,
        }
    }

    /// Run the full sequence for one decode event.
    ///
    /// Each step is awaited before the next; no two network calls for the
    /// same decode are ever in flight simultaneously.
    pub async fn handle_decode(
        &self,
        decoded_text: impl Into<String>,
    ) -> (CheckInAttempt, Disposition) {
        let mut attempt = CheckInAttempt::new(decoded_text);
        debug!(attempt = %attempt.id, code = %attempt.decoded_text, "decode captured");

        let generation = self.camera.generation().await;

        // The camera must be fully stopped before any network call, or a
        // spurious second decode could fire mid-submission.
        if let Err(err) = self.camera.stop().await {
            warn!(attempt = %attempt.id, %err, "aborting check-in");
            return (attempt.failed(err.to_string()), Disposition::Stopped);
        }

        // Eligibility is evaluated against the customer's state before the
        // access record is written, so lookup comes first.
        let lookup = match self.backend.reward_due(&attempt.decoded_text).await {
            Ok(lookup) => lookup,
            Err(err) => {
                return self
                    .recover(attempt, PipelineError::Lookup(err), generation)
                    .await;
            }
        };
        attempt.reward_due = Some(lookup.reward_due);

        let request = CheckInRequest::new(&attempt.decoded_text).with_reward(lookup.reward_due);
        let response = match self.backend.check_in(&request).await {
            Ok(response) => response,
            Err(err) => {
                return self
                    .recover(attempt, PipelineError::Submit(err), generation)
                    .await;
            }
        };

        if !self.camera.is_current(generation).await {
            debug!(attempt = %attempt.id, "session torn down mid-run, dropping result");
            return (attempt, Disposition::Ignored);
        }

        if lookup.reward_due {
            self.notices.emit(Notice::RewardDue);
        }
        let customer_name = response.customer.full_name();
        info!(attempt = %attempt.id, customer = %customer_name, "check-in recorded");
        self.notices
            .emit(Notice::success(format!("Access granted for {customer_name}")));

        // Leaving the scan view; the session is torn down by the caller.
        self.router.navigate_to(View::CustomerList);
        (attempt.succeeded(customer_name), Disposition::Navigated)
    }

    /// Recovery policy for lookup/submit failures: show the message, hold it
    /// for the resume delay, clear it and restart scanning. The attempt is
    /// abandoned, not retried.
    async fn recover(
        &self,
        attempt: CheckInAttempt,
        err: PipelineError,
        generation: u64,
    ) -> (CheckInAttempt, Disposition) {
        let message = match &err {
            PipelineError::Lookup(api) | PipelineError::Submit(api) => api.message.clone(),
            PipelineError::Stop(camera) => camera.to_string(),
        };
        warn!(attempt = %attempt.id, %err, "check-in attempt failed");
        self.notices.emit(Notice::error(message.clone()));

        tokio::time::sleep(self.resume_delay).await;

        if !self.camera.is_current(generation).await {
            debug!(attempt = %attempt.id, "session torn down during recovery");
            return (attempt.failed(message), Disposition::Ignored);
        }

        self.notices.emit(Notice::ClearStatus);
        match self.camera.restart().await {
            Ok(()) => (attempt.failed(message), Disposition::Resumed),
            // The manager already reported the restart failure.
            Err(_) => (attempt.failed(message), Disposition::Stopped),
        }
    }
}
