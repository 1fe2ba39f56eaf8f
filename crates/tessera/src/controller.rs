//! Scan view controller.
//!
//! Owns the decode queue between the scanner widget and the pipeline, and
//! drives the view's lifetime: enter, consume decodes one at a time, tear
//! down on navigation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::bus::NoticeBus;
use crate::error::CameraError;
use crate::pipeline::{CheckInPipeline, Disposition};
use crate::router::Router;
use crate::scanner::DecodeHandler;
use crate::session::CameraManager;

const DECODE_QUEUE_CAPACITY: usize = 8;

/// Entry point for the scan view.
pub struct ScanController {
    camera: Arc<CameraManager>,
    pipeline: CheckInPipeline,
    decode_tx: mpsc::Sender<String>,
    decode_rx: mpsc::Receiver<String>,
}

impl ScanController {
    pub fn new(
        camera: Arc<CameraManager>,
        backend: Arc<dyn Backend>,
        notices: NoticeBus,
        router: Arc<dyn Router>,
        resume_delay: Duration,
    ) -> Self {
        let (decode_tx, decode_rx) = mpsc::channel(DECODE_QUEUE_CAPACITY);
        let pipeline = CheckInPipeline::new(camera.clone(), backend, notices, router, resume_delay);
        Self {
            camera,
            pipeline,
            decode_tx,
            decode_rx,
        }
    }

    /// Handler the scanner invokes on each successful decode.
    ///
    /// Sends are lossy: a decode arriving while the queue is full is
    /// dropped, matching the at-most-once notice semantics.
    pub fn decode_handler(&self) -> DecodeHandler {
        let tx = self.decode_tx.clone();
        Arc::new(move |decoded_text: String| {
            let tx = tx.clone();
            Box::pin(async move {
                if let Err(err) = tx.try_send(decoded_text) {
                    debug!(%err, "dropping decode");
                }
            })
        })
    }

    /// Enter the scan view: initialize the camera session and start
    /// decoding.
    pub async fn enter(&self) -> Result<(), CameraError> {
        self.camera.initialize(self.decode_handler()).await
    }

    /// Consume decode events until a successful check-in navigates away,
    /// then tear the session down.
    ///
    /// Decodes are processed strictly one at a time; while a run is in
    /// flight the camera is stopped, so no second decode can arrive. If the
    /// user leaves the scan view by other means, the hosting page aborts
    /// this future and calls [`CameraManager::teardown`] itself.
    pub async fn run(mut self) {
        while let Some(decoded_text) = self.decode_rx.recv().await {
            let (attempt, disposition) = self.pipeline.handle_decode(decoded_text).await;
            info!(attempt = %attempt.id, ?disposition, "check-in attempt finished");
            if disposition == Disposition::Navigated {
                break;
            }
        }
        self.camera.teardown().await;
    }
}
