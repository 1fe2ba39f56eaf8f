//! Boundary traits for the scanning library.
//!
//! The real widget is loaded dynamically by the page that hosts the scan
//! view; the core only sees these traits. Implementations do arbitrary IO
//! and report failures as `anyhow::Error`; the session manager maps them
//! into the typed [`CameraError`](crate::CameraError) taxonomy.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// One enumerated camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Callback invoked with the decoded text of each successful decode.
pub type DecodeHandler = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Dynamic loader for the scanning library.
///
/// Loading happens at most once per session; a network or script failure is
/// terminal for the session.
#[async_trait]
pub trait ScannerLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<Arc<dyn ScannerModule>>;
}

/// Handle to the loaded scanning library.
#[async_trait]
pub trait ScannerModule: Send + Sync {
    /// Enumerate available camera devices. An empty list means no camera is
    /// usable and scanning cannot proceed.
    async fn list_cameras(&self) -> anyhow::Result<Vec<CameraDevice>>;

    /// Construct a scanner widget bound to the given display target.
    fn bind(&self, target: &str) -> Arc<dyn Scanner>;
}

/// A scanner widget bound to a display target.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Begin continuous decode scanning against `device_id`, invoking
    /// `on_decode` for each successful decode until stopped.
    async fn start(&self, device_id: &str, on_decode: DecodeHandler) -> anyhow::Result<()>;

    /// Halt active scanning.
    async fn stop(&self) -> anyhow::Result<()>;
}
