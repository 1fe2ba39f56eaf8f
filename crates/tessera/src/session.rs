//! Camera session manager.
//!
//! Owns the single camera device handle: enumeration, selection persistence,
//! and scanner lifecycle. Everything else in the crate only talks to the
//! start/stop surface exposed here.

use std::sync::Arc;

use smallvec::SmallVec;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::bus::{Notice, NoticeBus};
use crate::core::ScanStatus;
use crate::error::CameraError;
use crate::scanner::{CameraDevice, DecodeHandler, Scanner, ScannerLoader, ScannerModule};
use crate::store::{KeyValueStore, SELECTED_CAMERA_KEY, SELECTION_EXPIRY_DAYS};

struct SessionState {
    status: ScanStatus,
    devices: SmallVec<[CameraDevice; 4]>,
    active_device_id: Option<String>,
    /// Bumped on teardown; in-flight pipeline runs compare against it and
    /// drop their result when it moved.
    generation: u64,
    module: Option<Arc<dyn ScannerModule>>,
    scanner: Option<Arc<dyn Scanner>>,
    handler: Option<DecodeHandler>,
}

/// Makes exactly one camera ready for scanning, remembering the user's last
/// choice across visits.
///
/// Created once per application load. All mutation of the scan session goes
/// through this type.
pub struct CameraManager {
    loader: Arc<dyn ScannerLoader>,
    store: Arc<dyn KeyValueStore>,
    notices: NoticeBus,
    display_target: String,
    selection_expiry_days: u32,
    state: Mutex<SessionState>,
}

impl CameraManager {
    pub fn new(
        loader: Arc<dyn ScannerLoader>,
        store: Arc<dyn KeyValueStore>,
        notices: NoticeBus,
        display_target: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            store,
            notices,
            display_target: display_target.into(),
            selection_expiry_days: SELECTION_EXPIRY_DAYS,
            state: Mutex::new(SessionState {
                status: ScanStatus::Uninitialized,
                devices: SmallVec::new(),
                active_device_id: None,
                generation: 0,
                module: None,
                scanner: None,
                handler: None,
            }),
        }
    }

    /// Override the expiry of the persisted camera selection.
    pub fn with_selection_expiry(mut self, days: u32) -> Self {
        self.selection_expiry_days = days;
        self
    }

    /// Load the scanning library (once), enumerate devices, resolve the
    /// active selection, bind the scanner and start decoding.
    ///
    /// The persisted device id is restored only if it still matches an
    /// enumerated device; otherwise the first device wins. Either way the
    /// *resolved* id is written back to the store.
    pub async fn initialize(&self, handler: DecodeHandler) -> Result<(), CameraError> {
        let mut state = self.state.lock().await;
        state.status = ScanStatus::Initializing;

        let module = match state.module.clone() {
            Some(module) => module,
            None => {
                debug!("loading scanner library");
                match self.loader.load().await {
                    Ok(module) => {
                        state.module = Some(module.clone());
                        module
                    }
                    Err(source) => {
                        state.status = ScanStatus::Uninitialized;
                        return Err(self.report(CameraError::LibraryLoad { source }));
                    }
                }
            }
        };

        let devices = match module.list_cameras().await {
            Ok(devices) if !devices.is_empty() => devices,
            Ok(_) => {
                state.status = ScanStatus::Uninitialized;
                return Err(self.report(CameraError::NoCamera));
            }
            Err(source) => {
                state.status = ScanStatus::Uninitialized;
                debug!(%source, "camera enumeration failed");
                return Err(self.report(CameraError::NoCamera));
            }
        };

        let resolved = match self.store.get(SELECTED_CAMERA_KEY) {
            Some(id) if devices.iter().any(|d| d.id == id) => id,
            Some(stale) => {
                debug!(%stale, "persisted camera no longer enumerated, falling back");
                devices[0].id.clone()
            }
            None => devices[0].id.clone(),
        };
        self.store
            .set(SELECTED_CAMERA_KEY, &resolved, self.selection_expiry_days);

        let scanner = module.bind(&self.display_target);
        info!(device = %resolved, "camera session ready");
        state.devices = devices.into_iter().collect();
        state.active_device_id = Some(resolved);
        state.scanner = Some(scanner);
        state.handler = Some(handler);
        state.status = ScanStatus::Ready;

        self.start_locked(&mut state).await
    }

    /// User-initiated device override.
    ///
    /// The id must match a currently enumerated device; a corrupted or stale
    /// id is rejected and the current selection stays active. On success the
    /// resolved id is persisted and, if scanning, the scanner moves to the
    /// new device.
    pub async fn select_device(&self, device_id: &str) -> Result<(), CameraError> {
        let mut state = self.state.lock().await;
        if !state.devices.iter().any(|d| d.id == device_id) {
            return Err(self.report(CameraError::DeviceSelection {
                device_id: device_id.to_string(),
            }));
        }

        self.store
            .set(SELECTED_CAMERA_KEY, device_id, self.selection_expiry_days);
        state.active_device_id = Some(device_id.to_string());
        info!(device = %device_id, "camera selection changed");

        if state.status == ScanStatus::Scanning {
            self.stop_locked(&mut state).await?;
            self.start_locked(&mut state).await?;
        }
        Ok(())
    }

    /// Resume continuous decode scanning with the handler given at
    /// initialization. No-op while already scanning.
    pub async fn restart(&self) -> Result<(), CameraError> {
        let mut state = self.state.lock().await;
        if state.status == ScanStatus::Scanning {
            return Ok(());
        }
        self.start_locked(&mut state).await
    }

    /// Halt active scanning. Idempotent: stopping a session that is not
    /// scanning is a no-op.
    pub async fn stop(&self) -> Result<(), CameraError> {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await
    }

    /// Navigate-away cleanup: invalidate in-flight pipeline runs, then stop
    /// scanning best-effort.
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        state.generation = state.generation.wrapping_add(1);
        let _ = self.stop_locked(&mut state).await;
        debug!(generation = state.generation, "scan session torn down");
    }

    pub async fn status(&self) -> ScanStatus {
        self.state.lock().await.status
    }

    pub async fn active_device_id(&self) -> Option<String> {
        self.state.lock().await.active_device_id.clone()
    }

    pub async fn devices(&self) -> Vec<CameraDevice> {
        self.state.lock().await.devices.to_vec()
    }

    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Whether a generation captured earlier still names the live session.
    pub async fn is_current(&self, generation: u64) -> bool {
        self.state.lock().await.generation == generation
    }

    async fn start_locked(&self, state: &mut SessionState) -> Result<(), CameraError> {
        let (Some(scanner), Some(device_id), Some(handler)) = (
            state.scanner.clone(),
            state.active_device_id.clone(),
            state.handler.clone(),
        ) else {
            return Err(self.report(CameraError::Start {
                source: anyhow::anyhow!("scan session is not initialized"),
            }));
        };

        match scanner.start(&device_id, handler).await {
            Ok(()) => {
                debug!(device = %device_id, "scanning");
                state.status = ScanStatus::Scanning;
                Ok(())
            }
            Err(source) => {
                state.status = ScanStatus::Stopped;
                Err(self.report(CameraError::Start { source }))
            }
        }
    }

    async fn stop_locked(&self, state: &mut SessionState) -> Result<(), CameraError> {
        if state.status != ScanStatus::Scanning {
            return Ok(());
        }
        let Some(scanner) = state.scanner.clone() else {
            return Ok(());
        };

        // Treated as stopped either way: a failed stop is reported and the
        // session stays retryable.
        state.status = ScanStatus::Stopped;
        match scanner.stop().await {
            Ok(()) => {
                debug!("scanning stopped");
                Ok(())
            }
            Err(source) => Err(self.report(CameraError::Stop { source })),
        }
    }

    /// Log the failure and surface it as a blocking error notice.
    fn report(&self, err: CameraError) -> CameraError {
        error!(%err, "camera session failure");
        self.notices.emit(Notice::error(err.to_string()));
        err
    }
}
