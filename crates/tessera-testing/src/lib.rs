//! Testing utilities for the Tessera kiosk core.
//!
//! In-memory doubles for every boundary trait: a scriptable scanner stack,
//! a cookie jar with real expiry, a backend with queued responses and a
//! call log, a recording router, and a synchronous notice recorder.
//!
//! Everything records into `Arc<Mutex<Vec<..>>>`-style state with `get_*`
//! accessors, so tests assert on plain values.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tessera_core::{
    ApiError, Backend, CameraDevice, CheckInRequest, CheckInResponse, CustomerInfo, DecodeHandler,
    KeyValueStore, Notice, NoticeBus, RewardDueResponse, Router, Scanner, ScannerLoader,
    ScannerModule, View,
};
use tokio::sync::broadcast;

// ============================================================================
// Scanner stack
// ============================================================================

/// Loader that hands out a prepared module, or fails like a script error.
pub struct TestLoader {
    module: Option<Arc<TestModule>>,
    loads: AtomicUsize,
}

impl TestLoader {
    pub fn new(module: Arc<TestModule>) -> Self {
        Self {
            module: Some(module),
            loads: AtomicUsize::new(0),
        }
    }

    /// A loader whose `load` always fails.
    pub fn failing() -> Self {
        Self {
            module: None,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn get_load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScannerLoader for TestLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn ScannerModule>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.module {
            Some(module) => Ok(module.clone() as Arc<dyn ScannerModule>),
            None => anyhow::bail!("script failed to load"),
        }
    }
}

/// Loaded-library double: a fixed device list and one scanner for any
/// display target.
pub struct TestModule {
    cameras: Vec<CameraDevice>,
    scanner: Arc<TestScanner>,
}

impl TestModule {
    pub fn new(cameras: Vec<CameraDevice>, scanner: Arc<TestScanner>) -> Arc<Self> {
        Arc::new(Self { cameras, scanner })
    }
}

#[async_trait]
impl ScannerModule for TestModule {
    async fn list_cameras(&self) -> anyhow::Result<Vec<CameraDevice>> {
        Ok(self.cameras.clone())
    }

    fn bind(&self, _target: &str) -> Arc<dyn Scanner> {
        self.scanner.clone()
    }
}

/// Scanner double: records starts and stops, keeps the decode handler so
/// tests can fire decodes by hand.
#[derive(Default)]
pub struct TestScanner {
    starts: Mutex<Vec<String>>,
    stops: Mutex<usize>,
    handler: Mutex<Option<DecodeHandler>>,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
}

impl TestScanner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Device ids passed to `start`, in order.
    pub fn get_starts(&self) -> Vec<String> {
        self.starts.lock().unwrap().clone()
    }

    /// Number of `stop` calls, failed ones included.
    pub fn get_stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }

    /// Fire a decode through the handler given at the last `start`.
    pub async fn emit_decode(&self, decoded_text: &str) {
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(decoded_text.to_string()).await;
        }
    }
}

#[async_trait]
impl Scanner for TestScanner {
    async fn start(&self, device_id: &str, on_decode: DecodeHandler) -> anyhow::Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            anyhow::bail!("camera refused to start");
        }
        self.starts.lock().unwrap().push(device_id.to_string());
        *self.handler.lock().unwrap() = Some(on_decode);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        *self.stops.lock().unwrap() += 1;
        if self.fail_stop.load(Ordering::SeqCst) {
            anyhow::bail!("video track refused to stop");
        }
        Ok(())
    }
}

// ============================================================================
// Persistence
// ============================================================================

struct StoredEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory cookie jar honoring the expiry contract.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        let entry = self.entries.get(name)?;
        (entry.expires_at > Utc::now()).then(|| entry.value.clone())
    }

    fn set(&self, name: &str, value: &str, days: u32) {
        self.entries.insert(
            name.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: Utc::now() + chrono::Duration::days(i64::from(days)),
            },
        );
    }
}

// ============================================================================
// Backend
// ============================================================================

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    RewardDue(String),
    CheckIn(CheckInRequest),
}

/// Backend double with queued responses and a call log.
///
/// Responses are consumed in FIFO order; a call with nothing queued fails
/// with a transport-style error.
#[derive(Default)]
pub struct TestBackend {
    reward_responses: Mutex<VecDeque<Result<RewardDueResponse, ApiError>>>,
    check_in_responses: Mutex<VecDeque<Result<CheckInResponse, ApiError>>>,
    calls: Mutex<Vec<BackendCall>>,
    delay: Mutex<Option<Duration>>,
}

impl TestBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_reward_due(&self, response: Result<RewardDueResponse, ApiError>) {
        self.reward_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_check_in(&self, response: Result<CheckInResponse, ApiError>) {
        self.check_in_responses.lock().unwrap().push_back(response);
    }

    /// Hold every call for `delay` before answering, to open interleaving
    /// windows in tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn get_calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn hold(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn reward_due(&self, qr_code: &str) -> Result<RewardDueResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(BackendCall::RewardDue(qr_code.to_string()));
        self.hold().await;
        self.reward_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::transport("no reward_due response queued")))
    }

    async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(BackendCall::CheckIn(request.clone()));
        self.hold().await;
        self.check_in_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::transport("no check_in response queued")))
    }
}

/// Canned lookup answer.
pub fn reward_due_response(reward_due: bool) -> RewardDueResponse {
    RewardDueResponse {
        customer_id: Some(1),
        reward_due,
    }
}

/// Canned successful check-in for the given customer.
pub fn check_in_response(name: &str, last_name: &str) -> CheckInResponse {
    CheckInResponse {
        message: "Access granted".to_string(),
        customer: CustomerInfo {
            name: name.to_string(),
            last_name: last_name.to_string(),
            email: None,
        },
    }
}

// ============================================================================
// Router and notices
// ============================================================================

/// Router double recording every navigation.
#[derive(Default)]
pub struct TestRouter {
    navigations: Mutex<Vec<View>>,
}

impl TestRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get_navigations(&self) -> Vec<View> {
        self.navigations.lock().unwrap().clone()
    }
}

impl Router for TestRouter {
    fn navigate_to(&self, view: View) {
        self.navigations.lock().unwrap().push(view);
    }
}

/// Synchronous notice collector.
///
/// Notice emission is synchronous, so draining after the code under test
/// returns sees everything without spawning a task.
pub struct NoticeRecorder {
    rx: Mutex<broadcast::Receiver<Notice>>,
    seen: Mutex<Vec<Notice>>,
}

impl NoticeRecorder {
    pub fn attach(bus: &NoticeBus) -> Self {
        Self {
            rx: Mutex::new(bus.subscribe()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// All notices emitted so far, in order.
    pub fn drain(&self) -> Vec<Notice> {
        let mut rx = self.rx.lock().unwrap();
        let mut seen = self.seen.lock().unwrap();
        while let Ok(notice) = rx.try_recv() {
            seen.push(notice);
        }
        seen.clone()
    }
}
