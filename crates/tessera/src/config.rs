//! Kiosk configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::SELECTION_EXPIRY_DAYS;

/// Wiring knobs for the kiosk, deserializable from whatever config source
/// the hosting binary uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Base URL of the loyalty backend.
    pub base_url: String,
    /// Bearer token for the access routes, when the backend requires one.
    pub api_token: Option<String>,
    /// Id of the DOM element the scanner widget renders into.
    pub display_target: String,
    /// How long a lookup/submit failure message stays up before scanning
    /// resumes.
    pub resume_delay_ms: u64,
    /// Expiry of the persisted camera selection, in days.
    pub selection_expiry_days: u32,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_token: None,
            display_target: "reader".to_string(),
            resume_delay_ms: 1000,
            selection_expiry_days: SELECTION_EXPIRY_DAYS,
        }
    }
}

impl KioskConfig {
    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}
