//! Backend boundary: the two calls the scan workflow depends on.
//!
//! The concrete HTTP client lives in `tessera-backend-http`; tests use the
//! in-memory backend from `tessera-testing`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Answer of `GET accesses/reward_due_qr/{code}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDueResponse {
    /// Id of the customer the code resolved to.
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub reward_due: bool,
}

/// Body of `POST accesses/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub qr_code: String,
    /// Set when the preceding lookup said a reward is due, so the backend
    /// records the access as a redemption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<bool>,
    /// Backfill flag for imported historical accesses; never set by the
    /// scan workflow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<bool>,
}

impl CheckInRequest {
    pub fn new(qr_code: impl Into<String>) -> Self {
        Self {
            qr_code: qr_code.into(),
            reward: None,
            imported: None,
        }
    }

    pub fn with_reward(mut self, reward_due: bool) -> Self {
        self.reward = reward_due.then_some(true);
        self
    }
}

/// Answer of a successful `POST accesses/add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    #[serde(default)]
    pub message: String,
    pub customer: CustomerInfo,
}

/// Customer identity returned with a recorded check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl CustomerInfo {
    /// Human-readable "first last" form used in confirmation notices.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// The backend calls the pipeline sequences. Consumed, never implemented,
/// by the core.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read-only reward-eligibility lookup keyed by the scanned identifier.
    async fn reward_due(&self, qr_code: &str) -> Result<RewardDueResponse, ApiError>;

    /// Submit the check-in record for the scanned identifier.
    async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, ApiError>;
}
