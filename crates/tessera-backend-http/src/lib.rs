//! HTTP implementation of the Tessera backend boundary.
//!
//! This crate provides the production `reqwest` implementation of the
//! `Backend` trait from the Tessera core.
//!
//! # Features
//!
//! - Bearer-token authentication for the guarded access routes
//! - Error-message precedence: structured `details` over raw body over a
//!   generic fallback, resolved through `ApiError::from_response`
//! - Utility endpoints for the customer/program glue views, beyond the
//!   scan workflow itself
//!
//! # Wire Contract
//!
//! ```text
//! GET  accesses/reward_due_qr/{code}   -> { customer_id, reward_due }
//! POST accesses/add { qr_code, .. }    -> { message, customer { name, last_name, email } }
//! GET  customers/all                   -> [ { id, name, last_name, .. } ]
//! POST customers/add { .. }            -> created customer
//! POST customers/send-qr-code { .. }   -> re-send a customer's code by email
//! ```
//!
//! Error responses carry `{ "details": .. }` (or the legacy `{ "error": .. }`).
//!
//! # Usage
//!
//! ```rust,ignore
//! use tessera_backend_http::HttpBackend;
//!
//! let backend = HttpBackend::new("https://kiosk.example")?
//!     .with_token("secret");
//!
//! // Use with the scan controller
//! let controller = ScanController::new(camera, Arc::new(backend), notices, router, delay);
//! ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tessera_core::{
    ApiError, Backend, CheckInRequest, CheckInResponse, KioskConfig, RewardDueResponse,
};
use tracing::debug;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// `reqwest`-backed implementation of the backend boundary.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend client against `base_url`.
    ///
    /// Fails only if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach the bearer token the guarded access routes require.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build a client from kiosk configuration.
    pub fn from_config(config: &KioskConfig) -> anyhow::Result<Self> {
        let mut backend = Self::new(config.base_url.clone())?;
        if let Some(token) = &config.api_token {
            backend = backend.with_token(token.clone());
        }
        Ok(backend)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.authorize(self.client.get(self.url(path)));
        Self::send(request).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        Self::send(request).await
    }

    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "backend call failed");
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        response
            .json()
            .await
            .map_err(|err| ApiError::transport(format!("malformed response: {err}")))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn reward_due(&self, qr_code: &str) -> Result<RewardDueResponse, ApiError> {
        self.get_json(&format!("accesses/reward_due_qr/{qr_code}"))
            .await
    }

    async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, ApiError> {
        self.post_json("accesses/add", request).await
    }
}

/// Utility endpoints for the customer/program glue views.
impl HttpBackend {
    /// Fetch the customer list behind the default view.
    pub async fn list_customers(&self) -> Result<Vec<CustomerRecord>, ApiError> {
        self.get_json("customers/all").await
    }

    /// Look up customers by name and/or last name.
    pub async fn search_customers(
        &self,
        name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Vec<CustomerRecord>, ApiError> {
        let mut request = self.client.get(self.url("customers/search"));
        if let Some(name) = name {
            request = request.query(&[("name", name)]);
        }
        if let Some(last_name) = last_name {
            request = request.query(&[("last_name", last_name)]);
        }
        Self::send(self.authorize(request)).await
    }

    /// Submit the new-customer form.
    pub async fn create_customer(
        &self,
        request: &CreateCustomerRequest,
    ) -> Result<CustomerRecord, ApiError> {
        self.post_json("customers/add", request).await
    }

    /// Re-send a customer's QR code by email.
    pub async fn send_qr_code(&self, customer_id: i64) -> Result<(), ApiError> {
        let body = serde_json::json!({ "id": customer_id });
        let request = self.authorize(
            self.client
                .post(self.url("customers/send-qr-code"))
                .json(&body),
        );
        let response = request.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        Ok(())
    }
}

/// One customer row of the list/search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

/// Body of the new-customer form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Program ids to enroll the customer into.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub programs: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_doubled_slashes() {
        let backend = HttpBackend::new("https://kiosk.example/").unwrap();
        assert_eq!(
            backend.url("/accesses/reward_due_qr/ABC"),
            "https://kiosk.example/accesses/reward_due_qr/ABC"
        );
        assert_eq!(backend.base_url(), "https://kiosk.example");
    }

    #[test]
    fn test_check_in_request_serializes_without_unset_flags() {
        let request = CheckInRequest::new("ABC123");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "qr_code": "ABC123" }));

        let redeeming = CheckInRequest::new("ABC123").with_reward(true);
        let json = serde_json::to_value(&redeeming).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "qr_code": "ABC123", "reward": true })
        );
    }
}
