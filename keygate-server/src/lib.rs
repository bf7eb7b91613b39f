//! HTTP boundary for the Keygate access-key service.
//!
//! Thin wrappers only: request/response JSON shapes, header extraction, and
//! status-code mapping. All gate logic lives in `keygate-core`.
//!
//! Status codes: 401 is reserved for signature/timestamp failures, 200
//! carries every semantic outcome (valid or not), 400 flags malformed
//! input, 500 internal faults.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use keygate_core::{GateError, Gatekeeper, ValidationRequest, ValidationResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// Service banner name.
pub const SERVICE_NAME: &str = "Keygate Access API";

/// Header carrying the client's request timestamp.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
/// Header carrying the client's request signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Shared application state.
pub struct AppState {
    /// The validation orchestrator and all gate state.
    pub gatekeeper: Gatekeeper,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Creates fresh state around a gatekeeper.
    pub fn new(gatekeeper: Gatekeeper) -> Self {
        Self {
            gatekeeper,
            started_at: Instant::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GenerateRequest {
    /// Device fingerprint to bind the new key to, if any.
    pub hwid: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ValidateRequestBody {
    pub key: String,
    pub player_id: String,
    pub hwid: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub active_keys: usize,
    pub total_generated: usize,
    pub uptime_secs: u64,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ServiceInfo {
    pub status: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            "/validate".to_string(),
            "/generate".to_string(),
            "/status".to_string(),
        ],
    })
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<GenerateRequest>>,
) -> (StatusCode, Json<GenerateResponse>) {
    let Json(body) = body.unwrap_or_default();
    let now = chrono::Utc::now().timestamp();

    match state.gatekeeper.issue_key(body.hwid.as_deref(), now).await {
        Ok(record) => (
            StatusCode::OK,
            Json(GenerateResponse {
                success: true,
                key: Some(record.key),
                message: Some("key generated".to_string()),
            }),
        ),
        Err(GateError::InvalidInput(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(GenerateResponse {
                success: false,
                key: None,
                message: Some(reason),
            }),
        ),
        Err(err) => {
            error!("key generation failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateResponse {
                    success: false,
                    key: None,
                    message: Some("generation failed".to_string()),
                }),
            )
        }
    }
}

async fn validate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ValidateRequestBody>,
) -> (StatusCode, Json<ValidateResponse>) {
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let now = chrono::Utc::now().timestamp();

    let result = state
        .gatekeeper
        .validate(
            ValidationRequest {
                key: &body.key,
                player_id: &body.player_id,
                hwid: body.hwid.as_deref(),
                timestamp,
                signature,
            },
            now,
        )
        .await;

    match result {
        ValidationResult::Valid { expires_in, kind } => (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                expires_in: Some(expires_in),
                message: Some(kind.message().to_string()),
                error: None,
            }),
        ),
        ValidationResult::Rejected(rejection) => {
            let status = if rejection.is_auth_failure() {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::OK
            };
            (
                status,
                Json(ValidateResponse {
                    valid: false,
                    expires_in: None,
                    message: None,
                    error: Some(rejection.reason().to_string()),
                }),
            )
        }
    }
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.gatekeeper.snapshot().await;
    Json(StatusResponse {
        status: "running".to_string(),
        service: SERVICE_NAME.to_string(),
        active_keys: snapshot.active_sessions,
        total_generated: snapshot.issued_keys,
        uptime_secs: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Builds the HTTP API router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/generate", post(generate_handler))
        .route("/validate", post(validate_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}
