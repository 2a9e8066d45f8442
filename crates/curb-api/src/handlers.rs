//! # Request Handlers
//!
//! Axum request handlers for the parking API.
//! The caller is identified by the `X-User-Id` header set upstream.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use curb_core::{ParkingError, PriceRequest, Quote, Session, TimeUnit, Vehicle, ZoneInfo};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create quote request
#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub zone: String,
    pub time_unit: TimeUnit,
    pub time_quantity: u32,
    /// Defaults to the zone's default time block
    #[serde(default)]
    pub time_block_id: Option<i64>,
}

/// Start session request
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub quote_id: Uuid,
    pub vehicle_plate: String,
    pub vehicle_state: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "wallet".to_string()
}

/// Set or cancel a reminder
#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    /// Zero cancels the reminder
    pub alert_before_minutes: u32,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn parking_error_to_response(err: ParkingError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);
    if let ParkingError::PaymentInconsistency { session_id, .. } = &err {
        response = response.with_details(format!(
            "vendor charge recorded; session {} is pending reconciliation",
            session_id
        ));
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Missing X-User-Id header", 401)),
            )
        })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "curbside",
        "environment": state.config.environment,
        "pricing_policy": state.orchestrator.policy().as_str(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Zone rate schedule
pub async fn get_zone(
    State(state): State<AppState>,
    Path(zone): Path<String>,
) -> Result<Json<ZoneInfo>, ApiError> {
    let info = state
        .orchestrator
        .get_zone_rates(&zone)
        .await
        .map_err(parking_error_to_response)?;
    Ok(Json(info))
}

/// Price a duration and store the quote
#[instrument(skip(state, request), fields(zone = %request.zone))]
pub async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let time_block_id = match request.time_block_id {
        Some(id) => id,
        None => {
            state
                .orchestrator
                .get_zone_rates(&request.zone)
                .await
                .map_err(parking_error_to_response)?
                .default_time_block_id
        }
    };

    let quote = state
        .orchestrator
        .quote_price(PriceRequest {
            zone: request.zone,
            time_unit: request.time_unit,
            time_quantity: request.time_quantity,
            time_block_id,
        })
        .await
        .map_err(parking_error_to_response)?;

    Ok((StatusCode::CREATED, Json(quote)))
}

/// Consume a quote and start a paid session
#[instrument(skip(state, headers, request), fields(quote_id = %request.quote_id))]
pub async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let user_id = user_id(&headers)?;
    let vehicle = Vehicle::new(request.vehicle_plate, request.vehicle_state);
    if vehicle.plate.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("vehicle_plate is required", 400)),
        ));
    }

    let session = state
        .orchestrator
        .start_session(&user_id, request.quote_id, &vehicle, &request.payment_method)
        .await
        .map_err(|e| {
            error!("Failed to start session: {}", e);
            parking_error_to_response(e)
        })?;

    info!(session_id = %session.id, "Started session");
    Ok((StatusCode::CREATED, Json(session)))
}

/// Sessions owned by the caller
pub async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let sessions = state
        .orchestrator
        .sessions_for_user(&user_id)
        .await
        .map_err(parking_error_to_response)?;

    Ok(Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    })))
}

/// Set or cancel the caller's reminder on a session
#[instrument(skip(state, headers, request), fields(session_id = %session_id))]
pub async fn set_reminder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ReminderRequest>,
) -> Result<Json<Session>, ApiError> {
    let user_id = user_id(&headers)?;
    let session = state
        .scanner
        .set_reminder(&user_id, session_id, request.alert_before_minutes, Utc::now())
        .await
        .map_err(parking_error_to_response)?;
    Ok(Json(session))
}

/// Attempts where the vendor charged but the wallet was not debited
pub async fn reconciliation(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let attempts = state
        .orchestrator
        .pending_reconciliation()
        .await
        .map_err(parking_error_to_response)?;

    if !attempts.is_empty() {
        warn!(count = attempts.len(), "Attempts pending reconciliation");
    }

    Ok(Json(serde_json::json!({
        "count": attempts.len(),
        "attempts": attempts,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_parking_error_conversion() {
        let (status, _json) = parking_error_to_response(ParkingError::InsufficientFunds {
            required: 435,
            available: 100,
        });
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

        let (status, _json) =
            parking_error_to_response(ParkingError::Validation("Bad data".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_inconsistency_has_details() {
        let (_, Json(body)) = parking_error_to_response(ParkingError::PaymentInconsistency {
            session_id: Uuid::nil(),
            quote_id: Uuid::nil(),
            reason: "debit failed".to_string(),
        });
        assert!(body.details.is_some());
    }

    #[test]
    fn test_user_id_header() {
        let mut headers = HeaderMap::new();
        assert!(user_id(&headers).is_err());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert!(user_id(&headers).is_err());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-1"));
        assert_eq!(user_id(&headers).unwrap(), "user-1");
    }
}
