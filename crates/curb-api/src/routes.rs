//! # Routes
//!
//! Axum router configuration for the parking API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health
/// - GET  /api/v1/zones/{zone} - Zone rate schedule
/// - POST /api/v1/quotes - Price a duration
/// - POST /api/v1/sessions - Start a paid session from a quote
/// - GET  /api/v1/sessions - Caller's sessions
/// - PUT  /api/v1/sessions/{session_id}/reminder - Set or cancel a reminder
/// - GET  /api/v1/admin/reconciliation - Charged-but-not-debited attempts
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/zones/{zone}", get(handlers::get_zone))
        .route("/quotes", post(handlers::create_quote))
        .route(
            "/sessions",
            post(handlers::start_session).get(handlers::list_sessions),
        )
        .route("/sessions/{session_id}/reminder", put(handlers::set_reminder))
        .route("/admin/reconciliation", get(handlers::reconciliation));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppConfig, ServiceSettings};
    use async_trait::async_trait;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use curb_core::{
        ActivationRequest, FeeBreakdown, FixedTestCredentials, InMemoryWallet, NotificationQueue,
        ParkingError, ParkingResult, ParkingWindow, PriceRequest, RateVendor, ReminderTask,
        TimeBlock, TimeUnit, VendorConfirmation, VendorPriceResponse, ZoneInfo,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct StubVendor {
        activations: AtomicUsize,
    }

    #[async_trait]
    impl RateVendor for StubVendor {
        async fn get_zone_rates(&self, zone: &str) -> ParkingResult<ZoneInfo> {
            if zone != "4021" {
                return Err(ParkingError::not_found("zone", zone));
            }
            Ok(ZoneInfo {
                zone: zone.to_string(),
                name: "Main St".to_string(),
                location: None,
                default_time_block_id: 2,
                time_blocks: vec![TimeBlock {
                    id: 2,
                    unit: TimeUnit::Hours,
                    increment: 1,
                    max_quantity: 10,
                }],
                rates: Vec::new(),
            })
        }

        async fn quote_price(&self, request: &PriceRequest) -> ParkingResult<VendorPriceResponse> {
            let zone = self.get_zone_rates(&request.zone).await?;
            zone.validate_duration(request.time_unit, request.time_quantity, request.time_block_id)?;
            let start = Utc::now();
            Ok(VendorPriceResponse {
                zone: zone.zone,
                zone_location: None,
                time_unit: request.time_unit,
                time_quantity: request.time_quantity,
                time_block_id: request.time_block_id,
                fees: FeeBreakdown::new(200 * request.time_quantity as i64, 35),
                window: ParkingWindow::new(
                    start,
                    start + request.time_unit.duration(request.time_quantity),
                ),
            })
        }

        async fn activate(&self, request: ActivationRequest<'_>) -> ParkingResult<VendorConfirmation> {
            let n = self.activations.fetch_add(1, Ordering::SeqCst);
            Ok(VendorConfirmation {
                confirmation_id: format!("PV-{}", n),
                window: request.window,
                fees: FeeBreakdown::new(200, 35),
            })
        }

        fn vendor_name(&self) -> &'static str {
            "stub"
        }
    }

    #[derive(Default)]
    struct RecordingQueue {
        tasks: Mutex<Vec<ReminderTask>>,
    }

    impl NotificationQueue for RecordingQueue {
        fn enqueue(&self, task: ReminderTask) -> ParkingResult<()> {
            self.tasks
                .lock()
                .map_err(|_| ParkingError::Internal("queue lock".to_string()))?
                .push(task);
            Ok(())
        }
    }

    fn server(balance: i64) -> (TestServer, AppState) {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
        };
        let state = AppState::from_parts(
            config,
            ServiceSettings::default(),
            Arc::new(StubVendor {
                activations: AtomicUsize::new(0),
            }),
            Arc::new(InMemoryWallet::new().with_balance("user-1", balance)),
            Arc::new(FixedTestCredentials),
            Arc::new(RecordingQueue::default()),
        );
        let server = TestServer::new(create_router(state.clone())).unwrap();
        (server, state)
    }

    fn user(id: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static(id),
        )
    }

    async fn create_quote(server: &TestServer) -> Value {
        let response = server
            .post("/api/v1/quotes")
            .json(&json!({ "zone": "4021", "time_unit": "hours", "time_quantity": 1 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = server(0);
        let body = server.get("/health").await.json::<Value>();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["pricing_policy"], "stored_quote");
    }

    #[tokio::test]
    async fn test_unknown_zone() {
        let (server, _) = server(0);
        let response = server.get("/api/v1/zones/9999").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["code"], 404);
    }

    #[tokio::test]
    async fn test_quote_uses_default_block() {
        let (server, _) = server(0);
        let quote = create_quote(&server).await;
        assert_eq!(quote["time_block_id"], 2);
        assert_eq!(quote["total_price"], 235);
    }

    #[tokio::test]
    async fn test_start_session_and_list() {
        let (server, _) = server(1_000);
        let quote = create_quote(&server).await;

        let (name, value) = user("user-1");
        let response = server
            .post("/api/v1/sessions")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "quote_id": quote["id"],
                "vehicle_plate": "abc123",
                "vehicle_state": "tx"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let session = response.json::<Value>();
        assert_eq!(session["vehicle_plate"], "ABC123");
        assert_eq!(session["status"], "ON_GOING");

        let listed = server
            .get("/api/v1/sessions")
            .add_header(name, value)
            .await
            .json::<Value>();
        assert_eq!(listed["count"], 1);
    }

    #[tokio::test]
    async fn test_start_session_twice_conflicts() {
        let (server, _) = server(1_000);
        let quote = create_quote(&server).await;
        let body = json!({
            "quote_id": quote["id"],
            "vehicle_plate": "ABC123",
            "vehicle_state": "TX"
        });

        let (name, value) = user("user-1");
        server
            .post("/api/v1/sessions")
            .add_header(name.clone(), value.clone())
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/api/v1/sessions")
            .add_header(name, value)
            .json(&body)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_start_session_insufficient_funds() {
        let (server, _) = server(100);
        let quote = create_quote(&server).await;

        let (name, value) = user("user-1");
        server
            .post("/api/v1/sessions")
            .add_header(name, value)
            .json(&json!({
                "quote_id": quote["id"],
                "vehicle_plate": "ABC123",
                "vehicle_state": "TX"
            }))
            .await
            .assert_status(StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_missing_user_header() {
        let (server, _) = server(1_000);
        server
            .get("/api/v1/sessions")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reminder_foreign_session_is_not_found() {
        let (server, _) = server(1_000);
        let quote = create_quote(&server).await;

        let (name, value) = user("user-1");
        let session = server
            .post("/api/v1/sessions")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "quote_id": quote["id"],
                "vehicle_plate": "ABC123",
                "vehicle_state": "TX"
            }))
            .await
            .json::<Value>();
        let path = format!(
            "/api/v1/sessions/{}/reminder",
            session["id"].as_str().unwrap_or_default()
        );

        let (other, other_value) = user("user-2");
        server
            .put(&path)
            .add_header(other, other_value)
            .json(&json!({ "alert_before_minutes": 15 }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let updated = server
            .put(&path)
            .add_header(name, value)
            .json(&json!({ "alert_before_minutes": 15 }))
            .await
            .json::<Value>();
        assert_eq!(updated["alert_before_minutes"], 15);
        assert!(updated["alert_at_utc"].is_string());
    }

    #[tokio::test]
    async fn test_reconciliation_empty() {
        let (server, state) = server(1_000);
        let body = server
            .get("/api/v1/admin/reconciliation")
            .await
            .json::<Value>();
        assert_eq!(body["count"], 0);

        let scan = state
            .scanner
            .check_expired_events(Utc::now() + Duration::hours(2))
            .await
            .unwrap();
        assert!(scan.is_empty());
    }
}
