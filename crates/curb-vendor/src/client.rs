//! # Rate Vendor Client
//!
//! HTTP implementation of `RateVendor`. Zone and price lookups retry
//! transient failures; activation is sent exactly once.

use crate::config::VendorConfig;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use curb_core::{
    dollars_to_cents, ActivationRequest, FeeBreakdown, GeoPoint, ParkingError, ParkingResult,
    ParkingWindow, PriceRequest, RateLine, RateVendor, TimeBlock, TimeUnit, VendorConfirmation,
    VendorPriceResponse, ZoneInfo,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use zeroize::Zeroizing;

/// Room for an activation body without reallocating
const ACTIVATION_BODY_CAPACITY: usize = 1024;

/// Rate vendor over HTTP
pub struct HttpRateVendor {
    config: VendorConfig,
    client: Client,
    retry: RetryPolicy,
}

impl HttpRateVendor {
    /// Create a new vendor client
    pub fn new(config: VendorConfig) -> ParkingResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ParkingError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> ParkingResult<Self> {
        Self::new(VendorConfig::from_env()?)
    }

    /// Builder: retry policy for zone and price lookups
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL plus percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> ParkingResult<Url> {
        endpoint(&self.config.api_base_url, segments)
    }

    /// Send one request and decode the body; no retries here.
    async fn send<T>(&self, method: Method, url: Url, body: Option<Bytes>) -> ParkingResult<T>
    where
        T: DeserializeOwned,
    {
        let path = url.path().to_string();
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, self.config.auth_header());
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        debug!(%method, path = %path, status = status.as_u16(), "Vendor response");

        if !status.is_success() {
            return Err(vendor_error(status, &text, &path));
        }

        serde_json::from_str(&text).map_err(|e| {
            ParkingError::Serialization(format!("Failed to parse vendor response: {}", e))
        })
    }

    async fn fetch_zone(&self, zone: &str) -> ParkingResult<ZoneInfo> {
        let url = self.endpoint(&["v1", "zones", zone_segment(zone)?])?;
        let wire: VendorZoneResponse = self
            .retry
            .retry_if(
                "zone lookup",
                |_| self.send(Method::GET, url.clone(), None),
                ParkingError::is_retryable,
            )
            .await?;
        wire.into_zone_info(zone, self.config.default_time_block_id)
    }
}

#[async_trait]
impl RateVendor for HttpRateVendor {
    #[instrument(skip(self))]
    async fn get_zone_rates(&self, zone: &str) -> ParkingResult<ZoneInfo> {
        self.fetch_zone(zone).await
    }

    #[instrument(skip(self), fields(zone = %request.zone))]
    async fn quote_price(&self, request: &PriceRequest) -> ParkingResult<VendorPriceResponse> {
        let zone = self.fetch_zone(&request.zone).await?;
        zone.validate_duration(request.time_unit, request.time_quantity, request.time_block_id)?;

        let url = self.endpoint(&["v1", "zones", zone_segment(&request.zone)?, "price"])?;
        let body = Bytes::from(json_body(&VendorPriceRequest {
            time_unit: request.time_unit,
            time_quantity: request.time_quantity,
            time_block_id: request.time_block_id,
        })?);
        let wire: VendorPriceBody = self
            .retry
            .retry_if(
                "price lookup",
                |_| self.send(Method::POST, url.clone(), Some(body.clone())),
                ParkingError::is_retryable,
            )
            .await?;

        let fees = FeeBreakdown::new(
            fee_cents("parking_fee", wire.parking_fee)?,
            fee_cents("transaction_fee", wire.transaction_fee)?,
        );
        let window = wire.window()?;

        debug!(total = fees.total, "Vendor price");

        Ok(VendorPriceResponse {
            zone: zone.zone,
            zone_location: zone.location,
            time_unit: request.time_unit,
            time_quantity: request.time_quantity,
            time_block_id: request.time_block_id,
            fees,
            window,
        })
    }

    #[instrument(skip_all, fields(zone = %request.zone, plate = %request.vehicle.plate))]
    async fn activate(&self, request: ActivationRequest<'_>) -> ParkingResult<VendorConfirmation> {
        let instrument = request.instrument;
        let url = self.endpoint(&["v1", "parking", "activate"])?;
        let body = card_body(&VendorActivateRequest {
            zone: request.zone,
            time_unit: request.time_unit,
            time_quantity: request.time_quantity,
            time_block_id: request.time_block_id,
            start_time_utc: request.window.start,
            stop_time_utc: request.window.end,
            vehicle: VendorVehicle {
                plate: &request.vehicle.plate,
                state: &request.vehicle.state,
            },
            card: VendorCard {
                number: instrument.card_number(),
                exp_month: instrument.expiry_month(),
                exp_year: instrument.expiry_year(),
                cvv: instrument.cvv(),
                name: instrument.holder_name(),
                postal_code: instrument.postal_code(),
            },
        })?;

        info!(
            card = %instrument,
            start = %request.window.start,
            stop = %request.window.end,
            "Activating parking with vendor"
        );

        // Exactly one send: a repeat may bill a second session.
        let wire: VendorActivateBody = self
            .send(Method::POST, url, Some(body))
            .await
            .map_err(|e| {
                error!(error = %e, "Vendor activation failed");
                e
            })?;

        let window = wire.window()?;
        info!(confirmation = %wire.confirmation_id, "Vendor activation confirmed");

        Ok(VendorConfirmation {
            confirmation_id: wire.confirmation_id,
            window,
            fees: FeeBreakdown::new(
                fee_cents("parking_fee", wire.parking_fee)?,
                fee_cents("transaction_fee", wire.transaction_fee)?,
            ),
        })
    }

    fn vendor_name(&self) -> &'static str {
        "http-vendor"
    }
}

/// Append percent-encoded `segments` to `base`
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> ParkingResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| ParkingError::Configuration(format!("invalid base URL {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ParkingError::Configuration(format!("base URL {} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Zone ids are vendor zone numbers: ASCII letters, digits, `-` and `_`.
fn zone_segment(zone: &str) -> ParkingResult<&str> {
    let valid = !zone.is_empty()
        && zone
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ParkingError::Validation(format!("invalid zone id: {:?}", zone)));
    }
    Ok(zone)
}

/// Vendor amounts are non-negative dollars
fn fee_cents(field: &str, amount: f64) -> ParkingResult<i64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ParkingError::Serialization(format!(
            "vendor sent an invalid {}: {}",
            field, amount
        )));
    }
    Ok(dollars_to_cents(amount))
}

fn json_body<B: Serialize>(body: &B) -> ParkingResult<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|e| ParkingError::Serialization(format!("Failed to encode vendor request: {}", e)))
}

/// Request body holding card data; wiped when reqwest releases it.
struct CardBody(Zeroizing<Vec<u8>>);

impl AsRef<[u8]> for CardBody {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn card_body<B: Serialize>(body: &B) -> ParkingResult<Bytes> {
    let mut buf = Zeroizing::new(Vec::with_capacity(ACTIVATION_BODY_CAPACITY));
    serde_json::to_writer(&mut *buf, body)
        .map_err(|e| ParkingError::Serialization(format!("Failed to encode vendor request: {}", e)))?;
    Ok(Bytes::from_owner(CardBody(buf)))
}

fn transport_error(e: reqwest::Error) -> ParkingError {
    if e.is_timeout() {
        ParkingError::VendorUnavailable("vendor request timed out".to_string())
    } else {
        ParkingError::VendorUnavailable(format!("vendor request failed: {}", e))
    }
}

fn vendor_error(status: StatusCode, body: &str, path: &str) -> ParkingError {
    let message = serde_json::from_str::<VendorErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    error!(status = status.as_u16(), path, body, "Vendor API error");

    match status {
        StatusCode::NOT_FOUND => ParkingError::NotFound {
            entity: "zone",
            id: path.to_string(),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ParkingError::Validation(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ParkingError::Configuration(format!("vendor rejected credentials: {}", message))
        }
        _ => ParkingError::VendorUnavailable(message),
    }
}

// =============================================================================
// Vendor API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct VendorZoneResponse {
    #[serde(default)]
    zone_number: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    default_time_block_id: Option<i64>,
    #[serde(default)]
    time_blocks: Option<Vec<VendorTimeBlock>>,
    #[serde(default)]
    rates: Option<Vec<VendorRate>>,
}

impl VendorZoneResponse {
    fn into_zone_info(self, requested: &str, advertised_default: i64) -> ParkingResult<ZoneInfo> {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };
        let rates = self
            .rates
            .unwrap_or_default()
            .into_iter()
            .map(|r| -> ParkingResult<RateLine> {
                Ok(RateLine {
                    amount: fee_cents("rate amount", r.amount)?,
                    description: r.description,
                    unit: r.unit,
                })
            })
            .collect::<ParkingResult<Vec<_>>>()?;
        let mut zone = ZoneInfo {
            zone: self.zone_number.unwrap_or_else(|| requested.to_string()),
            name: self.name.unwrap_or_default(),
            location,
            default_time_block_id: self.default_time_block_id.unwrap_or(advertised_default),
            time_blocks: self
                .time_blocks
                .unwrap_or_default()
                .into_iter()
                .map(|b| TimeBlock {
                    id: b.id,
                    unit: b.unit,
                    increment: b.increment.unwrap_or(1),
                    max_quantity: b.max_quantity.unwrap_or(0),
                })
                .collect(),
            rates,
        };
        zone.normalize_default_block(advertised_default);
        Ok(zone)
    }
}

#[derive(Debug, Deserialize)]
struct VendorTimeBlock {
    id: i64,
    unit: TimeUnit,
    #[serde(default)]
    increment: Option<u32>,
    #[serde(default)]
    max_quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VendorRate {
    description: String,
    amount: f64,
    unit: TimeUnit,
}

#[derive(Debug, Serialize)]
struct VendorPriceRequest {
    time_unit: TimeUnit,
    time_quantity: u32,
    time_block_id: i64,
}

#[derive(Debug, Deserialize)]
struct VendorPriceBody {
    parking_fee: f64,
    transaction_fee: f64,
    start_time_utc: DateTime<Utc>,
    stop_time_utc: DateTime<Utc>,
}

impl VendorPriceBody {
    fn window(&self) -> ParkingResult<ParkingWindow> {
        checked_window(self.start_time_utc, self.stop_time_utc)
    }
}

#[derive(Serialize)]
struct VendorActivateRequest<'a> {
    zone: &'a str,
    time_unit: TimeUnit,
    time_quantity: u32,
    time_block_id: i64,
    start_time_utc: DateTime<Utc>,
    stop_time_utc: DateTime<Utc>,
    vehicle: VendorVehicle<'a>,
    card: VendorCard<'a>,
}

#[derive(Serialize)]
struct VendorVehicle<'a> {
    plate: &'a str,
    state: &'a str,
}

/// Never derive `Debug` here.
#[derive(Serialize)]
struct VendorCard<'a> {
    number: &'a str,
    exp_month: &'a str,
    exp_year: &'a str,
    cvv: &'a str,
    name: &'a str,
    postal_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct VendorActivateBody {
    confirmation_id: String,
    start_time_utc: DateTime<Utc>,
    stop_time_utc: DateTime<Utc>,
    #[serde(default)]
    parking_fee: f64,
    #[serde(default)]
    transaction_fee: f64,
}

impl VendorActivateBody {
    fn window(&self) -> ParkingResult<ParkingWindow> {
        checked_window(self.start_time_utc, self.stop_time_utc)
    }
}

#[derive(Debug, Deserialize)]
struct VendorErrorResponse {
    error: VendorErrorDetail,
}

#[derive(Debug, Deserialize)]
struct VendorErrorDetail {
    message: String,
}

fn checked_window(start: DateTime<Utc>, stop: DateTime<Utc>) -> ParkingResult<ParkingWindow> {
    if stop <= start {
        return Err(ParkingError::Serialization(format!(
            "vendor window ends before it starts: {} .. {}",
            start, stop
        )));
    }
    Ok(ParkingWindow::new(start, stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curb_core::{CredentialProvider, FixedTestCredentials, Vehicle};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn zone_body() -> serde_json::Value {
        json!({
            "zone_number": "4021",
            "name": "Main St",
            "latitude": 29.76,
            "longitude": -95.36,
            "default_time_block_id": 2,
            "time_blocks": [
                { "id": 1, "unit": "minutes", "increment": 15, "max_quantity": 120 },
                { "id": 2, "unit": "hours", "increment": 1, "max_quantity": 10 }
            ],
            "rates": [
                { "description": "$2.00 per hour", "amount": 2.0, "unit": "hours" }
            ]
        })
    }

    async fn vendor(server: &MockServer) -> HttpRateVendor {
        HttpRateVendor::new(
            VendorConfig::new(server.uri(), "tok_test").with_default_time_block(2),
        )
        .unwrap()
        .with_retry(RetryPolicy::new(3, 1, 5, 0.0))
    }

    #[tokio::test]
    async fn test_zone_rates_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/4022"))
            .and(header("Authorization", "Bearer tok_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "zone_number": "4022",
                "default_time_block_id": 77,
                "time_blocks": null
            })))
            .mount(&server)
            .await;

        let zone = vendor(&server).await.get_zone_rates("4022").await.unwrap();
        assert!(zone.rates.is_empty());
        assert!(zone.time_blocks.is_empty());
        assert_eq!(zone.default_time_block_id, 2);
        assert_eq!(zone.name, "");
    }

    #[tokio::test]
    async fn test_unknown_zone_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "message": "zone not found" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = vendor(&server).await.get_zone_rates("nope").await.unwrap_err();
        assert!(matches!(err, ParkingError::NotFound { entity: "zone", .. }));
    }

    #[tokio::test]
    async fn test_zone_lookup_retries_5xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/4021"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/4021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_body()))
            .mount(&server)
            .await;

        let zone = vendor(&server).await.get_zone_rates("4021").await.unwrap();
        assert_eq!(zone.time_blocks.len(), 2);
        assert_eq!(zone.rates[0].amount, 200);
        assert_eq!(zone.location, Some(GeoPoint { lat: 29.76, lng: -95.36 }));
    }

    #[tokio::test]
    async fn test_quote_price_totals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/4021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/zones/4021/price"))
            .and(body_partial_json(json!({ "time_unit": "hours", "time_quantity": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parking_fee": 4.0,
                "transaction_fee": 0.35,
                "start_time_utc": "2026-10-18T15:00:00Z",
                "stop_time_utc": "2026-10-18T17:00:00Z"
            })))
            .mount(&server)
            .await;

        let response = vendor(&server)
            .await
            .quote_price(&PriceRequest {
                zone: "4021".to_string(),
                time_unit: TimeUnit::Hours,
                time_quantity: 2,
                time_block_id: 2,
            })
            .await
            .unwrap();

        assert_eq!(response.fees.parking_fee, 400);
        assert_eq!(response.fees.transaction_fee, 35);
        assert_eq!(
            response.fees.total,
            response.fees.parking_fee + response.fees.transaction_fee
        );
        assert_eq!(
            response.window.end - response.window.start,
            chrono::Duration::hours(2)
        );
        assert!(response.zone_location.is_some());
    }

    #[tokio::test]
    async fn test_quote_price_rejects_granularity_without_pricing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/4021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/zones/4021/price"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = vendor(&server)
            .await
            .quote_price(&PriceRequest {
                zone: "4021".to_string(),
                time_unit: TimeUnit::Minutes,
                time_quantity: 20,
                time_block_id: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_activate_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/parking/activate"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let instrument = FixedTestCredentials.payment_instrument().await.unwrap();
        let vehicle = Vehicle::new("ABC123", "TX");
        let start = Utc::now();
        let err = vendor(&server)
            .await
            .activate(ActivationRequest {
                zone: "4021",
                time_unit: TimeUnit::Hours,
                time_quantity: 1,
                time_block_id: 2,
                window: ParkingWindow::new(start, start + chrono::Duration::hours(1)),
                vehicle: &vehicle,
                instrument: &instrument,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::VendorUnavailable(_)));
    }

    #[tokio::test]
    async fn test_activate_returns_vendor_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/parking/activate"))
            .and(body_partial_json(json!({
                "zone": "4021",
                "vehicle": { "plate": "ABC123", "state": "TX" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "confirmation_id": "PV-778812",
                "start_time_utc": "2026-10-18T15:01:00Z",
                "stop_time_utc": "2026-10-18T16:01:00Z",
                "parking_fee": 2.0,
                "transaction_fee": 0.35
            })))
            .expect(1)
            .mount(&server)
            .await;

        let instrument = FixedTestCredentials.payment_instrument().await.unwrap();
        let vehicle = Vehicle::new("abc123", "tx");
        let start = "2026-10-18T15:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let confirmation = vendor(&server)
            .await
            .activate(ActivationRequest {
                zone: "4021",
                time_unit: TimeUnit::Hours,
                time_quantity: 1,
                time_block_id: 2,
                window: ParkingWindow::new(start, start + chrono::Duration::hours(1)),
                vehicle: &vehicle,
                instrument: &instrument,
            })
            .await
            .unwrap();

        assert_eq!(confirmation.confirmation_id, "PV-778812");
        assert_eq!(confirmation.window.start, start + chrono::Duration::minutes(1));
        assert_eq!(confirmation.fees.total, 235);
    }

    #[tokio::test]
    async fn test_request_timeout_is_vendor_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(zone_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let vendor = HttpRateVendor::new(
            VendorConfig::new(server.uri(), "tok_test").with_timeout(Duration::from_millis(50)),
        )
        .unwrap()
        .with_retry(RetryPolicy::none());

        let err = vendor.get_zone_rates("slow").await.unwrap_err();
        assert!(matches!(err, ParkingError::VendorUnavailable(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_zone_id_cannot_leave_its_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_body()))
            .expect(0)
            .mount(&server)
            .await;

        let vendor = vendor(&server).await;
        for zone in ["../parking/activate", "4021?x=1", "40 21", ""] {
            let err = vendor.get_zone_rates(zone).await.unwrap_err();
            assert!(matches!(err, ParkingError::Validation(_)), "zone {:?}", zone);
        }
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint("https://vendor.example/api/", &["v1", "wallets", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/api/v1/wallets/a%2Fb%20c");

        let err = endpoint("not a url", &["v1"]).unwrap_err();
        assert!(matches!(err, ParkingError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_negative_vendor_fee_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/zones/4021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/zones/4021/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parking_fee": -4.0,
                "transaction_fee": 0.35,
                "start_time_utc": "2026-10-18T15:00:00Z",
                "stop_time_utc": "2026-10-18T17:00:00Z"
            })))
            .mount(&server)
            .await;

        let err = vendor(&server)
            .await
            .quote_price(&PriceRequest {
                zone: "4021".to_string(),
                time_unit: TimeUnit::Hours,
                time_quantity: 2,
                time_block_id: 2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Serialization(ref m) if m.contains("parking_fee")));
    }

    #[test]
    fn test_fee_cents_rejects_non_finite() {
        assert_eq!(fee_cents("parking_fee", 4.35).unwrap(), 435);
        assert_eq!(fee_cents("parking_fee", 0.0).unwrap(), 0);
        for bad in [f64::NAN, f64::INFINITY, -0.01] {
            assert!(matches!(
                fee_cents("parking_fee", bad),
                Err(ParkingError::Serialization(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_activation_body_is_json_with_card() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/parking/activate"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(json!({
                "card": { "number": FixedTestCredentials::CARD_NUMBER, "cvv": "123" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "confirmation_id": "PV-1",
                "start_time_utc": "2026-10-18T15:00:00Z",
                "stop_time_utc": "2026-10-18T16:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let instrument = FixedTestCredentials.payment_instrument().await.unwrap();
        let vehicle = Vehicle::new("ABC123", "TX");
        let start = "2026-10-18T15:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let confirmation = vendor(&server)
            .await
            .activate(ActivationRequest {
                zone: "4021",
                time_unit: TimeUnit::Hours,
                time_quantity: 1,
                time_block_id: 2,
                window: ParkingWindow::new(start, start + chrono::Duration::hours(1)),
                vehicle: &vehicle,
                instrument: &instrument,
            })
            .await
            .unwrap();
        assert_eq!(confirmation.confirmation_id, "PV-1");
        assert_eq!(confirmation.fees.total, 0);
    }
}
