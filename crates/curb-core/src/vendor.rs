//! # Rate Vendor Trait
//!
//! Seam between the orchestrator and the external rate/payment vendor.
//! Injected at construction so tests can substitute a fake.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              RateVendor (trait)               │
//! │  ├── get_zone_rates()   read, retryable       │
//! │  ├── quote_price()      read, retryable       │
//! │  └── activate()         NON-IDEMPOTENT        │
//! └───────────────────────────────────────────────┘
//!                        ▲
//!            ┌───────────┴───────────┐
//!    ┌───────┴───────┐       ┌───────┴───────┐
//!    │ HttpRateVendor│       │  test fakes   │
//!    └───────────────┘       └───────────────┘
//! ```

use crate::credentials::PaymentInstrument;
use crate::error::ParkingResult;
use crate::money::FeeBreakdown;
use crate::quote::{ParkingWindow, VendorPriceResponse};
use crate::session::Vehicle;
use crate::zone::{TimeUnit, ZoneInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters for a vendor price request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub zone: String,
    pub time_unit: TimeUnit,
    pub time_quantity: u32,
    pub time_block_id: i64,
}

/// Parameters for a vendor activation
#[derive(Debug)]
pub struct ActivationRequest<'a> {
    pub zone: &'a str,
    pub time_unit: TimeUnit,
    pub time_quantity: u32,
    pub time_block_id: i64,
    /// Window from the consumed quote
    pub window: ParkingWindow,
    pub vehicle: &'a Vehicle,
    pub instrument: &'a PaymentInstrument,
}

/// Vendor acknowledgement of a paid activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorConfirmation {
    pub confirmation_id: String,
    /// Window the vendor bills for; authoritative over the quoted one
    pub window: ParkingWindow,
    /// Fees as reported by the vendor for this activation
    pub fees: FeeBreakdown,
}

/// Rate vendor operations.
#[async_trait]
pub trait RateVendor: Send + Sync {
    /// Fetch a zone's normalized rate schedule.
    ///
    /// Fails with `NotFound` for unknown zones and `VendorUnavailable`
    /// on timeouts or 5xx responses.
    async fn get_zone_rates(&self, zone: &str) -> ParkingResult<ZoneInfo>;

    /// Price a duration in a zone.
    ///
    /// Rejects with `Validation` when the quantity does not fit the
    /// zone's time-block granularity.
    async fn quote_price(&self, request: &PriceRequest) -> ParkingResult<VendorPriceResponse>;

    /// Start a paid session on the vendor side.
    ///
    /// Not idempotent: implementations must send this at most once per
    /// call and never retry it.
    async fn activate(&self, request: ActivationRequest<'_>) -> ParkingResult<VendorConfirmation>;

    /// Vendor name (for logging)
    fn vendor_name(&self) -> &'static str;
}

/// Type alias for a shared vendor (dynamic dispatch)
pub type BoxedRateVendor = Arc<dyn RateVendor>;
