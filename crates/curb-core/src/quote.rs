//! # Quote Types
//!
//! A quote is a priced, time-windowed parking offer for one zone.
//! It can be consumed by exactly one session start.

use crate::money::FeeBreakdown;
use crate::zone::{GeoPoint, TimeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UTC window the vendor will honor for a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ParkingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Vendor answer to a price request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPriceResponse {
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_location: Option<GeoPoint>,
    pub time_unit: TimeUnit,
    pub time_quantity: u32,
    pub time_block_id: i64,
    pub fees: FeeBreakdown,
    pub window: ParkingWindow,
}

/// A persisted price quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_location: Option<GeoPoint>,
    pub time_unit: TimeUnit,
    pub time_quantity: u32,
    pub time_block_id: i64,
    pub parking_fee: i64,
    pub transaction_fee: i64,
    pub total_price: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Set once by a successful claim, never cleared
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Build an unlocked quote from a vendor price response
    pub fn from_price_response(response: VendorPriceResponse) -> Self {
        Self {
            id: Uuid::new_v4(),
            zone: response.zone,
            zone_location: response.zone_location,
            time_unit: response.time_unit,
            time_quantity: response.time_quantity,
            time_block_id: response.time_block_id,
            parking_fee: response.fees.parking_fee,
            transaction_fee: response.fees.transaction_fee,
            total_price: response.fees.total,
            window_start: response.window.start,
            window_end: response.window.end,
            locked: false,
            created_at: Utc::now(),
        }
    }

    pub fn fees(&self) -> FeeBreakdown {
        FeeBreakdown::new(self.parking_fee, self.transaction_fee)
    }

    pub fn window(&self) -> ParkingWindow {
        ParkingWindow::new(self.window_start, self.window_end)
    }
}
