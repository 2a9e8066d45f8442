//! # Money
//!
//! All amounts inside curbside are integer cents. The vendor speaks in
//! decimal dollars, so conversion happens once at the adapter boundary.

use serde::{Deserialize, Serialize};

/// Convert a decimal dollar amount to cents, rounding half away from zero
pub fn dollars_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert cents back to a decimal dollar amount
pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Format cents for display (e.g., "$10.00")
pub fn display_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Fee breakdown for a parking purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Vendor parking fee in cents
    pub parking_fee: i64,
    /// Vendor transaction/convenience fee in cents
    pub transaction_fee: i64,
    /// Always `parking_fee + transaction_fee`
    pub total: i64,
}

impl FeeBreakdown {
    pub fn new(parking_fee: i64, transaction_fee: i64) -> Self {
        Self {
            parking_fee,
            transaction_fee,
            total: parking_fee + transaction_fee,
        }
    }
}
