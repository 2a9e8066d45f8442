//! # Pricing Policy
//!
//! Where a session's settled fees come from. The vendor offers no safe
//! sandbox, so its non-production price responses are not reliable;
//! outside production the stored quote is the fee source instead.
//!
//! This is the only place the two sources meet.

use crate::money::FeeBreakdown;
use crate::quote::Quote;
use crate::vendor::VendorConfirmation;
use serde::{Deserialize, Serialize};

/// Fee source for settled sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Trust the vendor's live activation response (production)
    Live,
    /// Reuse the fees stored on the consumed quote (non-production)
    StoredQuote,
}

impl PricingPolicy {
    /// Policy for a deployment environment name
    pub fn for_environment(environment: &str) -> Self {
        if environment.eq_ignore_ascii_case("production") {
            PricingPolicy::Live
        } else {
            PricingPolicy::StoredQuote
        }
    }

    /// Fees to record on the session
    pub fn settle(&self, quote: &Quote, confirmation: &VendorConfirmation) -> FeeBreakdown {
        match self {
            PricingPolicy::Live => confirmation.fees,
            PricingPolicy::StoredQuote => quote.fees(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingPolicy::Live => "live",
            PricingPolicy::StoredQuote => "stored_quote",
        }
    }
}

impl std::fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
