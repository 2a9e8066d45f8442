//! # Payment Credentials
//!
//! The vendor activation is paid with a card-like instrument supplied
//! by a `CredentialProvider`. Instruments never print their contents
//! and overwrite their buffers when dropped, so callers should hold
//! them only for the duration of the activation call.

use crate::error::ParkingResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Card-like payment instrument
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PaymentInstrument {
    card_number: String,
    expiry_month: String,
    expiry_year: String,
    cvv: String,
    holder_name: String,
    postal_code: String,
}

impl PaymentInstrument {
    pub fn new(
        card_number: impl Into<String>,
        expiry_month: impl Into<String>,
        expiry_year: impl Into<String>,
        cvv: impl Into<String>,
        holder_name: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            card_number: card_number.into(),
            expiry_month: expiry_month.into(),
            expiry_year: expiry_year.into(),
            cvv: cvv.into(),
            holder_name: holder_name.into(),
            postal_code: postal_code.into(),
        }
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    pub fn expiry_month(&self) -> &str {
        &self.expiry_month
    }

    pub fn expiry_year(&self) -> &str {
        &self.expiry_year
    }

    pub fn cvv(&self) -> &str {
        &self.cvv
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    /// Last four digits, safe for logs
    pub fn last4(&self) -> &str {
        let len = self.card_number.len();
        self.card_number.get(len.saturating_sub(4)..).unwrap_or("")
    }
}

impl fmt::Debug for PaymentInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentInstrument(****{})", self.last4())
    }
}

impl fmt::Display for PaymentInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "****{}", self.last4())
    }
}

/// Source of the payment instrument used for vendor activation
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn payment_instrument(&self) -> ParkingResult<PaymentInstrument>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared credential provider
pub type BoxedCredentialProvider = Arc<dyn CredentialProvider>;

/// Fixed dummy instrument used outside production, where the vendor
/// has no safe sandbox to charge against.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedTestCredentials;

impl FixedTestCredentials {
    pub const CARD_NUMBER: &'static str = "4111111111111111";
}

#[async_trait]
impl CredentialProvider for FixedTestCredentials {
    async fn payment_instrument(&self) -> ParkingResult<PaymentInstrument> {
        Ok(PaymentInstrument::new(
            Self::CARD_NUMBER,
            "12",
            "2030",
            "123",
            "Curbside Test",
            "77002",
        ))
    }

    fn provider_name(&self) -> &'static str {
        "fixed-test"
    }
}
