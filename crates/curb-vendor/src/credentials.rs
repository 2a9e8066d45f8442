//! # Environment Credentials
//!
//! Production payment instrument, read from the environment on every
//! call so nothing is cached between activations.

use async_trait::async_trait;
use curb_core::{CredentialProvider, ParkingError, ParkingResult, PaymentInstrument};
use std::env;

/// Reads `{PREFIX}_NUMBER`, `{PREFIX}_EXP_MONTH`, `{PREFIX}_EXP_YEAR`,
/// `{PREFIX}_CVV`, `{PREFIX}_HOLDER` and `{PREFIX}_POSTAL_CODE`.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    prefix: String,
}

impl EnvCredentialProvider {
    pub const DEFAULT_PREFIX: &'static str = "PAYMENT_CARD";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Create with the default prefix, failing early if any field is missing
    pub fn from_env() -> ParkingResult<Self> {
        dotenvy::dotenv().ok();
        let provider = Self::new(Self::DEFAULT_PREFIX);
        provider.check_present()?;
        Ok(provider)
    }

    fn key(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn read(&self, field: &str) -> ParkingResult<String> {
        let key = self.key(field);
        env::var(&key)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ParkingError::CredentialsUnavailable(format!("{} not set", key)))
    }

    fn check_present(&self) -> ParkingResult<()> {
        for field in ["NUMBER", "EXP_MONTH", "EXP_YEAR", "CVV", "HOLDER", "POSTAL_CODE"] {
            let key = self.key(field);
            if env::var_os(&key).map_or(true, |v| v.is_empty()) {
                return Err(ParkingError::Configuration(format!("{} not set", key)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn payment_instrument(&self) -> ParkingResult<PaymentInstrument> {
        Ok(PaymentInstrument::new(
            self.read("NUMBER")?,
            self.read("EXP_MONTH")?,
            self.read("EXP_YEAR")?,
            self.read("CVV")?,
            self.read("HOLDER")?,
            self.read("POSTAL_CODE")?,
        ))
    }

    fn provider_name(&self) -> &'static str {
        "env"
    }
}
