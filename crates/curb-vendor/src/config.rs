//! # Adapter Configuration
//!
//! Configuration for the rate vendor and wallet ledger HTTP adapters.
//! All secrets are loaded from environment variables.

use curb_core::ParkingError;
use std::env;
use std::time::Duration;

/// Per-request timeout for every vendor and ledger call
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Rate vendor API configuration
#[derive(Clone)]
pub struct VendorConfig {
    /// API base URL (e.g., "https://api.parkvendor.example")
    pub api_base_url: String,

    /// Bearer token
    pub api_token: String,

    /// Time block the vendor advertises as its default
    pub default_time_block_id: i64,

    /// Per-request timeout
    pub timeout: Duration,
}

impl VendorConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `VENDOR_API_BASE_URL`
    /// - `VENDOR_API_TOKEN`
    ///
    /// Optional: `VENDOR_DEFAULT_TIME_BLOCK_ID` (default 1),
    /// `VENDOR_TIMEOUT_SECS` (default 10).
    pub fn from_env() -> Result<Self, ParkingError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = required("VENDOR_API_BASE_URL")?;
        let api_token = required("VENDOR_API_TOKEN")?;
        validate_base_url("VENDOR_API_BASE_URL", &api_base_url)?;

        let default_time_block_id = match env::var("VENDOR_DEFAULT_TIME_BLOCK_ID") {
            Ok(raw) => raw.parse().map_err(|_| {
                ParkingError::Configuration(
                    "VENDOR_DEFAULT_TIME_BLOCK_ID must be an integer".to_string(),
                )
            })?,
            Err(_) => 1,
        };

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token,
            default_time_block_id,
            timeout: timeout_from_env("VENDOR_TIMEOUT_SECS")?,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_token: api_token.into(),
            default_time_block_id: 1,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_token)
    }

    /// Builder: set the advertised default time block
    pub fn with_default_time_block(mut self, id: i64) -> Self {
        self.default_time_block_id = id;
        self
    }

    /// Builder: set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &"********")
            .field("default_time_block_id", &self.default_time_block_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Wallet ledger API configuration
#[derive(Clone)]
pub struct LedgerConfig {
    pub api_base_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `LEDGER_API_BASE_URL`
    /// - `LEDGER_API_TOKEN`
    pub fn from_env() -> Result<Self, ParkingError> {
        dotenvy::dotenv().ok();

        let api_base_url = required("LEDGER_API_BASE_URL")?;
        let api_token = required("LEDGER_API_TOKEN")?;
        validate_base_url("LEDGER_API_BASE_URL", &api_base_url)?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: timeout_from_env("LEDGER_TIMEOUT_SECS")?,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_token)
    }
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &"********")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required(key: &str) -> Result<String, ParkingError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ParkingError::Configuration(format!("{} not set", key))),
    }
}

fn validate_base_url(key: &str, url: &str) -> Result<(), ParkingError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ParkingError::Configuration(format!(
            "{} must start with http:// or https://",
            key
        )))
    }
}

fn timeout_from_env(key: &str) -> Result<Duration, ParkingError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ParkingError::Configuration(format!("{} must be a positive integer", key))
            }),
        Err(_) => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
    }
}
