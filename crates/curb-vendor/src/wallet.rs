//! # Wallet Ledger Client
//!
//! HTTP implementation of `WalletLedger`. Every call is sent once;
//! debits and credits move money and are never replayed.

use crate::client::endpoint;
use crate::config::LedgerConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curb_core::{
    cents_to_dollars, dollars_to_cents, LedgerEntry, ParkingError, ParkingResult, WalletLedger,
};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Wallet ledger over HTTP
pub struct HttpWalletLedger {
    config: LedgerConfig,
    client: Client,
}

impl HttpWalletLedger {
    pub fn new(config: LedgerConfig) -> ParkingResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ParkingError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ParkingResult<Self> {
        Self::new(LedgerConfig::from_env()?)
    }

    /// User ids are opaque, so they travel as one percent-encoded segment.
    fn wallet_url(&self, user_id: &str, action: &str) -> ParkingResult<Url> {
        if matches!(user_id, "" | "." | "..") {
            return Err(ParkingError::Validation(format!("invalid user id: {:?}", user_id)));
        }
        endpoint(&self.config.api_base_url, &["v1", "wallets", user_id, action])
    }

    async fn post_entry(
        &self,
        user_id: &str,
        action: &str,
        amount: i64,
        note: &str,
    ) -> ParkingResult<LedgerEntry> {
        if amount <= 0 {
            return Err(ParkingError::Validation(format!(
                "{} amount must be positive, got {}",
                action, amount
            )));
        }

        let body = LedgerPostRequest {
            amount: cents_to_dollars(amount),
            note,
        };
        let response = self
            .client
            .post(self.wallet_url(user_id, action)?)
            .header("Authorization", self.config.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(ledger_error(status, &text, user_id, amount));
        }

        let wire: LedgerEntryBody = serde_json::from_str(&text).map_err(|e| {
            ParkingError::Serialization(format!("Failed to parse ledger response: {}", e))
        })?;

        let signed = if action == "debit" { -amount } else { amount };
        info!(
            user_id,
            action,
            amount,
            entry_id = %wire.entry_id,
            "Ledger entry posted"
        );

        Ok(LedgerEntry {
            entry_id: wire.entry_id,
            user_id: user_id.to_string(),
            amount: signed,
            note: note.to_string(),
            balance_after: dollars_to_cents(wire.balance_after),
            posted_at: wire.posted_at.unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl WalletLedger for HttpWalletLedger {
    #[instrument(skip(self))]
    async fn check_balance(&self, user_id: &str) -> ParkingResult<i64> {
        let response = self
            .client
            .get(self.wallet_url(user_id, "balance")?)
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(ledger_error(status, &text, user_id, 0));
        }

        let wire: BalanceBody = serde_json::from_str(&text).map_err(|e| {
            ParkingError::Serialization(format!("Failed to parse ledger balance: {}", e))
        })?;
        let balance = dollars_to_cents(wire.balance);
        debug!(balance, "Wallet balance");
        Ok(balance)
    }

    #[instrument(skip(self, note))]
    async fn debit(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry> {
        self.post_entry(user_id, "debit", amount, note).await
    }

    #[instrument(skip(self, note))]
    async fn credit(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry> {
        self.post_entry(user_id, "credit", amount, note).await
    }
}

fn transport_error(e: reqwest::Error) -> ParkingError {
    if e.is_timeout() {
        ParkingError::LedgerUnavailable("ledger request timed out".to_string())
    } else {
        ParkingError::LedgerUnavailable(format!("ledger request failed: {}", e))
    }
}

fn ledger_error(status: StatusCode, body: &str, user_id: &str, required: i64) -> ParkingError {
    error!(status = status.as_u16(), user_id, body, "Ledger API error");

    match status {
        StatusCode::PAYMENT_REQUIRED | StatusCode::CONFLICT => {
            let available = serde_json::from_str::<LedgerErrorBody>(body)
                .ok()
                .and_then(|b| b.available)
                .map(dollars_to_cents)
                .unwrap_or(0);
            ParkingError::InsufficientFunds {
                required,
                available,
            }
        }
        StatusCode::NOT_FOUND => ParkingError::not_found("wallet", user_id),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ParkingError::Validation(format!("ledger rejected request: {}", body))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ParkingError::Configuration("ledger rejected credentials".to_string())
        }
        _ => ParkingError::LedgerUnavailable(format!("HTTP {}", status)),
    }
}

// =============================================================================
// Ledger API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct LedgerPostRequest<'a> {
    amount: f64,
    note: &'a str,
}

#[derive(Debug, Deserialize)]
struct BalanceBody {
    balance: f64,
}

#[derive(Debug, Deserialize)]
struct LedgerEntryBody {
    entry_id: String,
    balance_after: f64,
    #[serde(default)]
    posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LedgerErrorBody {
    #[serde(default)]
    available: Option<f64>,
}
