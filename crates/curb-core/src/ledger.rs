//! # Wallet Ledger
//!
//! The internal wallet is owned by the ledger service; curbside only
//! reads balances and posts debits/credits through this trait.
//! Debits and credits are side effects and are never retried here.

use crate::error::{ParkingError, ParkingResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Posted ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: String,
    pub user_id: String,
    /// Signed amount in cents (negative for debits)
    pub amount: i64,
    pub note: String,
    pub balance_after: i64,
    pub posted_at: DateTime<Utc>,
}

/// Wallet ledger operations.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    /// Current balance in cents
    async fn check_balance(&self, user_id: &str) -> ParkingResult<i64>;

    /// Remove `amount` cents from the wallet
    async fn debit(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry>;

    /// Add `amount` cents to the wallet
    async fn credit(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry>;
}

/// Type alias for a shared ledger
pub type BoxedWalletLedger = Arc<dyn WalletLedger>;

/// Process-local ledger for development and tests
#[derive(Debug, Default)]
pub struct InMemoryWallet {
    balances: Mutex<HashMap<String, i64>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a user's balance
    pub fn with_balance(self, user_id: impl Into<String>, cents: i64) -> Self {
        self.set_balance(user_id, cents);
        self
    }

    pub fn set_balance(&self, user_id: impl Into<String>, cents: i64) {
        if let Ok(mut balances) = self.balances.lock() {
            balances.insert(user_id.into(), cents);
        }
    }

    fn post(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| ParkingError::Internal("wallet lock poisoned".to_string()))?;
        let balance = balances.entry(user_id.to_string()).or_insert(0);
        if *balance + amount < 0 {
            return Err(ParkingError::InsufficientFunds {
                required: -amount,
                available: *balance,
            });
        }
        *balance += amount;
        Ok(LedgerEntry {
            entry_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            note: note.to_string(),
            balance_after: *balance,
            posted_at: Utc::now(),
        })
    }
}

#[async_trait]
impl WalletLedger for InMemoryWallet {
    async fn check_balance(&self, user_id: &str) -> ParkingResult<i64> {
        let balances = self
            .balances
            .lock()
            .map_err(|_| ParkingError::Internal("wallet lock poisoned".to_string()))?;
        Ok(balances.get(user_id).copied().unwrap_or(0))
    }

    async fn debit(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry> {
        if amount <= 0 {
            return Err(ParkingError::Validation("debit amount must be positive".into()));
        }
        self.post(user_id, -amount, note)
    }

    async fn credit(&self, user_id: &str, amount: i64, note: &str) -> ParkingResult<LedgerEntry> {
        if amount <= 0 {
            return Err(ParkingError::Validation("credit amount must be positive".into()));
        }
        self.post(user_id, amount, note)
    }
}
