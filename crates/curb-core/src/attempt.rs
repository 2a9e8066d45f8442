//! # Payment Attempts
//!
//! Internal audit record for every `start_session` call. Opened at the
//! start of the call, finalized exactly once, immutable afterwards.
//! Operators reconcile `Inconsistent` attempts by hand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final outcome of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    /// Vendor activated and wallet debited
    Success,
    /// Failed before or at the vendor call; nothing was charged
    RejectedPreVendor,
    /// Vendor charged, wallet not debited (or session not stored)
    Inconsistent,
}

/// What happened at the vendor activation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VendorCallResult {
    NotCalled,
    Activated { confirmation_id: String },
    Failed { error: String },
}

/// What happened at the wallet debit step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WalletDebitResult {
    NotCalled,
    Debited { amount: i64, entry_id: String },
    Failed { amount: i64, error: String },
}

/// Audit record for one session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub user_id: String,
    pub session_id: Option<Uuid>,
    pub vendor_call_result: VendorCallResult,
    pub wallet_debit_result: WalletDebitResult,
    /// `None` while the attempt is open
    pub outcome: Option<AttemptOutcome>,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl PaymentAttempt {
    /// Open a new attempt
    pub fn open(quote_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            quote_id,
            user_id: user_id.into(),
            session_id: None,
            vendor_call_result: VendorCallResult::NotCalled,
            wallet_debit_result: WalletDebitResult::NotCalled,
            outcome: None,
            created_at: Utc::now(),
            finalized_at: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Values written when an attempt is closed
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFinalization {
    pub outcome: AttemptOutcome,
    pub session_id: Option<Uuid>,
    pub vendor_call_result: VendorCallResult,
    pub wallet_debit_result: WalletDebitResult,
}

impl AttemptFinalization {
    /// Rejection where the vendor was never reached
    pub fn rejected_before_vendor() -> Self {
        Self {
            outcome: AttemptOutcome::RejectedPreVendor,
            session_id: None,
            vendor_call_result: VendorCallResult::NotCalled,
            wallet_debit_result: WalletDebitResult::NotCalled,
        }
    }

    /// Rejection by the vendor itself
    pub fn vendor_failed(error: impl Into<String>) -> Self {
        Self {
            outcome: AttemptOutcome::RejectedPreVendor,
            session_id: None,
            vendor_call_result: VendorCallResult::Failed {
                error: error.into(),
            },
            wallet_debit_result: WalletDebitResult::NotCalled,
        }
    }
}
