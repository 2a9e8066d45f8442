//! # Parking Error Types
//!
//! Typed error handling for the curbside orchestration layer.
//! Every expected business failure has its own variant so callers
//! must handle each branch explicitly.

use thiserror::Error;
use uuid::Uuid;

/// Core error type for all parking operations
#[derive(Debug, Clone, Error)]
pub enum ParkingError {
    /// Bad zone or time parameters (user-correctable)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown zone, quote or session
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Quote was already consumed by another session start
    #[error("Quote already consumed: {quote_id}")]
    Duplicate { quote_id: Uuid },

    /// Wallet balance below the quoted total
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    /// Vendor timed out, returned 5xx, or could not be reached
    #[error("Vendor unavailable: {0}")]
    VendorUnavailable(String),

    /// Wallet ledger timed out or could not be reached
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// No payment instrument could be resolved
    #[error("Payment credentials unavailable: {0}")]
    CredentialsUnavailable(String),

    /// Vendor charged but the wallet was not debited
    #[error("Payment inconsistency for session {session_id} (quote {quote_id}): {reason}")]
    PaymentInconsistency {
        session_id: Uuid,
        quote_id: Uuid,
        reason: String,
    },

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (store invariant broken)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParkingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ParkingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if this error is transient.
    ///
    /// Only read-only vendor lookups may act on this; activation and
    /// wallet mutations are never retried regardless.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ParkingError::VendorUnavailable(_) | ParkingError::LedgerUnavailable(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ParkingError::Validation(_) => 400,
            ParkingError::NotFound { .. } => 404,
            ParkingError::Duplicate { .. } => 409,
            ParkingError::InsufficientFunds { .. } => 402,
            ParkingError::VendorUnavailable(_) => 503,
            ParkingError::LedgerUnavailable(_) => 503,
            ParkingError::CredentialsUnavailable(_) => 500,
            ParkingError::PaymentInconsistency { .. } => 500,
            ParkingError::Configuration(_) => 500,
            ParkingError::Serialization(_) => 500,
            ParkingError::Internal(_) => 500,
        }
    }
}

/// Result type alias for parking operations
pub type ParkingResult<T> = Result<T, ParkingError>;
