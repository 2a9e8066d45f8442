//! # Stores
//!
//! Persistence seams for quotes, sessions and payment attempts.
//!
//! Every mutation is a single conditional update (the equivalent of
//! `UPDATE ... WHERE status = expected`). Implementations must not
//! split a check and its write across two lock acquisitions or two
//! statements.

use crate::attempt::{AttemptFinalization, AttemptOutcome, PaymentAttempt};
use crate::error::ParkingResult;
use crate::quote::{Quote, VendorPriceResponse};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Quote persistence.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persist a new unlocked quote
    async fn create(&self, response: VendorPriceResponse) -> ParkingResult<Quote>;

    async fn get(&self, quote_id: Uuid) -> ParkingResult<Option<Quote>>;

    /// Set `locked = true` where `locked = false`.
    ///
    /// Returns true iff this call flipped the flag.
    async fn claim(&self, quote_id: Uuid) -> ParkingResult<bool>;
}

/// Session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session; fails if the id or vendor confirmation exists
    async fn insert(&self, session: Session) -> ParkingResult<()>;

    async fn get(&self, session_id: Uuid) -> ParkingResult<Option<Session>>;

    /// Sessions owned by a user, newest first
    async fn list_for_user(&self, user_id: &str) -> ParkingResult<Vec<Session>>;

    /// Move every non-finished session with `stop <= now` to FINISHED and
    /// clear its reminder. Returns the sessions this call changed.
    async fn expire_due(&self, now: DateTime<Utc>) -> ParkingResult<Vec<Session>>;

    /// Move every ON_GOING session with `alert_at <= now` to ALERTED.
    /// Returns the sessions this call changed.
    async fn alert_due(&self, now: DateTime<Utc>) -> ParkingResult<Vec<Session>>;

    /// Replace the reminder on a non-finished session owned by `user_id`.
    ///
    /// Fails with `NotFound` for unknown or foreign sessions. On a finished
    /// session a cancel (`0`) is a no-op and anything else is `Validation`.
    /// An alerted session accepts only a cancel.
    async fn update_reminder(
        &self,
        session_id: Uuid,
        user_id: &str,
        alert_before_minutes: u32,
        alert_at: Option<DateTime<Utc>>,
    ) -> ParkingResult<Session>;
}

/// Payment attempt audit log.
#[async_trait]
pub trait AttemptLog: Send + Sync {
    async fn open(&self, attempt: PaymentAttempt) -> ParkingResult<()>;

    /// Close an open attempt; a second finalize is an `Internal` error
    async fn finalize(
        &self,
        attempt_id: Uuid,
        finalization: AttemptFinalization,
    ) -> ParkingResult<PaymentAttempt>;

    async fn get(&self, attempt_id: Uuid) -> ParkingResult<Option<PaymentAttempt>>;

    async fn list_by_outcome(&self, outcome: AttemptOutcome) -> ParkingResult<Vec<PaymentAttempt>>;
}

pub type BoxedQuoteStore = Arc<dyn QuoteStore>;
pub type BoxedSessionStore = Arc<dyn SessionStore>;
pub type BoxedAttemptLog = Arc<dyn AttemptLog>;
