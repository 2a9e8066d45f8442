//! # In-Memory Stores
//!
//! Process-local implementations of the store traits. Each conditional
//! update runs under one write-lock acquisition, which makes it atomic
//! with respect to every other caller.

use crate::attempt::{AttemptFinalization, AttemptOutcome, PaymentAttempt};
use crate::error::{ParkingError, ParkingResult};
use crate::quote::{Quote, VendorPriceResponse};
use crate::session::{Session, SessionStatus};
use crate::store::{AttemptLog, QuoteStore, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Quote table
#[derive(Debug, Default)]
pub struct InMemoryQuoteStore {
    quotes: RwLock<HashMap<Uuid, Quote>>,
}

impl InMemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn create(&self, response: VendorPriceResponse) -> ParkingResult<Quote> {
        let quote = Quote::from_price_response(response);
        self.quotes.write().await.insert(quote.id, quote.clone());
        Ok(quote)
    }

    async fn get(&self, quote_id: Uuid) -> ParkingResult<Option<Quote>> {
        Ok(self.quotes.read().await.get(&quote_id).cloned())
    }

    async fn claim(&self, quote_id: Uuid) -> ParkingResult<bool> {
        let mut quotes = self.quotes.write().await;
        match quotes.get_mut(&quote_id) {
            Some(quote) if !quote.locked => {
                quote.locked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Session table
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> ParkingResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(ParkingError::Internal(format!(
                "session {} already exists",
                session.id
            )));
        }
        if sessions
            .values()
            .any(|s| s.vendor_confirmation_id == session.vendor_confirmation_id)
        {
            return Err(ParkingError::Internal(format!(
                "vendor confirmation {} already recorded",
                session.vendor_confirmation_id
            )));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> ParkingResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> ParkingResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut owned: Vec<Session> = sessions
            .values()
            .filter(|s| s.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.start_time_utc.cmp(&a.start_time_utc));
        Ok(owned)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> ParkingResult<Vec<Session>> {
        let mut sessions = self.sessions.write().await;
        let mut changed = Vec::new();
        for session in sessions.values_mut() {
            let due = session.stop_time_utc <= now;
            if due && session.status.can_advance_to(SessionStatus::Finished) {
                session.status = SessionStatus::Finished;
                session.alert_before_minutes = 0;
                session.alert_at_utc = None;
                changed.push(session.clone());
            }
        }
        Ok(changed)
    }

    async fn alert_due(&self, now: DateTime<Utc>) -> ParkingResult<Vec<Session>> {
        let mut sessions = self.sessions.write().await;
        let mut changed = Vec::new();
        for session in sessions.values_mut() {
            let due = session.alert_at_utc.is_some_and(|at| at <= now);
            if due && session.status.can_advance_to(SessionStatus::Alerted) {
                session.status = SessionStatus::Alerted;
                changed.push(session.clone());
            }
        }
        Ok(changed)
    }

    async fn update_reminder(
        &self,
        session_id: Uuid,
        user_id: &str,
        alert_before_minutes: u32,
        alert_at: Option<DateTime<Utc>>,
    ) -> ParkingResult<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .filter(|s| s.is_owned_by(user_id))
            .ok_or_else(|| ParkingError::not_found("session", session_id))?;

        if session.status.is_terminal() {
            // Reminder fields were cleared on expiry; cancelling is a no-op.
            if alert_before_minutes == 0 {
                return Ok(session.clone());
            }
            return Err(ParkingError::Validation(format!(
                "session {} has already finished",
                session_id
            )));
        }

        // Alerts fire once; only cancelling is left for an alerted session.
        if alert_before_minutes != 0 && !session.status.can_advance_to(SessionStatus::Alerted) {
            return Err(ParkingError::Validation(format!(
                "session {} has already been alerted",
                session_id
            )));
        }

        session.alert_before_minutes = alert_before_minutes;
        session.alert_at_utc = alert_at;
        Ok(session.clone())
    }
}

/// Payment attempt table
#[derive(Debug, Default)]
pub struct InMemoryAttemptLog {
    attempts: RwLock<HashMap<Uuid, PaymentAttempt>>,
}

impl InMemoryAttemptLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptLog for InMemoryAttemptLog {
    async fn open(&self, attempt: PaymentAttempt) -> ParkingResult<()> {
        self.attempts.write().await.insert(attempt.id, attempt);
        Ok(())
    }

    async fn finalize(
        &self,
        attempt_id: Uuid,
        finalization: AttemptFinalization,
    ) -> ParkingResult<PaymentAttempt> {
        let mut attempts = self.attempts.write().await;
        let attempt = attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| ParkingError::not_found("payment attempt", attempt_id))?;

        if attempt.is_finalized() {
            return Err(ParkingError::Internal(format!(
                "payment attempt {} is already finalized",
                attempt_id
            )));
        }

        attempt.outcome = Some(finalization.outcome);
        attempt.session_id = finalization.session_id;
        attempt.vendor_call_result = finalization.vendor_call_result;
        attempt.wallet_debit_result = finalization.wallet_debit_result;
        attempt.finalized_at = Some(Utc::now());
        Ok(attempt.clone())
    }

    async fn get(&self, attempt_id: Uuid) -> ParkingResult<Option<PaymentAttempt>> {
        Ok(self.attempts.read().await.get(&attempt_id).cloned())
    }

    async fn list_by_outcome(&self, outcome: AttemptOutcome) -> ParkingResult<Vec<PaymentAttempt>> {
        let attempts = self.attempts.read().await;
        let mut matching: Vec<PaymentAttempt> = attempts
            .values()
            .filter(|a| a.outcome == Some(outcome))
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.created_at);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::FeeBreakdown;
    use crate::quote::ParkingWindow;
    use crate::zone::TimeUnit;
    use chrono::Duration;
    use std::sync::Arc;

    fn price_response() -> VendorPriceResponse {
        let start = Utc::now();
        VendorPriceResponse {
            zone: "4021".to_string(),
            zone_location: None,
            time_unit: TimeUnit::Hours,
            time_quantity: 1,
            time_block_id: 2,
            fees: FeeBreakdown::new(200, 35),
            window: ParkingWindow::new(start, start + Duration::hours(1)),
        }
    }

    #[tokio::test]
    async fn test_claim_only_once() {
        let store = InMemoryQuoteStore::new();
        let quote = store.create(price_response()).await.unwrap();
        assert!(!quote.locked);

        assert!(store.claim(quote.id).await.unwrap());
        assert!(!store.claim(quote.id).await.unwrap());
        assert!(store.get(quote.id).await.unwrap().unwrap().locked);
    }

    #[tokio::test]
    async fn test_claim_unknown_quote() {
        let store = InMemoryQuoteStore::new();
        assert!(!store.claim(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let store = Arc::new(InMemoryQuoteStore::new());
        let quote = store.create(price_response()).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.claim(quote.id).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_finalize_only_once() {
        let log = InMemoryAttemptLog::new();
        let attempt = PaymentAttempt::open(Uuid::new_v4(), "u1");
        let id = attempt.id;
        log.open(attempt).await.unwrap();

        let closed = log
            .finalize(id, AttemptFinalization::rejected_before_vendor())
            .await
            .unwrap();
        assert_eq!(closed.outcome, Some(AttemptOutcome::RejectedPreVendor));
        assert!(closed.finalized_at.is_some());

        let again = log.finalize(id, AttemptFinalization::vendor_failed("x")).await;
        assert!(matches!(again, Err(ParkingError::Internal(_))));
        let stored = log.get(id).await.unwrap().unwrap();
        assert_eq!(stored.vendor_call_result, closed.vendor_call_result);
    }
}
