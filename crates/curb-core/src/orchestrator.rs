//! # Payment Orchestrator
//!
//! Turns a quote into a paid parking session, charging exactly one of
//! (vendor, wallet) consistently.
//!
//! ```text
//! start_session
//!   1. load quote ............................ NotFound
//!   2. claim quote ........................... Duplicate          (no vendor/ledger call)
//!   3. check balance >= total ................ InsufficientFunds  (no vendor call)
//!   4. resolve payment instrument
//!   5. vendor activate ....................... REJECTED_PRE_VENDOR, quote stays locked
//!   6. persist ON_GOING session (vendor window)
//!   7. debit wallet .......................... INCONSISTENT, session still returned
//!   8. SUCCESS
//! ```
//!
//! The order is load-bearing: claiming first stops concurrent starts,
//! and both checks run before anything billable happens at the vendor.

use crate::attempt::{
    AttemptFinalization, AttemptOutcome, PaymentAttempt, VendorCallResult, WalletDebitResult,
};
use crate::credentials::BoxedCredentialProvider;
use crate::error::{ParkingError, ParkingResult};
use crate::ledger::BoxedWalletLedger;
use crate::memory::{InMemoryAttemptLog, InMemoryQuoteStore, InMemorySessionStore};
use crate::money::{display_cents, FeeBreakdown};
use crate::pricing::PricingPolicy;
use crate::quote::{Quote, VendorPriceResponse};
use crate::session::{NewSession, Session, Vehicle};
use crate::store::{BoxedAttemptLog, BoxedQuoteStore, BoxedSessionStore};
use crate::vendor::{ActivationRequest, BoxedRateVendor, PriceRequest};
use crate::zone::ZoneInfo;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Deadline for a single non-retried external call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for a read, including the adapter's own retries
pub const DEFAULT_READ_BUDGET: Duration = Duration::from_secs(30);

/// The three tables owned by this subsystem
#[derive(Clone)]
pub struct Stores {
    pub quotes: BoxedQuoteStore,
    pub sessions: BoxedSessionStore,
    pub attempts: BoxedAttemptLog,
}

impl Stores {
    /// Process-local stores
    pub fn in_memory() -> Self {
        Self {
            quotes: Arc::new(InMemoryQuoteStore::new()),
            sessions: Arc::new(InMemorySessionStore::new()),
            attempts: Arc::new(InMemoryAttemptLog::new()),
        }
    }
}

/// Run `fut` under a deadline; expiry is reported through `on_timeout`.
pub(crate) async fn with_deadline<T, F>(
    deadline: Duration,
    what: &str,
    on_timeout: fn(String) -> ParkingError,
    fut: F,
) -> ParkingResult<T>
where
    F: Future<Output = ParkingResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!(
            "{} timed out after {}s",
            what,
            deadline.as_secs_f64()
        ))),
    }
}

/// Orchestrates quoting and paid session starts.
#[derive(Clone)]
pub struct PaymentOrchestrator {
    vendor: BoxedRateVendor,
    ledger: BoxedWalletLedger,
    credentials: BoxedCredentialProvider,
    stores: Stores,
    policy: PricingPolicy,
    call_timeout: Duration,
    read_budget: Duration,
}

impl PaymentOrchestrator {
    pub fn new(
        vendor: BoxedRateVendor,
        ledger: BoxedWalletLedger,
        credentials: BoxedCredentialProvider,
        stores: Stores,
        policy: PricingPolicy,
    ) -> Self {
        Self {
            vendor,
            ledger,
            credentials,
            stores,
            policy,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            read_budget: DEFAULT_READ_BUDGET,
        }
    }

    /// Builder: deadline for activation, ledger and credential calls
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Builder: deadline for vendor reads (retries included)
    pub fn with_read_budget(mut self, budget: Duration) -> Self {
        self.read_budget = budget;
        self
    }

    pub fn policy(&self) -> PricingPolicy {
        self.policy
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Zone rate schedule straight from the vendor
    #[instrument(skip(self))]
    pub async fn get_zone_rates(&self, zone: &str) -> ParkingResult<ZoneInfo> {
        with_deadline(
            self.read_budget,
            "zone rate lookup",
            ParkingError::VendorUnavailable,
            self.vendor.get_zone_rates(zone),
        )
        .await
    }

    /// Price a duration and persist the result as an unlocked quote
    #[instrument(skip(self), fields(zone = %request.zone))]
    pub async fn quote_price(&self, request: PriceRequest) -> ParkingResult<Quote> {
        let response = with_deadline(
            self.read_budget,
            "price quote",
            ParkingError::VendorUnavailable,
            self.vendor.quote_price(&request),
        )
        .await?;

        // Recompute the total so a stored quote always sums correctly.
        let fees = FeeBreakdown::new(response.fees.parking_fee, response.fees.transaction_fee);
        let quote = self
            .stores
            .quotes
            .create(VendorPriceResponse { fees, ..response })
            .await?;

        info!(
            quote_id = %quote.id,
            total = %display_cents(quote.total_price),
            "Created quote"
        );
        Ok(quote)
    }

    /// Consume a quote, pay the vendor, persist the session, debit the wallet.
    #[instrument(skip_all, fields(user_id = %user_id, quote_id = %quote_id, payment_method = %payment_method))]
    pub async fn start_session(
        &self,
        user_id: &str,
        quote_id: Uuid,
        vehicle: &Vehicle,
        payment_method: &str,
    ) -> ParkingResult<Session> {
        let attempt = PaymentAttempt::open(quote_id, user_id);
        let attempt_id = attempt.id;
        self.stores.attempts.open(attempt).await?;

        // Steps 1-4: everything that can fail before the vendor is touched.
        let quote = match self.claim_and_check(user_id, quote_id).await {
            Ok(quote) => quote,
            Err(e) => {
                self.finalize(attempt_id, AttemptFinalization::rejected_before_vendor())
                    .await;
                return Err(e);
            }
        };

        // Step 5: activate. The instrument is dropped (and wiped) with this block.
        let activation = {
            let instrument = match with_deadline(
                self.call_timeout,
                "credential lookup",
                ParkingError::CredentialsUnavailable,
                self.credentials.payment_instrument(),
            )
            .await
            {
                Ok(instrument) => instrument,
                Err(e) => {
                    error!(provider = self.credentials.provider_name(), error = %e, "No payment instrument");
                    self.finalize(attempt_id, AttemptFinalization::rejected_before_vendor())
                        .await;
                    return Err(e);
                }
            };

            let request = ActivationRequest {
                zone: &quote.zone,
                time_unit: quote.time_unit,
                time_quantity: quote.time_quantity,
                time_block_id: quote.time_block_id,
                window: quote.window(),
                vehicle,
                instrument: &instrument,
            };

            with_deadline(
                self.call_timeout,
                "vendor activation",
                ParkingError::VendorUnavailable,
                self.vendor.activate(request),
            )
            .await
        };

        let confirmation = match activation {
            Ok(confirmation) => confirmation,
            Err(e) => {
                let e = classify_vendor_error(e);
                error!(
                    vendor = self.vendor.vendor_name(),
                    zone = %quote.zone,
                    error = %e,
                    "Vendor activation failed; quote stays consumed"
                );
                self.finalize(attempt_id, AttemptFinalization::vendor_failed(e.to_string()))
                    .await;
                return Err(e);
            }
        };

        // Step 6: persist with the vendor's window, fees per policy.
        let fees = self.policy.settle(&quote, &confirmation);
        if self.policy == PricingPolicy::Live && fees.total != quote.total_price {
            warn!(
                quoted = quote.total_price,
                live = fees.total,
                "Vendor total differs from quote"
            );
        }

        let session = Session::start(NewSession {
            user_id,
            quote: &quote,
            vehicle,
            payment_method,
            vendor_confirmation_id: confirmation.confirmation_id.clone(),
            window: confirmation.window,
            fees,
        });

        let activated = VendorCallResult::Activated {
            confirmation_id: confirmation.confirmation_id.clone(),
        };

        if let Err(e) = self.stores.sessions.insert(session.clone()).await {
            let inconsistency = ParkingError::PaymentInconsistency {
                session_id: session.id,
                quote_id,
                reason: format!("session not persisted: {}", e),
            };
            error!(error = %inconsistency, "Queued for reconciliation");
            self.finalize(
                attempt_id,
                AttemptFinalization {
                    outcome: AttemptOutcome::Inconsistent,
                    session_id: Some(session.id),
                    vendor_call_result: activated,
                    wallet_debit_result: WalletDebitResult::NotCalled,
                },
            )
            .await;
            return Err(inconsistency);
        }

        // Step 7: debit. Never reverse the vendor activation on failure.
        let note = format!(
            "Parking session {} in zone {} (confirmation {})",
            session.id, session.zone, confirmation.confirmation_id
        );
        let debit = with_deadline(
            self.call_timeout,
            "wallet debit",
            ParkingError::LedgerUnavailable,
            self.ledger.debit(user_id, quote.total_price, &note),
        )
        .await;

        match debit {
            Ok(entry) => {
                self.finalize(
                    attempt_id,
                    AttemptFinalization {
                        outcome: AttemptOutcome::Success,
                        session_id: Some(session.id),
                        vendor_call_result: activated,
                        wallet_debit_result: WalletDebitResult::Debited {
                            amount: quote.total_price,
                            entry_id: entry.entry_id,
                        },
                    },
                )
                .await;
                info!(
                    session_id = %session.id,
                    confirmation = %session.vendor_confirmation_id,
                    charged = %display_cents(quote.total_price),
                    "Parking session started"
                );
            }
            Err(e) => {
                let inconsistency = ParkingError::PaymentInconsistency {
                    session_id: session.id,
                    quote_id,
                    reason: format!("wallet debit failed: {}", e),
                };
                error!(error = %inconsistency, "Queued for reconciliation");
                self.finalize(
                    attempt_id,
                    AttemptFinalization {
                        outcome: AttemptOutcome::Inconsistent,
                        session_id: Some(session.id),
                        vendor_call_result: activated,
                        wallet_debit_result: WalletDebitResult::Failed {
                            amount: quote.total_price,
                            error: e.to_string(),
                        },
                    },
                )
                .await;
            }
        }

        Ok(session)
    }

    /// Sessions owned by `user_id`, newest first
    pub async fn sessions_for_user(&self, user_id: &str) -> ParkingResult<Vec<Session>> {
        self.stores.sessions.list_for_user(user_id).await
    }

    /// Attempts where the vendor charged but the wallet was not debited
    pub async fn pending_reconciliation(&self) -> ParkingResult<Vec<PaymentAttempt>> {
        self.stores
            .attempts
            .list_by_outcome(AttemptOutcome::Inconsistent)
            .await
    }

    async fn claim_and_check(&self, user_id: &str, quote_id: Uuid) -> ParkingResult<Quote> {
        let quote = self
            .stores
            .quotes
            .get(quote_id)
            .await?
            .ok_or_else(|| ParkingError::not_found("quote", quote_id))?;

        if !self.stores.quotes.claim(quote_id).await? {
            warn!("Quote already consumed");
            return Err(ParkingError::Duplicate { quote_id });
        }

        let available = with_deadline(
            self.call_timeout,
            "balance check",
            ParkingError::LedgerUnavailable,
            self.ledger.check_balance(user_id),
        )
        .await?;

        if available < quote.total_price {
            info!(
                required = quote.total_price,
                available, "Insufficient wallet balance"
            );
            return Err(ParkingError::InsufficientFunds {
                required: quote.total_price,
                available,
            });
        }

        Ok(quote)
    }

    async fn finalize(&self, attempt_id: Uuid, finalization: AttemptFinalization) {
        let outcome = finalization.outcome;
        if let Err(e) = self.stores.attempts.finalize(attempt_id, finalization).await {
            error!(%attempt_id, ?outcome, error = %e, "Could not finalize payment attempt");
        }
    }
}

/// Keep user-correctable vendor answers, fold everything else into
/// `VendorUnavailable`.
fn classify_vendor_error(err: ParkingError) -> ParkingError {
    match err {
        ParkingError::Validation(_)
        | ParkingError::NotFound { .. }
        | ParkingError::VendorUnavailable(_) => err,
        other => ParkingError::VendorUnavailable(other.to_string()),
    }
}
