//! # curb-core
//!
//! Core types, traits and orchestration for curbside parking sessions.
//!
//! This crate provides:
//! - `RateVendor`, `WalletLedger`, `CredentialProvider` and
//!   `NotificationQueue` traits for the external collaborators
//! - `QuoteStore`, `SessionStore` and `AttemptLog` persistence traits with
//!   in-memory implementations
//! - `PaymentOrchestrator` for quoting and at-most-once paid session starts
//! - `LifecycleScanner` for expiry, alerts and reminders
//! - `PricingPolicy` for the production/non-production fee source
//! - `ParkingError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use curb_core::{PaymentOrchestrator, PriceRequest, PricingPolicy, Stores, TimeUnit, Vehicle};
//!
//! let orchestrator = PaymentOrchestrator::new(
//!     vendor,
//!     ledger,
//!     credentials,
//!     Stores::in_memory(),
//!     PricingPolicy::for_environment("staging"),
//! );
//!
//! let quote = orchestrator
//!     .quote_price(PriceRequest {
//!         zone: "4021".into(),
//!         time_unit: TimeUnit::Hours,
//!         time_quantity: 2,
//!         time_block_id: 2,
//!     })
//!     .await?;
//!
//! let session = orchestrator
//!     .start_session("user-1", quote.id, &Vehicle::new("ABC123", "TX"), "wallet")
//!     .await?;
//! ```

pub mod attempt;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod money;
pub mod notify;
pub mod orchestrator;
pub mod pricing;
pub mod quote;
pub mod session;
pub mod store;
pub mod vendor;
pub mod zone;

// Re-exports for convenience
pub use attempt::{AttemptOutcome, PaymentAttempt, VendorCallResult, WalletDebitResult};
pub use credentials::{
    BoxedCredentialProvider, CredentialProvider, FixedTestCredentials, PaymentInstrument,
};
pub use error::{ParkingError, ParkingResult};
pub use ledger::{BoxedWalletLedger, InMemoryWallet, LedgerEntry, WalletLedger};
pub use lifecycle::{AlertScan, LifecycleScanner};
pub use memory::{InMemoryAttemptLog, InMemoryQuoteStore, InMemorySessionStore};
pub use money::{cents_to_dollars, display_cents, dollars_to_cents, FeeBreakdown};
pub use notify::{BoxedNotificationQueue, ChannelNotificationQueue, NotificationQueue, ReminderTask};
pub use orchestrator::{PaymentOrchestrator, Stores, DEFAULT_CALL_TIMEOUT, DEFAULT_READ_BUDGET};
pub use pricing::PricingPolicy;
pub use quote::{ParkingWindow, Quote, VendorPriceResponse};
pub use session::{Session, SessionStatus, Vehicle, MIN_REMINDER_BUFFER_MINUTES};
pub use store::{AttemptLog, QuoteStore, SessionStore};
pub use vendor::{ActivationRequest, BoxedRateVendor, PriceRequest, RateVendor, VendorConfirmation};
pub use zone::{GeoPoint, RateLine, TimeBlock, TimeUnit, ZoneInfo};
