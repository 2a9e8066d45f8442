//! # curb-vendor
//!
//! HTTP adapters for the collaborators curbside talks to.
//!
//! This crate provides:
//!
//! 1. **HttpRateVendor** - zone rates, pricing and paid activation
//!    - Zone and price reads retry 5xx/429/transport failures
//!    - Activation is sent exactly once
//!    - Decimal-dollar wire amounts converted to cents
//!
//! 2. **HttpWalletLedger** - balance, debit and credit
//!    - Never retried
//!
//! 3. **EnvCredentialProvider** - payment card read from the environment
//!    on every activation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use curb_vendor::{EnvCredentialProvider, HttpRateVendor, HttpWalletLedger};
//! use curb_core::RateVendor;
//!
//! let vendor = HttpRateVendor::from_env()?;
//! let ledger = HttpWalletLedger::from_env()?;
//! let credentials = EnvCredentialProvider::from_env()?;
//!
//! let zone = vendor.get_zone_rates("4021").await?;
//! println!("{} offers {} time blocks", zone.name, zone.time_blocks.len());
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod retry;
pub mod wallet;

// Re-exports
pub use client::HttpRateVendor;
pub use config::{LedgerConfig, VendorConfig, DEFAULT_TIMEOUT_SECS};
pub use credentials::EnvCredentialProvider;
pub use retry::RetryPolicy;
pub use wallet::HttpWalletLedger;
