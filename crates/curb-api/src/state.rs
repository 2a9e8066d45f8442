//! # Application State
//!
//! Shared state for the Axum application.
//! Wires the orchestrator and lifecycle scanner to their collaborators.

use curb_core::{
    BoxedCredentialProvider, BoxedNotificationQueue, BoxedRateVendor, BoxedWalletLedger,
    ChannelNotificationQueue, FixedTestCredentials, InMemoryWallet, LifecycleScanner,
    PaymentOrchestrator, PricingPolicy, ReminderTask, Stores, MIN_REMINDER_BUFFER_MINUTES,
};
use curb_vendor::{
    EnvCredentialProvider, HttpRateVendor, HttpWalletLedger, LedgerConfig, RetryPolicy,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Tuning read from `config/curbside.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Seconds between lifecycle scans
    pub scan_interval_secs: u64,
    /// Deadline for activation, ledger and credential calls
    pub call_timeout_secs: u64,
    /// Deadline for vendor reads, retries included
    pub read_budget_secs: u64,
    /// Minimum time left for a reminder to be accepted
    pub reminder_buffer_minutes: i64,
    pub retry: RetrySettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: 60,
            call_timeout_secs: 10,
            read_budget_secs: 30,
            reminder_buffer_minutes: MIN_REMINDER_BUFFER_MINUTES,
            retry: RetrySettings::default(),
        }
    }
}

impl ServiceSettings {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }

    pub fn read_budget(&self) -> Duration {
        Duration::from_secs(self.read_budget_secs.max(1))
    }

    pub fn reminder_buffer(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.reminder_buffer_minutes.max(0))
    }
}

/// Backoff for vendor reads
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            jitter_pct: policy.jitter_pct,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_pct,
        )
    }
}

/// Receiving end of the reminder queue, drained by the dispatcher worker
pub type ReminderReceiver = UnboundedReceiver<ReminderTask>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Quote and session-start orchestration
    pub orchestrator: PaymentOrchestrator,
    /// Expiry, alerts and reminders
    pub scanner: LifecycleScanner,
    /// Application config
    pub config: AppConfig,
    /// Timeouts, scan interval and retry tuning
    pub settings: ServiceSettings,
}

impl AppState {
    /// Build state from the environment and `config/curbside.toml`.
    pub fn new() -> anyhow::Result<(Self, ReminderReceiver)> {
        let config = AppConfig::from_env();
        let settings = load_service_settings()?;

        let vendor = HttpRateVendor::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize rate vendor: {}", e))?
            .with_retry(settings.retry.policy());
        let ledger = build_ledger(&config)?;
        let credentials = build_credentials(&config)?;

        let (queue, receiver) = ChannelNotificationQueue::new();

        let state = Self::from_parts(
            config,
            settings,
            Arc::new(vendor),
            ledger,
            credentials,
            Arc::new(queue),
        );
        Ok((state, receiver))
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: AppConfig,
        settings: ServiceSettings,
        vendor: BoxedRateVendor,
        ledger: BoxedWalletLedger,
        credentials: BoxedCredentialProvider,
        notifications: BoxedNotificationQueue,
    ) -> Self {
        let stores = Stores::in_memory();
        let policy = PricingPolicy::for_environment(&config.environment);

        let orchestrator =
            PaymentOrchestrator::new(vendor, ledger, credentials, stores.clone(), policy)
                .with_call_timeout(settings.call_timeout())
                .with_read_budget(settings.read_budget());
        let scanner = LifecycleScanner::new(stores.sessions, notifications)
            .with_min_buffer(settings.reminder_buffer());

        Self {
            orchestrator,
            scanner,
            config,
            settings,
        }
    }
}

/// Production always talks to the ledger service; other environments fall
/// back to a process-local wallet when no ledger is configured.
fn build_ledger(config: &AppConfig) -> anyhow::Result<BoxedWalletLedger> {
    if config.is_production() || std::env::var_os("LEDGER_API_BASE_URL").is_some() {
        let ledger = HttpWalletLedger::new(
            LedgerConfig::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to load ledger config: {}", e))?,
        )
        .map_err(|e| anyhow::anyhow!("Failed to initialize ledger: {}", e))?;
        return Ok(Arc::new(ledger));
    }

    tracing::warn!("LEDGER_API_BASE_URL not set, using an in-memory wallet");
    Ok(Arc::new(InMemoryWallet::new()))
}

/// The real card is only ever loaded in production.
fn build_credentials(config: &AppConfig) -> anyhow::Result<BoxedCredentialProvider> {
    if config.is_production() {
        let provider = EnvCredentialProvider::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load payment card: {}", e))?;
        Ok(Arc::new(provider))
    } else {
        Ok(Arc::new(FixedTestCredentials))
    }
}

/// Load service tuning from config file
fn load_service_settings() -> anyhow::Result<ServiceSettings> {
    let config_paths = [
        "config/curbside.toml",
        "../config/curbside.toml",
        "../../config/curbside.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let settings: ServiceSettings = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded service settings from {}", path);
            return Ok(settings);
        }
    }

    tracing::warn!("No service settings found, using defaults");
    Ok(ServiceSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use curb_core::CredentialProvider;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_bad_socket_addr() {
        let config = AppConfig {
            host: "not a host".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_settings_partial_file() {
        let settings: ServiceSettings = toml::from_str(
            r#"
            scan_interval_secs = 15

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.scan_interval(), Duration::from_secs(15));
        assert_eq!(settings.call_timeout(), Duration::from_secs(10));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.base_delay_ms, 250);
        assert_eq!(settings.reminder_buffer(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_environment_selects_credentials() {
        let staging = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "staging".to_string(),
        };
        let provider = build_credentials(&staging).unwrap();
        assert_eq!(provider.provider_name(), "fixed-test");
    }
}
