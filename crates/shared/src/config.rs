//! Application configuration management.
//!
//! Layered: `config/default`, then `config/{RUN_MODE}`, then environment
//! variables prefixed `POCKETBANK` with `__` as the section separator
//! (`POCKETBANK__LEDGER__LOCK_TIMEOUT_MS=5000`).

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Credential collaborator configuration.
    #[serde(default)]
    pub auth: AuthServiceConfig,
    /// Money-movement policy.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Scheduled transfer worker.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret shared with the auth service.
    pub secret: String,
}

/// Where login passwords are checked.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthServiceConfig {
    /// Base URL of the auth service.
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_auth_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
            timeout_ms: default_auth_timeout_ms(),
        }
    }
}

fn default_auth_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_auth_timeout_ms() -> u64 {
    3000
}

/// Money-movement policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on waiting for an account lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Consecutive simple-password mismatches before the account locks.
    #[serde(default = "default_max_password_attempts")]
    pub max_password_attempts: u32,
    /// How long idempotency keys are remembered.
    #[serde(default = "default_idempotency_retention_secs")]
    pub idempotency_retention_secs: u64,
    /// Largest amount accepted for a single transfer or deposit.
    #[serde(default = "default_max_transfer_amount")]
    pub max_transfer_amount: i64,
    /// Argon2 memory cost in KiB for simple-password verifiers.
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count for simple-password verifiers.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            max_password_attempts: default_max_password_attempts(),
            idempotency_retention_secs: default_idempotency_retention_secs(),
            max_transfer_amount: default_max_transfer_amount(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
        }
    }
}

impl LedgerConfig {
    /// Lock acquisition timeout.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Idempotency retention window.
    #[must_use]
    pub const fn idempotency_retention(&self) -> Duration {
        Duration::from_secs(self.idempotency_retention_secs)
    }
}

fn default_lock_timeout_ms() -> u64 {
    3000
}

fn default_max_password_attempts() -> u32 {
    5
}

fn default_idempotency_retention_secs() -> u64 {
    86_400
}

fn default_max_transfer_amount() -> i64 {
    10_000_000
}

fn default_argon2_memory_kib() -> u32 {
    19_456
}

fn default_argon2_iterations() -> u32 {
    2
}

/// Scheduled transfer worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether this process runs the worker.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweeps.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum due schedules claimed per sweep.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Age after which an EXECUTING claim is considered abandoned.
    #[serde(default = "default_claim_timeout_secs")]
    pub claim_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            claim_timeout_secs: default_claim_timeout_secs(),
        }
    }
}

impl SchedulerConfig {
    /// Interval between sweeps.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Abandoned-claim threshold.
    #[must_use]
    pub const fn claim_timeout(&self) -> Duration {
        Duration::from_secs(self.claim_timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_batch_size() -> u64 {
    50
}

fn default_claim_timeout_secs() -> u64 {
    300
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("POCKETBANK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
