//! Configuration
//!
//! Every setting can come from a flag, the environment, or a `.env` file.

use std::time::Duration;

use clap::{Args, ValueEnum};
use storefront::{orders::TransitionPolicy, phone::PhonePolicy};

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Application settings.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Seconds to wait on any single backend call
    #[arg(long, env = "BACKEND_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub backend_timeout_seconds: u64,

    /// Order status changes: permissive (any status) or strict (lifecycle edges only)
    #[arg(long, env = "ORDER_TRANSITIONS", default_value_t = TransitionPolicy::Permissive)]
    pub order_transitions: TransitionPolicy,

    /// Phone number rules for customers (egyptian, croatian)
    #[arg(long, env = "PHONE_POLICY", default_value_t = PhonePolicy::Egyptian)]
    pub phone_policy: PhonePolicy,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Deadline for one backend call.
    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_seconds)
    }
}
