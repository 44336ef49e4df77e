use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    pub fares: FareConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Bound on row-lock waits inside sale and check-in transactions.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_max_connections() -> u32 { 10 }
fn default_acquire_timeout_secs() -> u64 { 5 }
fn default_lock_timeout_ms() -> u64 { 2000 }

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FareConfig {
    /// "table" (deterministic lookup, the default) or "random".
    #[serde(default = "default_fare_strategy")]
    pub strategy: String,
    pub default_first_cents: i64,
    pub default_regular_cents: i64,
}

fn default_fare_strategy() -> String { "table".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Sales close this many minutes before departure. 0 means sales are
    /// accepted strictly until departure time.
    #[serde(default)]
    pub sale_cutoff_minutes: i64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file that shouldn't be checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of VOA)
            // E.g. `VOA__SERVER__PORT=9000` would set `server.port`
            .add_source(config::Environment::with_prefix("VOA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
