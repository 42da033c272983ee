use anyhow::Result;
use std::env;
use std::str::FromStr;
use crate::constants::{
    DEFAULT_COOLED_END_AFTER_DAYS, DEFAULT_COOLING_AFTER_DAYS, DEFAULT_MISSION_DURATION_DAYS,
    DEFAULT_SERVER_PORT, DEFAULT_SWEEP_INTERVAL_SECS,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Comma-separated CORS origins; permissive when unset
    pub allowed_origins: Option<String>,
    pub cooling_after_days: i64,
    pub cooled_end_after_days: i64,
    pub mission_duration_days: i64,
    pub sweep_interval_secs: u64,
    /// Run the maintenance sweep inside the server process
    pub run_sweeper: bool,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            port: env_or("PORT", DEFAULT_SERVER_PORT),
            allowed_origins: env::var("ALLOWED_ORIGINS").ok(),
            cooling_after_days: env_or("COOLING_AFTER_DAYS", DEFAULT_COOLING_AFTER_DAYS),
            cooled_end_after_days: env_or("COOLED_END_AFTER_DAYS", DEFAULT_COOLED_END_AFTER_DAYS),
            mission_duration_days: env_or("MISSION_DURATION_DAYS", DEFAULT_MISSION_DURATION_DAYS),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS),
            run_sweeper: env_or("RUN_SWEEPER", true),
            ..Self::with_defaults(database_url)
        })
    }

    pub fn with_defaults(database_url: String) -> Self {
        Self {
            database_url,
            port: DEFAULT_SERVER_PORT,
            allowed_origins: None,
            cooling_after_days: DEFAULT_COOLING_AFTER_DAYS,
            cooled_end_after_days: DEFAULT_COOLED_END_AFTER_DAYS,
            mission_duration_days: DEFAULT_MISSION_DURATION_DAYS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            run_sweeper: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_defaults("postgres://localhost/linka".into());
        assert_eq!(config.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.cooling_after_days, 14);
        assert_eq!(config.cooled_end_after_days, 30);
        assert!(config.allowed_origins.is_none());
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        assert_eq!(env_or("LINKA_TEST_UNSET_VARIABLE", 42u64), 42);
    }
}
