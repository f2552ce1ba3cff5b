use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Lifetime of a prefill token, counted from issuance.
    pub intent_ttl_minutes: i64,
    /// How often pending intents past their expiry are marked `expired`.
    pub expiry_sweep_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            database_url: var("DATABASE_URL").with_context(|| {
                "Required environment variable 'DATABASE_URL' is not set".to_string()
            })?,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            intent_ttl_minutes: var("INTENT_TTL_MINUTES")
                .unwrap_or_else(|| "15".to_string())
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .context("INTENT_TTL_MINUTES must be a positive integer")?,
            expiry_sweep_seconds: var("EXPIRY_SWEEP_SECONDS")
                .unwrap_or_else(|| "60".to_string())
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .context("EXPIRY_SWEEP_SECONDS must be a positive integer")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_optional_vars_missing() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/prefill")]))
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.intent_ttl_minutes, 15);
        assert_eq!(config.expiry_sweep_seconds, 60);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        let err = Config::from_vars(vars(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/prefill"),
            ("INTENT_TTL_MINUTES", "0"),
        ]));
        assert!(result.is_err());
    }
}
