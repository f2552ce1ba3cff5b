use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_url: String,
    pub webdriver_url: String,
    pub screenshot_dir: PathBuf,
    pub headless: bool,
    /// Only ever recorded and logged. The fill pipeline has no submit step to enable.
    pub stop_before_submit: bool,
    pub navigation_timeout: Duration,
    pub field_timeout: Duration,
    pub rust_log: String,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(AgentConfig {
            api_url: var("PREFILL_API_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            webdriver_url: var("WEBDRIVER_URL")
                .unwrap_or_else(|| "http://localhost:4444".to_string()),
            screenshot_dir: var("SCREENSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./prefill-screenshots")),
            headless: parse_flag("HEADLESS", var("HEADLESS"), false)?,
            stop_before_submit: parse_flag("STOP_BEFORE_SUBMIT", var("STOP_BEFORE_SUBMIT"), true)?,
            navigation_timeout: parse_seconds(
                "NAVIGATION_TIMEOUT_SECS",
                var("NAVIGATION_TIMEOUT_SECS"),
                30,
            )?,
            field_timeout: parse_seconds("FIELD_TIMEOUT_SECS", var("FIELD_TIMEOUT_SECS"), 5)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{name} must be a boolean (true/false), got '{other}'"),
    }
}

fn parse_seconds(name: &str, raw: Option<String>, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .with_context(|| format!("{name} must be a positive number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
