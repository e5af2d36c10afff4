use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

/// Placeholder signing keys that are treated as unset.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "dev-secret",
];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// `None` means a random per-process key.
    pub secret_key: Option<String>,
    /// `None` means any origin.
    pub cors_origins: Option<Vec<String>>,
    pub token_max_age: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_age_days: u64 = try_load("TIPLINE_TOKEN_MAX_AGE_DAYS", "30")?;
        let token_max_age = days(max_age_days)
            .with_context(|| format!("TIPLINE_TOKEN_MAX_AGE_DAYS too large: {max_age_days}"))?;

        Ok(Self {
            host: try_load("TIPLINE_HOST", "0.0.0.0")?,
            port: try_load("TIPLINE_PORT", "5000")?,
            db_path: try_load("TIPLINE_DB_PATH", "tipline.db")?,
            secret_key: env::var("TIPLINE_SECRET_KEY")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && !PLACEHOLDER_SECRETS.contains(&s.as_str())),
            cors_origins: parse_origins(&try_load::<String>("TIPLINE_CORS_ORIGINS", "*")?),
            token_max_age,
            max_body_bytes: try_load("TIPLINE_MAX_BODY_BYTES", "16777216")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}

fn days(n: u64) -> Option<Duration> {
    n.checked_mul(24 * 60 * 60).map(Duration::from_secs)
}

fn parse_origins(raw: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        None
    } else {
        Some(origins)
    }
}
