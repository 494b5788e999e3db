use std::time::Duration;

use crate::{DataMode, Error, Result};

pub const DEFAULT_COINGLASS_BASE_URL: &str = "https://open-api-v3.coinglass.com";

/// All configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Market data
    pub data_mode: DataMode,
    pub coinglass_api_key: Option<String>,
    pub coinglass_base_url: String,

    // HTTP server
    pub port: u16,

    // Poller
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_candidates: usize,

    // Persistence. `None` keeps signals in memory only.
    pub database_url: Option<String>,

    // Filter/scoring/risk thresholds file
    pub scoring_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("COINGLASS_API_KEY").filter(|k| !k.trim().is_empty());

        let data_mode = match lookup("MARKET_DATA_MODE").map(|m| m.to_lowercase()) {
            Some(m) if m == "live" => DataMode::Live,
            Some(m) if m == "paper" => DataMode::Paper,
            Some(other) => {
                return Err(Error::Config(format!(
                    "MARKET_DATA_MODE must be 'live' or 'paper', got: '{other}'"
                )))
            }
            None if api_key.is_some() => DataMode::Live,
            None => DataMode::Paper,
        };

        if data_mode == DataMode::Live && api_key.is_none() {
            return Err(Error::Config(
                "COINGLASS_API_KEY is required when MARKET_DATA_MODE=live".into(),
            ));
        }

        let poll_secs = positive_secs(&lookup, "POLL_INTERVAL_SECS", 300)?;
        let timeout_secs = positive_secs(&lookup, "REQUEST_TIMEOUT_SECS", 10)?;

        Ok(Config {
            data_mode,
            coinglass_api_key: api_key,
            coinglass_base_url: lookup("COINGLASS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COINGLASS_BASE_URL.to_string()),
            port: parsed(&lookup, "PORT")?.unwrap_or(5000),
            poll_interval: Duration::from_secs(poll_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            max_candidates: parsed(&lookup, "MAX_CANDIDATES")?.unwrap_or(5),
            database_url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
            scoring_config_path: lookup("SCORING_CONFIG_PATH").filter(|p| !p.is_empty()),
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
    }
}

/// A duration in whole seconds that must be at least 1.
fn positive_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed(lookup, key)?.unwrap_or(default) {
        0 => Err(Error::Config(format!("{key} must be greater than zero"))),
        secs => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_paper_without_api_key() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.data_mode, DataMode::Paper);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.poll_interval, Duration::from_secs(300));
        assert_eq!(cfg.max_candidates, 5);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn api_key_switches_to_live() {
        let cfg = load(&[("COINGLASS_API_KEY", "abc")]).unwrap();
        assert_eq!(cfg.data_mode, DataMode::Live);
        assert_eq!(cfg.coinglass_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn live_mode_requires_api_key() {
        assert!(matches!(load(&[("MARKET_DATA_MODE", "live")]), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        assert!(matches!(load(&[("PORT", "eighty")]), Err(Error::Config(_))));
    }

    #[test]
    fn reads_poller_overrides() {
        let cfg = load(&[
            ("POLL_INTERVAL_SECS", "60"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("MAX_CANDIDATES", "2"),
        ])
        .unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.max_candidates, 2);
    }

    #[test]
    fn rejects_zero_durations() {
        assert!(matches!(load(&[("POLL_INTERVAL_SECS", "0")]), Err(Error::Config(_))));
        assert!(matches!(load(&[("REQUEST_TIMEOUT_SECS", "0")]), Err(Error::Config(_))));
        assert!(load(&[("POLL_INTERVAL_SECS", "1"), ("REQUEST_TIMEOUT_SECS", "1")]).is_ok());
    }
}
