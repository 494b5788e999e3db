use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// ATR multiples for price levels and the whale-wall thresholds, read from
/// the `[risk]` section of the scoring config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Width of the entry zone behind price.
    pub entry_atr: f64,
    /// Distance from price to the stop.
    pub stop_atr: f64,
    pub tp1_atr: f64,
    pub tp2_atr: f64,
    /// A single resting order above this notional (USD) is a wall.
    pub wall_notional_usd: f64,
    /// Only walls within this distance of the entry (percent) raise an alert.
    pub wall_distance_pct: f64,
    /// Length of one lookback candle, used for the time-to-target estimate.
    pub candle_hours: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            entry_atr: 0.25,
            stop_atr: 1.5,
            tp1_atr: 1.5,
            tp2_atr: 3.0,
            wall_notional_usd: 1_000_000.0,
            wall_distance_pct: 1.5,
            candle_hours: 1.0,
        }
    }
}

#[derive(Deserialize)]
struct RiskSection {
    #[serde(default)]
    risk: RiskConfig,
}

impl RiskConfig {
    /// Load the `[risk]` section; `None` or a missing section yields defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read risk config at '{path}': {e}")))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("failed to parse risk config at '{path}': {e}")))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<RiskSection>(content).map(|s| s.risk)
    }
}
