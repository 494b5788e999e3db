use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Thresholds and weights for filtering and scoring, read from the
/// `[filter]` and `[scoring]` sections of the scoring config file.
///
/// Example `config/scoring.toml`:
/// ```toml
/// [filter]
/// min_volume_usd = 25000000.0
/// max_change_percent = 8.0
///
/// [scoring]
/// trend_mode = "follow"
/// min_confidence = 85.0
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl StrategyFileConfig {
    /// Load from a TOML file; `None` yields the built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read scoring config at '{path}': {e}")))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("failed to parse scoring config at '{path}': {e}")))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Candidates must trade strictly more than this in 24h (USD).
    pub min_volume_usd: f64,
    /// Candidates must have moved strictly less than this in 24h (percent).
    pub max_change_percent: f64,
    /// Minimum listing age, applied only when the upstream reports it.
    pub min_listed_days: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_volume_usd: 25_000_000.0,
            max_change_percent: 8.0,
            min_listed_days: 25,
        }
    }
}

/// Whether a 24h move is followed or faded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendMode {
    #[default]
    Follow,
    Fade,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub trend_mode: TrendMode,
    /// Number of candles in the lookback window.
    pub lookback: usize,
    /// Trend moves smaller than this (percent) count as flat.
    pub flat_trend_pct: f64,
    pub base_score: f64,
    pub min_confidence: f64,
    pub trend_bonus: f64,
    pub funding_bonus: f64,
    pub oi_bonus: f64,
    pub book_bonus: f64,
    /// Order-book depth considered for the imbalance, percent around price.
    pub book_depth_pct: f64,
    /// Bid/ask notional ratio at which the book favours one side.
    pub imbalance_ratio: f64,
    pub liquidation_bonus: f64,
    pub liquidation_proximity_pct: f64,
    pub sentiment_bonus: f64,
    /// Headlines containing any of these (case-insensitive) discard the candidate.
    pub veto_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trend_mode: TrendMode::Follow,
            lookback: 24,
            flat_trend_pct: 0.1,
            base_score: 50.0,
            min_confidence: 85.0,
            trend_bonus: 15.0,
            funding_bonus: 10.0,
            oi_bonus: 10.0,
            book_bonus: 10.0,
            book_depth_pct: 2.0,
            imbalance_ratio: 1.5,
            liquidation_bonus: 10.0,
            liquidation_proximity_pct: 2.0,
            sentiment_bonus: 5.0,
            veto_keywords: vec!["Delisting".into(), "Unlock".into()],
        }
    }
}
