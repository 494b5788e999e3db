use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ─── Market data ──────────────────────────────────────────────────────────────

/// One row of the upstream futures market overview (24h statistics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTicker {
    /// Base asset, e.g. "XTZ".
    pub symbol: String,
    pub price: f64,
    /// 24h traded volume in USD.
    pub volume_usd: f64,
    /// 24h price change in percent (3.0 = +3%).
    pub price_change_percent: f64,
    /// Days since the contract was listed, when the upstream reports it.
    #[serde(default)]
    pub listed_days: Option<u32>,
}

/// OHLC candle over one lookback period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A resting order level: price and quantity in base units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
}

impl BookLevel {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    /// Total bid and ask notional within `depth_pct` percent of `price`.
    pub fn notional_near(&self, price: f64, depth_pct: f64) -> (f64, f64) {
        let band = price * depth_pct / 100.0;
        let within = |levels: &[BookLevel]| {
            levels
                .iter()
                .filter(|l| (l.price - price).abs() <= band)
                .map(BookLevel::notional)
                .sum::<f64>()
        };
        (within(&self.bids), within(&self.asks))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    #[default]
    Neutral,
    Bearish,
}

/// Sentiment label plus an optional headline from the news feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub label: Sentiment,
    pub headline: Option<String>,
}

/// Everything the scorer looks at for a single candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    pub ticker: MarketTicker,
    /// Lookback candles, oldest first.
    pub candles: Vec<Candle>,
    pub funding_rate: f64,
    /// Open-interest change over the lookback window, in percent.
    pub open_interest_change_pct: f64,
    pub order_book: OrderBook,
    /// Price levels with large clusters of leveraged positions.
    pub liquidation_levels: Vec<f64>,
    pub sentiment: SentimentReading,
}

// ─── Signals ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for LONG, -1 for SHORT.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Lifecycle of a stored signal. Any status may be written directly by the
/// operator; only the poller's alert check moves `Active` to `Alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum SignalStatus {
    Pending,
    Active,
    Alert,
    ClosedProfit,
    ClosedLoss,
}

impl SignalStatus {
    /// Pending and active signals block a new signal for the same symbol.
    pub fn is_open(self) -> bool {
        matches!(self, SignalStatus::Pending | SignalStatus::Active)
    }
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Pending => write!(f, "pending"),
            SignalStatus::Active => write!(f, "active"),
            SignalStatus::Alert => write!(f, "alert"),
            SignalStatus::ClosedProfit => write!(f, "closed_profit"),
            SignalStatus::ClosedLoss => write!(f, "closed_loss"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum AlertKind {
    WhaleWall,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::WhaleWall => write!(f, "whale_wall"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryZone {
    pub low: f64,
    pub high: f64,
}

impl EntryZone {
    pub fn mid(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitZone {
    pub tp1: f64,
    pub tp2: f64,
}

/// Suggested price levels for a setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLevels {
    pub entry_zone: EntryZone,
    pub stop_loss: f64,
    pub take_profit_zone: TakeProfitZone,
}

/// A scored setup ready to be stored. The store assigns id and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSetup {
    pub symbol: String,
    pub direction: Direction,
    #[serde(flatten)]
    pub levels: PriceLevels,
    /// 0–100.
    pub confidence: f64,
    pub risk_note: String,
    pub reason: String,
    /// Rough time to each target, e.g. "TP1: ~3h, TP2: ~9h".
    pub estimated_time_to_tps: String,
}

/// A stored signal as served by the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub id: i64,
    pub symbol: String,
    pub direction: Direction,
    pub entry_zone: EntryZone,
    pub stop_loss: f64,
    pub take_profit_zone: TakeProfitZone,
    pub confidence: f64,
    pub status: SignalStatus,
    pub pnl: Option<f64>,
    pub entry_price: Option<f64>,
    pub alert_message: Option<String>,
    pub alert_type: Option<AlertKind>,
    pub risk_note: String,
    pub reason: String,
    pub estimated_time_to_tps: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SignalRecord {
    pub fn pending(id: i64, setup: TradeSetup, now: DateTime<Utc>) -> Self {
        Self {
            id,
            symbol: setup.symbol,
            direction: setup.direction,
            entry_zone: setup.levels.entry_zone,
            stop_loss: setup.levels.stop_loss,
            take_profit_zone: setup.levels.take_profit_zone,
            confidence: setup.confidence,
            status: SignalStatus::Pending,
            pnl: None,
            entry_price: None,
            alert_message: None,
            alert_type: None,
            risk_note: setup.risk_note,
            reason: setup.reason,
            estimated_time_to_tps: setup.estimated_time_to_tps,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite exactly the fields present in `update`.
    pub fn apply(&mut self, update: &StatusUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(pnl) = update.pnl {
            self.pnl = pnl;
        }
        if let Some(entry_price) = update.entry_price {
            self.entry_price = Some(entry_price);
        }
        self.updated_at = now;
    }

    pub fn raise(&mut self, alert: &SignalAlert, now: DateTime<Utc>) {
        self.status = SignalStatus::Alert;
        self.alert_type = Some(alert.kind);
        self.alert_message = Some(alert.message.clone());
        self.updated_at = now;
    }
}

/// Body of the status endpoint. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<SignalStatus>,
    /// `Some(None)` is an explicit `"pnl": null` and clears the value.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Option<f64>>,
    #[serde(default)]
    pub entry_price: Option<f64>,
}

impl StatusUpdate {
    /// A bare lifecycle move with no pnl or fill price.
    pub fn status(status: SignalStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }
}

/// Marks a key as present, so `null` deserializes to `Some(None)`.
fn present<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(d).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAlert {
    pub kind: AlertKind,
    pub message: String,
}

// ─── Poller ───────────────────────────────────────────────────────────────────

/// Where market data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    Live,
    Paper,
}

impl std::fmt::Display for DataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataMode::Live => write!(f, "live"),
            DataMode::Paper => write!(f, "paper"),
        }
    }
}

/// Current state of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for PollerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollerState::Stopped => write!(f, "stopped"),
            PollerState::Running => write!(f, "running"),
            PollerState::Paused => write!(f, "paused"),
        }
    }
}

/// Commands sent to the poller via its command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    Start,
    Stop,
    Pause,
    Resume,
    /// Run one tick now, regardless of the schedule.
    RunNow,
}

/// Summary of one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub candidates: usize,
    pub scored: usize,
    pub inserted: usize,
    pub alerts: usize,
}
