use async_trait::async_trait;

use crate::{Candle, MarketTicker, OrderBook, Result, SentimentReading};

/// Abstraction over the market-data provider.
///
/// `CoinGlassClient` implements this against the live REST API.
/// `PaperMarket` implements this with deterministic fixtures.
///
/// Every method is a single upstream call; the poller bounds each with a
/// timeout and treats any error as "no data this tick".
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// 24h overview of all listed instruments.
    async fn tickers(&self) -> Result<Vec<MarketTicker>>;

    /// The last `limit` candles for `symbol`, oldest first.
    async fn candles(&self, symbol: &str, limit: usize) -> Result<Vec<Candle>>;

    /// Current funding rate (positive = longs pay shorts).
    async fn funding_rate(&self, symbol: &str) -> Result<f64>;

    /// Open-interest change over the lookback window, in percent.
    async fn open_interest_change(&self, symbol: &str) -> Result<f64>;

    async fn order_book(&self, symbol: &str) -> Result<OrderBook>;

    /// Price levels carrying large liquidation clusters.
    async fn liquidation_levels(&self, symbol: &str) -> Result<Vec<f64>>;

    async fn sentiment(&self, symbol: &str) -> Result<SentimentReading>;
}
