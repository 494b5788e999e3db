use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    BookLevel, Candle, Error, MarketDataClient, MarketTicker, OrderBook, Result, Sentiment,
    SentimentReading,
};

/// Everything the simulated market knows about one symbol.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub ticker: MarketTicker,
    pub candles: Vec<Candle>,
    pub funding_rate: f64,
    pub open_interest_change_pct: f64,
    pub order_book: OrderBook,
    pub liquidation_levels: Vec<f64>,
    pub sentiment: SentimentReading,
}

/// Simulated market-data client.
///
/// Serves deterministic fixtures instead of calling CoinGlass, so the
/// dashboard can run without an API key and tests get a fixed price series.
/// No randomness: the same fixtures always score the same way.
#[derive(Clone)]
pub struct PaperMarket {
    fixtures: Arc<RwLock<BTreeMap<String, Fixture>>>,
    /// When set, every call fails as if the upstream were unreachable.
    offline: Arc<AtomicBool>,
}

impl PaperMarket {
    /// An empty market. Use `insert` to add fixtures.
    pub fn empty() -> Self {
        Self {
            fixtures: Arc::new(RwLock::new(BTreeMap::new())),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A market seeded with `default_fixtures()`.
    pub fn new() -> Self {
        let fixtures = default_fixtures();
        info!(symbols = fixtures.len(), "PaperMarket initialized");
        Self {
            fixtures: Arc::new(RwLock::new(
                fixtures.into_iter().map(|f| (f.ticker.symbol.clone(), f)).collect(),
            )),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn insert(&self, fixture: Fixture) {
        self.fixtures
            .write()
            .await
            .insert(fixture.ticker.symbol.clone(), fixture);
    }

    /// Replace the order book for `symbol`, e.g. to stage a whale wall.
    pub async fn set_order_book(&self, symbol: &str, book: OrderBook) -> Result<()> {
        let mut fixtures = self.fixtures.write().await;
        let fixture = fixtures
            .get_mut(symbol)
            .ok_or_else(|| Error::Other(format!("no paper fixture for '{symbol}'")))?;
        fixture.order_book = book;
        Ok(())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Http("paper market is offline".into()));
        }
        Ok(())
    }

    async fn with_fixture<T>(&self, symbol: &str, f: impl FnOnce(&Fixture) -> T) -> Result<T> {
        self.check_online()?;
        let fixtures = self.fixtures.read().await;
        let fixture = fixtures
            .get(symbol)
            .ok_or_else(|| Error::Other(format!("no paper fixture for '{symbol}'")))?;
        Ok(f(fixture))
    }
}

impl Default for PaperMarket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataClient for PaperMarket {
    async fn tickers(&self) -> Result<Vec<MarketTicker>> {
        self.check_online()?;
        let tickers: Vec<MarketTicker> =
            self.fixtures.read().await.values().map(|f| f.ticker.clone()).collect();
        debug!(count = tickers.len(), "Paper tickers served");
        Ok(tickers)
    }

    async fn candles(&self, symbol: &str, limit: usize) -> Result<Vec<Candle>> {
        self.with_fixture(symbol, |f| {
            let start = f.candles.len().saturating_sub(limit);
            f.candles[start..].to_vec()
        })
        .await
    }

    async fn funding_rate(&self, symbol: &str) -> Result<f64> {
        self.with_fixture(symbol, |f| f.funding_rate).await
    }

    async fn open_interest_change(&self, symbol: &str) -> Result<f64> {
        self.with_fixture(symbol, |f| f.open_interest_change_pct).await
    }

    async fn order_book(&self, symbol: &str) -> Result<OrderBook> {
        self.with_fixture(symbol, |f| f.order_book.clone()).await
    }

    async fn liquidation_levels(&self, symbol: &str) -> Result<Vec<f64>> {
        self.with_fixture(symbol, |f| f.liquidation_levels.clone()).await
    }

    async fn sentiment(&self, symbol: &str) -> Result<SentimentReading> {
        self.with_fixture(symbol, |f| f.sentiment.clone()).await
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// `n` candles ending at `last_close`, each moving `step_pct` percent from
/// the previous close, with a high-low range of `range_pct` percent.
pub fn trending_candles(last_close: f64, step_pct: f64, range_pct: f64, n: usize) -> Vec<Candle> {
    let factor = 1.0 + step_pct / 100.0;
    let first = last_close / factor.powi(n.saturating_sub(1) as i32);
    (0..n)
        .map(|i| {
            let close = first * factor.powi(i as i32);
            let open = close / factor;
            let half_range = close * range_pct / 200.0;
            Candle {
                open,
                high: close.max(open) + half_range,
                low: close.min(open) - half_range,
                close,
            }
        })
        .collect()
}

/// Order book with one level each side, `bid_usd` and `ask_usd` notional
/// resting `spread_pct` percent away from price.
pub fn book(price: f64, spread_pct: f64, bid_usd: f64, ask_usd: f64) -> OrderBook {
    let bid = price * (1.0 - spread_pct / 100.0);
    let ask = price * (1.0 + spread_pct / 100.0);
    OrderBook {
        bids: vec![BookLevel { price: bid, quantity: bid_usd / bid }],
        asks: vec![BookLevel { price: ask, quantity: ask_usd / ask }],
    }
}

fn ticker(symbol: &str, price: f64, volume_usd: f64, change: f64) -> MarketTicker {
    MarketTicker {
        symbol: symbol.into(),
        price,
        volume_usd,
        price_change_percent: change,
        listed_days: Some(365),
    }
}

/// The built-in market.
///
/// With the default scoring config:
/// - `XTZ` is a clean LONG and `HAEDAL` a clean SHORT (both accepted),
/// - `FTT` is vetoed by an unlock headline,
/// - `CROSS` scores below the threshold,
/// - `RUNE` (thin volume) and `PEPE` (oversized move) never pass the filter.
pub fn default_fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            ticker: ticker("XTZ", 0.82, 48_000_000.0, 3.4),
            candles: trending_candles(0.82, 0.15, 1.2, 24),
            funding_rate: -0.0001,
            open_interest_change_pct: 5.2,
            order_book: book(0.82, 0.3, 900_000.0, 250_000.0),
            liquidation_levels: vec![0.83, 0.76],
            sentiment: SentimentReading { label: Sentiment::Bullish, headline: None },
        },
        Fixture {
            ticker: ticker("HAEDAL", 0.1755, 31_000_000.0, -5.2),
            candles: trending_candles(0.1755, -0.2, 1.5, 24),
            funding_rate: 0.0003,
            open_interest_change_pct: 2.1,
            order_book: book(0.1755, 0.3, 150_000.0, 600_000.0),
            liquidation_levels: vec![0.1738],
            sentiment: SentimentReading { label: Sentiment::Bearish, headline: None },
        },
        Fixture {
            ticker: ticker("FTT", 1.105, 27_000_000.0, 2.1),
            candles: trending_candles(1.105, 0.1, 1.0, 24),
            funding_rate: -0.0002,
            open_interest_change_pct: 1.0,
            order_book: book(1.105, 0.3, 500_000.0, 200_000.0),
            liquidation_levels: vec![1.12],
            sentiment: SentimentReading {
                label: Sentiment::Bullish,
                headline: Some("FTT token unlock scheduled for Friday".into()),
            },
        },
        Fixture {
            ticker: ticker("CROSS", 0.314, 35_000_000.0, -1.5),
            candles: trending_candles(0.314, 0.1, 1.0, 24),
            funding_rate: 0.0,
            open_interest_change_pct: -1.0,
            order_book: book(0.314, 0.3, 300_000.0, 300_000.0),
            liquidation_levels: Vec::new(),
            sentiment: SentimentReading::default(),
        },
        Fixture {
            ticker: ticker("RUNE", 6.52, 12_000_000.0, 2.0),
            candles: trending_candles(6.52, 0.2, 1.0, 24),
            funding_rate: -0.0001,
            open_interest_change_pct: 3.0,
            order_book: book(6.52, 0.3, 400_000.0, 100_000.0),
            liquidation_levels: vec![6.6],
            sentiment: SentimentReading { label: Sentiment::Bullish, headline: None },
        },
        Fixture {
            ticker: ticker("PEPE", 0.000012, 500_000_000.0, 14.0),
            candles: trending_candles(0.000012, 0.5, 3.0, 24),
            funding_rate: 0.0005,
            open_interest_change_pct: 12.0,
            order_book: book(0.000012, 0.3, 2_000_000.0, 2_000_000.0),
            liquidation_levels: Vec::new(),
            sentiment: SentimentReading::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_all_default_tickers() {
        let market = PaperMarket::new();
        let tickers = market.tickers().await.unwrap();
        assert_eq!(tickers.len(), 6);
        assert!(tickers.iter().any(|t| t.symbol == "XTZ"));
    }

    #[tokio::test]
    async fn candles_respect_limit() {
        let market = PaperMarket::new();
        let candles = market.candles("XTZ", 10).await.unwrap();
        assert_eq!(candles.len(), 10);
        assert!((candles.last().unwrap().close - 0.82).abs() < 1e-12);
    }

    #[tokio::test]
    async fn unknown_symbol_is_an_error() {
        let market = PaperMarket::new();
        assert!(market.funding_rate("NOPE").await.is_err());
    }

    #[tokio::test]
    async fn offline_market_fails_every_call() {
        let market = PaperMarket::new();
        market.set_offline(true);
        assert!(matches!(market.tickers().await, Err(Error::Http(_))));
        assert!(market.order_book("XTZ").await.is_err());
        market.set_offline(false);
        assert!(market.tickers().await.is_ok());
    }

    #[tokio::test]
    async fn order_book_can_be_replaced() {
        let market = PaperMarket::new();
        let wall = book(0.82, 0.5, 0.0, 5_000_000.0);
        market.set_order_book("XTZ", wall.clone()).await.unwrap();
        assert_eq!(market.order_book("XTZ").await.unwrap(), wall);
        assert!(market.set_order_book("NOPE", wall).await.is_err());
    }

    #[test]
    fn trending_candles_end_at_last_close() {
        let candles = trending_candles(100.0, 1.0, 2.0, 5);
        assert_eq!(candles.len(), 5);
        assert!((candles[4].close - 100.0).abs() < 1e-9);
        assert!(candles[0].close < candles[4].close);
        assert!(candles.iter().all(|c| c.high > c.low));
    }
}
