use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use common::{
    BookLevel, Candle, Error, MarketDataClient, MarketTicker, OrderBook, Result, Sentiment,
    SentimentReading,
};

const API_KEY_HEADER: &str = "CG-API-KEY";
/// Exchange whose per-pair data is used for candles and the order book.
const REFERENCE_EXCHANGE: &str = "Binance";
const QUOTE: &str = "USDT";

mod paths {
    pub const COINS_MARKETS: &str = "/api/futures/coins-markets";
    pub const PRICE_HISTORY: &str = "/api/futures/price/history";
    pub const FUNDING_HISTORY: &str = "/api/futures/fundingRate/oi-weight-ohlc-history";
    pub const OPEN_INTEREST_HISTORY: &str = "/api/futures/openInterest/ohlc-aggregated-history";
    pub const LARGE_ORDERS: &str = "/api/futures/orderbook/large-limit-order";
    pub const LIQUIDATION_MAP: &str = "/api/futures/liquidation/aggregated-map";
    pub const FEAR_GREED: &str = "/api/index/fear-greed-history";
}

/// Fear & greed readings at or above this are bullish, at or below the
/// mirror value bearish.
const GREED_THRESHOLD: f64 = 60.0;

/// REST client for the CoinGlass open API.
pub struct CoinGlassClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl CoinGlassClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(%path, ?params, "CoinGlass request");

        let resp = self
            .http
            .get(&url)
            .query(params)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Upstream {
                code: status.as_u16().to_string(),
                msg: body,
            });
        }
        parse_envelope(&body)
    }
}

#[async_trait]
impl MarketDataClient for CoinGlassClient {
    async fn tickers(&self) -> Result<Vec<MarketTicker>> {
        let rows: Vec<CoinMarketRow> = self.get(paths::COINS_MARKETS, &[]).await?;
        Ok(rows.into_iter().map(MarketTicker::from).collect())
    }

    async fn candles(&self, symbol: &str, limit: usize) -> Result<Vec<Candle>> {
        let rows: Vec<OhlcRow> = self
            .get(
                paths::PRICE_HISTORY,
                &[
                    ("exchange", REFERENCE_EXCHANGE.to_string()),
                    ("symbol", format!("{symbol}{QUOTE}")),
                    ("interval", "1h".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(sorted_candles(rows))
    }

    async fn funding_rate(&self, symbol: &str) -> Result<f64> {
        let rows: Vec<OhlcRow> = self
            .get(
                paths::FUNDING_HISTORY,
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", "1h".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        sorted_candles(rows)
            .last()
            .map(|c| c.close)
            .ok_or_else(|| Error::Other(format!("no funding data for {symbol}")))
    }

    async fn open_interest_change(&self, symbol: &str) -> Result<f64> {
        let rows: Vec<OhlcRow> = self
            .get(
                paths::OPEN_INTEREST_HISTORY,
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", "1h".to_string()),
                    ("limit", "24".to_string()),
                ],
            )
            .await?;
        percent_change(&sorted_candles(rows))
            .ok_or_else(|| Error::Other(format!("no open interest data for {symbol}")))
    }

    async fn order_book(&self, symbol: &str) -> Result<OrderBook> {
        let rows: Vec<LargeOrderRow> = self
            .get(
                paths::LARGE_ORDERS,
                &[
                    ("exchange", REFERENCE_EXCHANGE.to_string()),
                    ("symbol", format!("{symbol}{QUOTE}")),
                ],
            )
            .await?;
        Ok(book_from_rows(rows))
    }

    async fn liquidation_levels(&self, symbol: &str) -> Result<Vec<f64>> {
        let map: LiquidationMap = self
            .get(
                paths::LIQUIDATION_MAP,
                &[("symbol", symbol.to_string()), ("range", "1d".to_string())],
            )
            .await?;
        Ok(map.levels())
    }

    async fn sentiment(&self, _symbol: &str) -> Result<SentimentReading> {
        let rows: Vec<FearGreedRow> = self.get(paths::FEAR_GREED, &[]).await?;
        let label = rows
            .last()
            .map(|r| sentiment_from_index(r.value))
            .unwrap_or_default();
        // CoinGlass has no per-coin headline feed
        Ok(SentimentReading { label, headline: None })
    }
}

// ─── Envelope and parsing ────────────────────────────────────────────────────

/// CoinGlass wraps every payload in `{ code, msg, data }`; `code` is `"0"`
/// on success.
#[derive(Deserialize)]
struct Envelope<T> {
    code: serde_json::Value,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

/// Unwrap a response body, treating a non-zero code or missing data as an
/// upstream error.
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    let ok = match &envelope.code {
        serde_json::Value::String(s) => s == "0",
        serde_json::Value::Number(n) => n.as_i64() == Some(0),
        _ => false,
    };
    if !ok {
        let code = match envelope.code {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(Error::Upstream {
            code,
            msg: envelope.msg.unwrap_or_default(),
        });
    }
    envelope.data.ok_or_else(|| Error::Upstream {
        code: "0".into(),
        msg: "success envelope without data".into(),
    })
}

fn sorted_candles(mut rows: Vec<OhlcRow>) -> Vec<Candle> {
    rows.sort_by_key(|r| r.time);
    rows.into_iter()
        .map(|r| Candle { open: r.open, high: r.high, low: r.low, close: r.close })
        .collect()
}

fn percent_change(candles: &[Candle]) -> Option<f64> {
    let first = candles.first()?.open;
    let last = candles.last()?.close;
    (first > 0.0).then(|| (last - first) / first * 100.0)
}

fn book_from_rows(rows: Vec<LargeOrderRow>) -> OrderBook {
    let mut book = OrderBook::default();
    for row in rows {
        let level = BookLevel { price: row.price, quantity: row.quantity };
        match row.side {
            OrderSideRow::Bid => book.bids.push(level),
            OrderSideRow::Ask => book.asks.push(level),
        }
    }
    book.bids.sort_by(|a, b| b.price.total_cmp(&a.price));
    book.asks.sort_by(|a, b| a.price.total_cmp(&b.price));
    book
}

fn sentiment_from_index(value: f64) -> Sentiment {
    if value >= GREED_THRESHOLD {
        Sentiment::Bullish
    } else if value <= 100.0 - GREED_THRESHOLD {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}

/// CoinGlass sends numbers both as JSON numbers and as strings.
fn de_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }
    match NumOrStr::deserialize(d)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinMarketRow {
    symbol: String,
    #[serde(deserialize_with = "de_f64")]
    price: f64,
    #[serde(deserialize_with = "de_f64")]
    vol_usd: f64,
    #[serde(alias = "priceChangePercent24h", deserialize_with = "de_f64")]
    price_change_percent: f64,
}

impl From<CoinMarketRow> for MarketTicker {
    fn from(row: CoinMarketRow) -> Self {
        MarketTicker {
            symbol: row.symbol,
            price: row.price,
            volume_usd: row.vol_usd,
            price_change_percent: row.price_change_percent,
            listed_days: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OhlcRow {
    #[serde(rename = "t")]
    time: i64,
    #[serde(rename = "o", deserialize_with = "de_f64")]
    open: f64,
    #[serde(rename = "h", deserialize_with = "de_f64")]
    high: f64,
    #[serde(rename = "l", deserialize_with = "de_f64")]
    low: f64,
    #[serde(rename = "c", deserialize_with = "de_f64")]
    close: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OrderSideRow {
    #[serde(alias = "buy")]
    Bid,
    #[serde(alias = "sell")]
    Ask,
}

#[derive(Debug, Deserialize)]
struct LargeOrderRow {
    #[serde(deserialize_with = "de_f64")]
    price: f64,
    #[serde(alias = "amount", deserialize_with = "de_f64")]
    quantity: f64,
    side: OrderSideRow,
}

#[derive(Debug, Deserialize)]
struct LiquidationCluster {
    #[serde(deserialize_with = "de_f64")]
    price: f64,
}

#[derive(Debug, Deserialize)]
struct LiquidationMap {
    #[serde(default)]
    clusters: Vec<LiquidationCluster>,
}

impl LiquidationMap {
    fn levels(self) -> Vec<f64> {
        self.clusters.into_iter().map(|c| c.price).collect()
    }
}

#[derive(Debug, Deserialize)]
struct FearGreedRow {
    #[serde(deserialize_with = "de_f64")]
    value: f64,
}
