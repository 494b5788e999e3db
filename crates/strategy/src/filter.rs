use common::MarketTicker;

use crate::config::FilterConfig;

/// Volume, 24h-move and listing-age gate for a single ticker.
pub fn passes(cfg: &FilterConfig, ticker: &MarketTicker) -> bool {
    if !ticker.volume_usd.is_finite() || !ticker.price_change_percent.is_finite() {
        return false;
    }
    if ticker.volume_usd <= cfg.min_volume_usd {
        return false;
    }
    if ticker.price_change_percent.abs() >= cfg.max_change_percent {
        return false;
    }
    // Unknown listing age passes
    match ticker.listed_days {
        Some(days) => days > cfg.min_listed_days,
        None => true,
    }
}

/// Filter `tickers` and keep the `max` most liquid survivors.
///
/// The cap bounds how many candidates trigger follow-up upstream calls in
/// one tick.
pub fn select_candidates(
    cfg: &FilterConfig,
    tickers: &[MarketTicker],
    max: usize,
) -> Vec<MarketTicker> {
    let mut accepted: Vec<MarketTicker> = tickers
        .iter()
        .filter(|t| t.price > 0.0 && passes(cfg, t))
        .cloned()
        .collect();
    accepted.sort_by(|a, b| b.volume_usd.total_cmp(&a.volume_usd));
    accepted.truncate(max);
    accepted
}
