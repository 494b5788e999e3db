use common::{Direction, EntryZone, PriceLevels, TakeProfitZone};

use crate::RiskConfig;

/// Entry zone, stop and targets at fixed ATR multiples from `price`.
///
/// LONG: the entry zone sits just below price, the stop further below and
/// both targets above. SHORT mirrors it. Returns `None` for a non-positive
/// price or ATR.
pub fn derive_levels(
    cfg: &RiskConfig,
    direction: Direction,
    price: f64,
    atr: f64,
) -> Option<PriceLevels> {
    if !(price > 0.0 && atr > 0.0 && price.is_finite() && atr.is_finite()) {
        return None;
    }
    let s = direction.sign();
    let far_edge = price - s * cfg.entry_atr * atr;
    let entry_zone = EntryZone {
        low: far_edge.min(price),
        high: far_edge.max(price),
    };
    Some(PriceLevels {
        entry_zone,
        // A stop at or below zero is meaningless for a long
        stop_loss: (price - s * cfg.stop_atr * atr).max(0.0),
        take_profit_zone: TakeProfitZone {
            tp1: (price + s * cfg.tp1_atr * atr).max(0.0),
            tp2: (price + s * cfg.tp2_atr * atr).max(0.0),
        },
    })
}

/// Reward-to-risk ratio of the first target, measured from price.
pub fn reward_to_risk(levels: &PriceLevels, price: f64) -> f64 {
    let risk = (price - levels.stop_loss).abs();
    if risk == 0.0 {
        return 0.0;
    }
    (levels.take_profit_zone.tp1 - price).abs() / risk
}

/// Rough time to each target, formatted for the signal card.
///
/// Price is treated as a random walk moving about one ATR per candle, so
/// covering `k` ATRs takes roughly `k²` candles.
pub fn time_to_targets(cfg: &RiskConfig) -> String {
    let hours = |atr_multiple: f64| {
        (atr_multiple * atr_multiple * cfg.candle_hours).ceil().max(1.0)
    };
    format!("TP1: ~{}h, TP2: ~{}h", hours(cfg.tp1_atr), hours(cfg.tp2_atr))
}
