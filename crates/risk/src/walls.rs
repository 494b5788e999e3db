use common::{BookLevel, Direction, OrderBook, SignalAlert, AlertKind};

use crate::RiskConfig;

/// A single resting order large enough to block a trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub price: f64,
    pub notional_usd: f64,
    /// The side the wall rests on: asks block a LONG, bids block a SHORT.
    pub blocks: Direction,
}

impl Wall {
    pub fn to_alert(&self) -> SignalAlert {
        let side = match self.blocks {
            Direction::Long => "sell",
            Direction::Short => "buy",
        };
        SignalAlert {
            kind: AlertKind::WhaleWall,
            message: format!(
                "Large whale {side} wall detected near entry: ${:.0} resting at {}",
                self.notional_usd, self.price
            ),
        }
    }
}

/// Largest adverse-side order within `wall_distance_pct` of `entry` whose
/// notional exceeds `wall_notional_usd`.
pub fn detect_wall(
    cfg: &RiskConfig,
    direction: Direction,
    entry: f64,
    book: &OrderBook,
) -> Option<Wall> {
    if entry <= 0.0 {
        return None;
    }
    let adverse: &[BookLevel] = match direction {
        Direction::Long => &book.asks,
        Direction::Short => &book.bids,
    };
    let band = entry * cfg.wall_distance_pct / 100.0;
    adverse
        .iter()
        .filter(|l| (l.price - entry).abs() <= band)
        .filter(|l| l.notional() > cfg.wall_notional_usd)
        .max_by(|a, b| a.notional().total_cmp(&b.notional()))
        .map(|l| Wall {
            price: l.price,
            notional_usd: l.notional(),
            blocks: direction,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook {
            bids: vec![BookLevel { price: 99.0, quantity: 50_000.0 }],
            asks: vec![
                BookLevel { price: 100.5, quantity: 5_000.0 },
                BookLevel { price: 101.0, quantity: 20_000.0 },
                BookLevel { price: 120.0, quantity: 90_000.0 },
            ],
        }
    }

    #[test]
    fn finds_sell_wall_for_long() {
        let wall = detect_wall(&RiskConfig::default(), Direction::Long, 100.0, &book()).unwrap();
        assert_eq!(wall.price, 101.0);
        assert_eq!(wall.notional_usd, 2_020_000.0);
    }

    #[test]
    fn finds_buy_wall_for_short() {
        let wall = detect_wall(&RiskConfig::default(), Direction::Short, 100.0, &book()).unwrap();
        assert_eq!(wall.price, 99.0);
        assert_eq!(wall.blocks, Direction::Short);
    }

    #[test]
    fn ignores_walls_outside_band() {
        let cfg = RiskConfig { wall_distance_pct: 0.6, ..RiskConfig::default() };
        assert!(detect_wall(&cfg, Direction::Long, 100.0, &book()).is_none());
    }

    #[test]
    fn ignores_small_orders() {
        let cfg = RiskConfig { wall_notional_usd: 5_000_000.0, ..RiskConfig::default() };
        assert!(detect_wall(&cfg, Direction::Long, 100.0, &book()).is_none());
    }

    #[test]
    fn alert_names_the_side() {
        let wall = detect_wall(&RiskConfig::default(), Direction::Long, 100.0, &book()).unwrap();
        let alert = wall.to_alert();
        assert_eq!(alert.kind, AlertKind::WhaleWall);
        assert!(alert.message.contains("sell wall"));
    }
}
