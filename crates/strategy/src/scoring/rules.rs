use common::{Direction, MarketContext, Sentiment};

use crate::config::ScoringConfig;
use crate::indicators::TrendIndicator;
use crate::{RuleOutcome, ScoringRule};

/// The default rule list, in evaluation order.
pub fn default_rules(cfg: &ScoringConfig) -> Vec<Box<dyn ScoringRule>> {
    vec![
        Box::new(NewsVeto { keywords: cfg.veto_keywords.clone() }),
        Box::new(TrendRule {
            indicator: TrendIndicator::new(cfg.lookback.max(2)),
            flat_pct: cfg.flat_trend_pct,
            bonus: cfg.trend_bonus,
        }),
        Box::new(FundingRule { bonus: cfg.funding_bonus }),
        Box::new(OpenInterestRule { bonus: cfg.oi_bonus }),
        Box::new(OrderBookRule {
            depth_pct: cfg.book_depth_pct,
            ratio: cfg.imbalance_ratio,
            bonus: cfg.book_bonus,
        }),
        Box::new(LiquidationMagnet {
            proximity_pct: cfg.liquidation_proximity_pct,
            bonus: cfg.liquidation_bonus,
        }),
        Box::new(SentimentRule { bonus: cfg.sentiment_bonus }),
    ]
}

/// Discards candidates whose headline mentions a veto keyword.
pub struct NewsVeto {
    pub keywords: Vec<String>,
}

impl ScoringRule for NewsVeto {
    fn name(&self) -> &'static str {
        "news_veto"
    }

    fn evaluate(&self, ctx: &MarketContext, _direction: Direction) -> RuleOutcome {
        let Some(headline) = ctx.sentiment.headline.as_deref() else {
            return RuleOutcome::Adjust(0.0);
        };
        let lower = headline.to_lowercase();
        match self.keywords.iter().find(|k| lower.contains(&k.to_lowercase())) {
            Some(keyword) => RuleOutcome::Reject(format!("news mentions '{keyword}': {headline}")),
            None => RuleOutcome::Adjust(0.0),
        }
    }
}

/// Lookback trend agreeing with the trade direction.
pub struct TrendRule {
    pub indicator: TrendIndicator,
    pub flat_pct: f64,
    pub bonus: f64,
}

impl ScoringRule for TrendRule {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn evaluate(&self, ctx: &MarketContext, direction: Direction) -> RuleOutcome {
        let Some(trend) = self.indicator.compute(&ctx.candles) else {
            return RuleOutcome::Adjust(0.0);
        };
        if trend.abs() < self.flat_pct {
            return RuleOutcome::Adjust(0.0);
        }
        if trend.signum() == direction.sign() {
            RuleOutcome::Adjust(self.bonus)
        } else {
            RuleOutcome::Adjust(-self.bonus)
        }
    }
}

/// Funding paid by the crowded side: negative funding confirms a long,
/// positive funding confirms a short.
pub struct FundingRule {
    pub bonus: f64,
}

impl ScoringRule for FundingRule {
    fn name(&self) -> &'static str {
        "funding"
    }

    fn evaluate(&self, ctx: &MarketContext, direction: Direction) -> RuleOutcome {
        if ctx.funding_rate * direction.sign() < 0.0 {
            RuleOutcome::Adjust(self.bonus)
        } else {
            RuleOutcome::Adjust(0.0)
        }
    }
}

/// Rising open interest means fresh positioning behind the move.
pub struct OpenInterestRule {
    pub bonus: f64,
}

impl ScoringRule for OpenInterestRule {
    fn name(&self) -> &'static str {
        "open_interest"
    }

    fn evaluate(&self, ctx: &MarketContext, _direction: Direction) -> RuleOutcome {
        if ctx.open_interest_change_pct > 0.0 {
            RuleOutcome::Adjust(self.bonus)
        } else {
            RuleOutcome::Adjust(0.0)
        }
    }
}

/// Resting bid/ask notional near price.
pub struct OrderBookRule {
    pub depth_pct: f64,
    pub ratio: f64,
    pub bonus: f64,
}

impl OrderBookRule {
    /// Side favoured by the book, if the imbalance is decisive.
    pub fn favoured(&self, ctx: &MarketContext) -> Option<Direction> {
        let (bids, asks) = ctx.order_book.notional_near(ctx.ticker.price, self.depth_pct);
        if bids <= 0.0 && asks <= 0.0 {
            return None;
        }
        if asks <= 0.0 || bids / asks >= self.ratio {
            Some(Direction::Long)
        } else if bids <= 0.0 || bids / asks <= 1.0 / self.ratio {
            Some(Direction::Short)
        } else {
            None
        }
    }
}

impl ScoringRule for OrderBookRule {
    fn name(&self) -> &'static str {
        "order_book"
    }

    fn evaluate(&self, ctx: &MarketContext, direction: Direction) -> RuleOutcome {
        match self.favoured(ctx) {
            Some(side) if side == direction => RuleOutcome::Adjust(self.bonus),
            Some(_) => RuleOutcome::Adjust(-self.bonus),
            None => RuleOutcome::Adjust(0.0),
        }
    }
}

/// A liquidation cluster just beyond price in the trade's favour tends to
/// pull price towards it.
pub struct LiquidationMagnet {
    pub proximity_pct: f64,
    pub bonus: f64,
}

impl ScoringRule for LiquidationMagnet {
    fn name(&self) -> &'static str {
        "liquidation_magnet"
    }

    fn evaluate(&self, ctx: &MarketContext, direction: Direction) -> RuleOutcome {
        let price = ctx.ticker.price;
        if price <= 0.0 {
            return RuleOutcome::Adjust(0.0);
        }
        let near = ctx.liquidation_levels.iter().any(|&level| {
            let distance_pct = (level - price) / price * 100.0 * direction.sign();
            distance_pct > 0.0 && distance_pct <= self.proximity_pct
        });
        if near {
            RuleOutcome::Adjust(self.bonus)
        } else {
            RuleOutcome::Adjust(0.0)
        }
    }
}

pub struct SentimentRule {
    pub bonus: f64,
}

impl ScoringRule for SentimentRule {
    fn name(&self) -> &'static str {
        "sentiment"
    }

    fn evaluate(&self, ctx: &MarketContext, direction: Direction) -> RuleOutcome {
        match (ctx.sentiment.label, direction) {
            (Sentiment::Bullish, Direction::Long) | (Sentiment::Bearish, Direction::Short) => {
                RuleOutcome::Adjust(self.bonus)
            }
            _ => RuleOutcome::Adjust(0.0),
        }
    }
}
