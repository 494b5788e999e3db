use tracing::{debug, info};

use common::{MarketContext, TradeSetup};
use risk::{derive_levels, levels::reward_to_risk, time_to_targets, RiskConfig};
use strategy::{FilterConfig, Scorer, StrategyFileConfig, Verdict};

/// Filter, scorer and level derivation bundled for one poll tick.
pub struct Pipeline {
    pub filter: FilterConfig,
    pub scorer: Scorer,
    pub risk: RiskConfig,
}

impl Pipeline {
    pub fn new(strategy: StrategyFileConfig, risk: RiskConfig) -> Self {
        Self {
            filter: strategy.filter,
            scorer: Scorer::new(strategy.scoring),
            risk,
        }
    }

    /// Candles requested per candidate.
    pub fn lookback(&self) -> usize {
        self.scorer.config().lookback
    }

    /// Score `ctx` and, if it qualifies, attach price levels.
    pub fn setup_for(&self, ctx: &MarketContext) -> Option<TradeSetup> {
        let symbol = &ctx.ticker.symbol;
        match self.scorer.evaluate(ctx) {
            Verdict::Accepted(candidate) => {
                let levels =
                    derive_levels(&self.risk, candidate.direction, candidate.price, candidate.atr)?;
                debug!(
                    %symbol,
                    confidence = candidate.confidence,
                    reward_to_risk = reward_to_risk(&levels, candidate.price),
                    "Candidate accepted"
                );
                Some(TradeSetup {
                    symbol: candidate.symbol,
                    direction: candidate.direction,
                    levels,
                    confidence: candidate.confidence,
                    risk_note: candidate.risk_note,
                    reason: candidate.reason,
                    estimated_time_to_tps: time_to_targets(&self.risk),
                })
            }
            Verdict::Vetoed { rule, reason } => {
                info!(%symbol, rule, %reason, "Candidate discarded");
                None
            }
            Verdict::BelowThreshold { confidence } => {
                debug!(%symbol, confidence, "Candidate below confidence threshold");
                None
            }
            Verdict::NoVolatility => {
                debug!(%symbol, "Candidate has no usable volatility");
                None
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(StrategyFileConfig::default(), RiskConfig::default())
    }
}
