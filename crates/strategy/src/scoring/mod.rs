pub mod rules;

use serde::Serialize;
use tracing::debug;

use common::{Direction, MarketContext, MarketTicker};

use crate::config::{ScoringConfig, TrendMode};
use crate::indicators::AtrIndicator;
use crate::{RuleOutcome, ScoringRule};

/// Contribution of one rule to a candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleScore {
    pub rule: &'static str,
    pub contribution: f64,
}

/// A candidate that cleared the confidence threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub symbol: String,
    pub direction: Direction,
    pub price: f64,
    pub atr: f64,
    /// 0–100.
    pub confidence: f64,
    pub breakdown: Vec<RuleScore>,
    pub risk_note: String,
    pub reason: String,
}

/// Outcome of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(ScoredCandidate),
    Vetoed { rule: &'static str, reason: String },
    BelowThreshold { confidence: f64 },
    /// No usable volatility measure, so no levels can be derived.
    NoVolatility,
}

/// Runs the ordered rule list over a candidate and applies the threshold.
pub struct Scorer {
    config: ScoringConfig,
    rules: Vec<Box<dyn ScoringRule>>,
    atr: AtrIndicator,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        let rules = rules::default_rules(&config);
        Self::with_rules(config, rules)
    }

    pub fn with_rules(config: ScoringConfig, rules: Vec<Box<dyn ScoringRule>>) -> Self {
        let atr = AtrIndicator::new(config.lookback.max(1));
        Self { config, rules, atr }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Trade direction implied by the 24h move and the trend mode.
    pub fn direction(&self, ticker: &MarketTicker) -> Direction {
        let with_move = if ticker.price_change_percent >= 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        match self.config.trend_mode {
            TrendMode::Follow => with_move,
            TrendMode::Fade => with_move.opposite(),
        }
    }

    pub fn evaluate(&self, ctx: &MarketContext) -> Verdict {
        let direction = self.direction(&ctx.ticker);
        let mut score = self.config.base_score;
        let mut breakdown = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            match rule.evaluate(ctx, direction) {
                RuleOutcome::Adjust(delta) => {
                    score += delta;
                    breakdown.push(RuleScore { rule: rule.name(), contribution: delta });
                }
                RuleOutcome::Reject(reason) => {
                    debug!(
                        symbol = %ctx.ticker.symbol,
                        rule = rule.name(),
                        %reason,
                        "Candidate vetoed"
                    );
                    return Verdict::Vetoed { rule: rule.name(), reason };
                }
            }
        }

        let confidence = score.clamp(0.0, 100.0);
        if confidence < self.config.min_confidence {
            debug!(symbol = %ctx.ticker.symbol, confidence, "Candidate below threshold");
            return Verdict::BelowThreshold { confidence };
        }

        let Some(atr) = self.atr.compute(&ctx.candles) else {
            return Verdict::NoVolatility;
        };

        Verdict::Accepted(ScoredCandidate {
            symbol: ctx.ticker.symbol.clone(),
            direction,
            price: ctx.ticker.price,
            atr,
            confidence,
            risk_note: self.risk_note(&ctx.ticker, direction),
            reason: reason_from(&breakdown),
            breakdown,
        })
    }

    /// Convenience wrapper returning only accepted candidates.
    pub fn accept(&self, ctx: &MarketContext) -> Option<ScoredCandidate> {
        match self.evaluate(ctx) {
            Verdict::Accepted(candidate) => Some(candidate),
            _ => None,
        }
    }

    fn risk_note(&self, ticker: &MarketTicker, direction: Direction) -> String {
        match self.config.trend_mode {
            TrendMode::Follow => format!(
                "Bias Confirmed: {direction} - following a {:+.2}% 24h move",
                ticker.price_change_percent
            ),
            TrendMode::Fade => format!(
                "Reversal Alert: {} -> {direction} - fading a {:+.2}% 24h move",
                direction.opposite(),
                ticker.price_change_percent
            ),
        }
    }
}

fn reason_from(breakdown: &[RuleScore]) -> String {
    let confirming: Vec<String> = breakdown
        .iter()
        .filter(|r| r.contribution > 0.0)
        .map(|r| format!("{} {:+.0}", r.rule, r.contribution))
        .collect();
    if confirming.is_empty() {
        "No confirming signals".to_string()
    } else {
        format!("Confirmed by {}", confirming.join(", "))
    }
}
