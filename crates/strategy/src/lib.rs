pub mod config;
pub mod filter;
pub mod indicators;
pub mod scoring;

pub use config::{FilterConfig, ScoringConfig, StrategyFileConfig, TrendMode};
pub use filter::select_candidates;
pub use scoring::{RuleScore, ScoredCandidate, Scorer, Verdict};

use common::{Direction, MarketContext};

/// Result of a single scoring rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// Signed contribution to the running score.
    Adjust(f64),
    /// Discard the candidate outright.
    Reject(String),
}

/// One named, pure scoring rule. Rules are evaluated in order and must not
/// depend on each other.
pub trait ScoringRule: Send + Sync {
    /// Stable identifier used in breakdowns and logs.
    fn name(&self) -> &'static str;

    /// Evaluate the rule for a candidate taken in `direction`.
    fn evaluate(&self, ctx: &MarketContext, direction: Direction) -> RuleOutcome;
}
