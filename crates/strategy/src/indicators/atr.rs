use common::Candle;

/// Approximate average true range: the mean high-low range of the last
/// `period` candles.
///
/// Returns `None` when there are no candles or the range is not positive.
#[derive(Debug, Clone)]
pub struct AtrIndicator {
    pub period: usize,
}

impl AtrIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }

    /// Compute from candles ordered oldest first.
    pub fn compute(&self, candles: &[Candle]) -> Option<f64> {
        let start = candles.len().saturating_sub(self.period);
        let window = &candles[start..];
        if window.is_empty() {
            return None;
        }
        let atr = window.iter().map(|c| (c.high - c.low).abs()).sum::<f64>() / window.len() as f64;
        (atr.is_finite() && atr > 0.0).then_some(atr)
    }
}
