use common::Candle;

/// Close-to-close percentage move across the last `period` candles.
#[derive(Debug, Clone)]
pub struct TrendIndicator {
    pub period: usize,
}

impl TrendIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "trend period must be >= 2");
        Self { period }
    }

    /// Returns `None` with fewer than two candles or a non-positive first close.
    pub fn compute(&self, candles: &[Candle]) -> Option<f64> {
        let start = candles.len().saturating_sub(self.period);
        let window = &candles[start..];
        let (first, last) = (window.first()?, window.last()?);
        if window.len() < 2 || first.close <= 0.0 {
            return None;
        }
        Some((last.close - first.close) / first.close * 100.0)
    }
}
