pub mod atr;
pub mod trend;

pub use atr::AtrIndicator;
pub use trend::TrendIndicator;
