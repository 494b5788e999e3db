pub mod config;
pub mod levels;
pub mod walls;

pub use config::RiskConfig;
pub use levels::{derive_levels, time_to_targets};
pub use walls::{detect_wall, Wall};
