pub mod config;
pub mod error;
pub mod market;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use market::MarketDataClient;
pub use store::SignalStore;
pub use types::*;
