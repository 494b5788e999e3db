pub mod coinglass;
pub mod pipeline;
pub mod poller;
pub mod store;

pub use coinglass::CoinGlassClient;
pub use pipeline::Pipeline;
pub use poller::{Poller, PollerHandle, PollerSettings};
pub use store::{MemoryStore, SqliteStore};
