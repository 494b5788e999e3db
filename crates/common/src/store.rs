use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Result, SignalAlert, SignalRecord, SignalStatus, StatusUpdate, TradeSetup};

/// Storage for signal records.
///
/// Implementations must make `insert_if_no_open` atomic: the check for an
/// open (pending/active) signal on the same symbol and the insert happen
/// under one lock or one statement.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Insert `setup` as a new pending signal unless the symbol already has
    /// an open one. Returns the stored record, or `None` when skipped.
    async fn insert_if_no_open(&self, setup: TradeSetup) -> Result<Option<SignalRecord>>;

    /// The open (pending/active) signal for `symbol`, if any.
    async fn find_open(&self, symbol: &str) -> Result<Option<SignalRecord>>;

    async fn get(&self, id: i64) -> Result<Option<SignalRecord>>;

    /// All signals in insertion order.
    async fn list(&self) -> Result<Vec<SignalRecord>>;

    async fn with_status(&self, status: SignalStatus) -> Result<Vec<SignalRecord>>;

    /// Overwrite the fields present in `update`. `None` if `id` is unknown.
    async fn update_status(&self, id: i64, update: &StatusUpdate) -> Result<Option<SignalRecord>>;

    /// Move a still-active signal to `alert` and attach the alert details.
    /// `None` if `id` is unknown or the signal is no longer active.
    async fn raise_alert(&self, id: i64, alert: &SignalAlert) -> Result<Option<SignalRecord>>;

    /// Creation time of the most recent signal.
    async fn last_signal_time(&self) -> Result<Option<DateTime<Utc>>>;
}
