use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::{
    Result, SignalAlert, SignalRecord, SignalStatus, SignalStore, StatusUpdate, TradeSetup,
};

/// Process-local signal store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    signals: Vec<SignalRecord>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn insert_if_no_open(&self, setup: TradeSetup) -> Result<Option<SignalRecord>> {
        let mut inner = self.inner.write().await;
        if inner
            .signals
            .iter()
            .any(|s| s.symbol == setup.symbol && s.status.is_open())
        {
            return Ok(None);
        }
        inner.last_id += 1;
        let record = SignalRecord::pending(inner.last_id, setup, Utc::now());
        inner.signals.push(record.clone());
        Ok(Some(record))
    }

    async fn find_open(&self, symbol: &str) -> Result<Option<SignalRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .signals
            .iter()
            .find(|s| s.symbol == symbol && s.status.is_open())
            .cloned())
    }

    async fn get(&self, id: i64) -> Result<Option<SignalRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.signals.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<SignalRecord>> {
        Ok(self.inner.read().await.signals.clone())
    }

    async fn with_status(&self, status: SignalStatus) -> Result<Vec<SignalRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .signals
            .iter()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: i64, update: &StatusUpdate) -> Result<Option<SignalRecord>> {
        let mut inner = self.inner.write().await;
        Ok(inner.signals.iter_mut().find(|s| s.id == id).map(|s| {
            s.apply(update, Utc::now());
            s.clone()
        }))
    }

    async fn raise_alert(&self, id: i64, alert: &SignalAlert) -> Result<Option<SignalRecord>> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .signals
            .iter_mut()
            .find(|s| s.id == id && s.status == SignalStatus::Active)
            .map(|s| {
                s.raise(alert, Utc::now());
                s.clone()
            }))
    }

    async fn last_signal_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.inner.read().await.signals.last().map(|s| s.created_at))
    }
}
