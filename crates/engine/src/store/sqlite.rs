use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use common::{
    AlertKind, Direction, EntryZone, Error, Result, SignalAlert, SignalRecord, SignalStatus,
    SignalStore, StatusUpdate, TakeProfitZone, TradeSetup,
};

/// SQLite-backed signal store. Signals survive restarts.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url`, creating the database file if needed, and run
    /// migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // An in-memory database lives and dies with its single connection
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Other(format!("database migration failed: {e}")))?;
        info!(%url, "Signal database ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl SignalStore for SqliteStore {
    async fn insert_if_no_open(&self, setup: TradeSetup) -> Result<Option<SignalRecord>> {
        let now = Utc::now();
        // Single statement, so the open-signal check and the insert are atomic
        let row = sqlx::query_as::<_, SignalRow>(
            r#"
            INSERT INTO signals (symbol, direction, entry_low, entry_high, stop_loss, tp1, tp2,
                                 confidence, status, risk_note, reason, estimated_time_to_tps,
                                 created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9, ?10, ?11, ?12, ?12
            WHERE NOT EXISTS (
                SELECT 1 FROM signals WHERE symbol = ?1 AND status IN ('pending', 'active')
            )
            RETURNING *
            "#,
        )
        .bind(&setup.symbol)
        .bind(setup.direction)
        .bind(setup.levels.entry_zone.low)
        .bind(setup.levels.entry_zone.high)
        .bind(setup.levels.stop_loss)
        .bind(setup.levels.take_profit_zone.tp1)
        .bind(setup.levels.take_profit_zone.tp2)
        .bind(setup.confidence)
        .bind(&setup.risk_note)
        .bind(&setup.reason)
        .bind(&setup.estimated_time_to_tps)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SignalRecord::from))
    }

    async fn find_open(&self, symbol: &str) -> Result<Option<SignalRecord>> {
        let row = sqlx::query_as::<_, SignalRow>(
            "SELECT * FROM signals WHERE symbol = ?1 AND status IN ('pending', 'active') LIMIT 1",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SignalRecord::from))
    }

    async fn get(&self, id: i64) -> Result<Option<SignalRecord>> {
        let row = sqlx::query_as::<_, SignalRow>("SELECT * FROM signals WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SignalRecord::from))
    }

    async fn list(&self) -> Result<Vec<SignalRecord>> {
        let rows = sqlx::query_as::<_, SignalRow>("SELECT * FROM signals ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(SignalRecord::from).collect())
    }

    async fn with_status(&self, status: SignalStatus) -> Result<Vec<SignalRecord>> {
        let rows = sqlx::query_as::<_, SignalRow>(
            "SELECT * FROM signals WHERE status = ?1 ORDER BY id ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SignalRecord::from).collect())
    }

    async fn update_status(&self, id: i64, update: &StatusUpdate) -> Result<Option<SignalRecord>> {
        let row = sqlx::query_as::<_, SignalRow>(
            r#"
            UPDATE signals
            SET status      = COALESCE(?2, status),
                pnl         = CASE WHEN ?3 THEN ?4 ELSE pnl END,
                entry_price = COALESCE(?5, entry_price),
                updated_at  = ?6
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.status)
        // An explicit null clears pnl, an absent key keeps it
        .bind(update.pnl.is_some())
        .bind(update.pnl.flatten())
        .bind(update.entry_price)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SignalRecord::from))
    }

    async fn raise_alert(&self, id: i64, alert: &SignalAlert) -> Result<Option<SignalRecord>> {
        let row = sqlx::query_as::<_, SignalRow>(
            r#"
            UPDATE signals
            SET status = 'alert', alert_type = ?2, alert_message = ?3, updated_at = ?4
            WHERE id = ?1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(alert.kind)
        .bind(&alert.message)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SignalRecord::from))
    }

    async fn last_signal_time(&self) -> Result<Option<DateTime<Utc>>> {
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT created_at FROM signals ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(created_at)
    }
}

// ─── Row mapping ──────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct SignalRow {
    id: i64,
    symbol: String,
    direction: Direction,
    entry_low: f64,
    entry_high: f64,
    stop_loss: f64,
    tp1: f64,
    tp2: f64,
    confidence: f64,
    status: SignalStatus,
    pnl: Option<f64>,
    entry_price: Option<f64>,
    alert_message: Option<String>,
    alert_type: Option<AlertKind>,
    risk_note: String,
    reason: String,
    estimated_time_to_tps: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SignalRow> for SignalRecord {
    fn from(row: SignalRow) -> Self {
        SignalRecord {
            id: row.id,
            symbol: row.symbol,
            direction: row.direction,
            entry_zone: EntryZone { low: row.entry_low, high: row.entry_high },
            stop_loss: row.stop_loss,
            take_profit_zone: TakeProfitZone { tp1: row.tp1, tp2: row.tp2 },
            confidence: row.confidence,
            status: row.status,
            pnl: row.pnl,
            entry_price: row.entry_price,
            alert_message: row.alert_message,
            alert_type: row.alert_type,
            risk_note: row.risk_note,
            reason: row.reason,
            estimated_time_to_tps: row.estimated_time_to_tps,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
