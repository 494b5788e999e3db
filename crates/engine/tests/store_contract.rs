//! Every `SignalStore` implementation must behave identically.

use std::sync::Arc;

use common::{
    AlertKind, Direction, EntryZone, PriceLevels, SignalAlert, SignalStatus, SignalStore,
    StatusUpdate, TakeProfitZone, TradeSetup,
};
use engine::{MemoryStore, SqliteStore};

fn setup(symbol: &str) -> TradeSetup {
    TradeSetup {
        symbol: symbol.into(),
        direction: Direction::Long,
        levels: PriceLevels {
            entry_zone: EntryZone { low: 0.81, high: 0.82 },
            stop_loss: 0.79,
            take_profit_zone: TakeProfitZone { tp1: 0.85, tp2: 0.88 },
        },
        confidence: 90.0,
        risk_note: "Bias confirmed".into(),
        reason: "trend, funding".into(),
        estimated_time_to_tps: "TP1: ~3h, TP2: ~9h".into(),
    }
}

fn wall_alert() -> SignalAlert {
    SignalAlert {
        kind: AlertKind::WhaleWall,
        message: "Large whale sell wall detected near entry".into(),
    }
}

async fn stores() -> Vec<(&'static str, Arc<dyn SignalStore>)> {
    let sqlite = SqliteStore::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite", Arc::new(sqlite)),
    ]
}

#[tokio::test]
async fn insert_assigns_increasing_ids_and_pending_status() {
    for (name, store) in stores().await {
        let a = store.insert_if_no_open(setup("XTZ")).await.unwrap().unwrap();
        let b = store.insert_if_no_open(setup("HAEDAL")).await.unwrap().unwrap();
        assert_eq!(a.id, 1, "{name}");
        assert_eq!(b.id, 2, "{name}");
        assert_eq!(a.status, SignalStatus::Pending, "{name}");
        assert_eq!(a.entry_zone, EntryZone { low: 0.81, high: 0.82 }, "{name}");
        assert_eq!(a.take_profit_zone.tp2, 0.88, "{name}");
        assert!(a.pnl.is_none(), "{name}");

        let listed = store.list().await.unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2], "{name}");
    }
}

#[tokio::test]
async fn open_signal_blocks_duplicate_symbol() {
    for (name, store) in stores().await {
        store.insert_if_no_open(setup("XTZ")).await.unwrap().unwrap();
        assert!(store.insert_if_no_open(setup("XTZ")).await.unwrap().is_none(), "{name}");

        // Active still blocks
        store
            .update_status(1, &StatusUpdate::status(SignalStatus::Active))
            .await
            .unwrap();
        assert!(store.insert_if_no_open(setup("XTZ")).await.unwrap().is_none(), "{name}");
        assert_eq!(store.find_open("XTZ").await.unwrap().map(|s| s.id), Some(1), "{name}");

        // Closed frees the symbol
        store
            .update_status(1, &StatusUpdate::status(SignalStatus::ClosedProfit))
            .await
            .unwrap();
        let again = store.insert_if_no_open(setup("XTZ")).await.unwrap();
        assert_eq!(again.map(|s| s.id), Some(2), "{name}");
    }
}

#[tokio::test]
async fn concurrent_inserts_store_one_signal() {
    for (name, store) in stores().await {
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.insert_if_no_open(setup("XTZ")).await.unwrap()
            }));
        }
        let mut inserted = 0;
        for t in tasks {
            if t.await.unwrap().is_some() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1, "{name}");
        assert_eq!(store.list().await.unwrap().len(), 1, "{name}");
    }
}

#[tokio::test]
async fn update_unknown_id_changes_nothing() {
    for (name, store) in stores().await {
        store.insert_if_no_open(setup("XTZ")).await.unwrap();
        let before = store.list().await.unwrap();
        let update = StatusUpdate {
            status: Some(SignalStatus::ClosedLoss),
            pnl: Some(Some(-3.0)),
            entry_price: None,
        };
        let result = store.update_status(99, &update).await.unwrap();
        assert!(result.is_none(), "{name}");
        assert_eq!(store.list().await.unwrap(), before, "{name}");
    }
}

#[tokio::test]
async fn update_overwrites_only_provided_fields() {
    for (name, store) in stores().await {
        store.insert_if_no_open(setup("XTZ")).await.unwrap();
        let update = StatusUpdate {
            status: Some(SignalStatus::Active),
            pnl: None,
            entry_price: Some(0.815),
        };
        store.update_status(1, &update).await.unwrap();

        let updated = store
            .update_status(1, &StatusUpdate { pnl: Some(Some(4.2)), ..Default::default() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, SignalStatus::Active, "{name}");
        assert_eq!(updated.pnl, Some(4.2), "{name}");
        assert_eq!(updated.entry_price, Some(0.815), "{name}");
        assert_eq!(updated.confidence, 90.0, "{name}");
        assert_eq!(updated.estimated_time_to_tps, "TP1: ~3h, TP2: ~9h", "{name}");
    }
}

#[tokio::test]
async fn explicit_null_pnl_clears_it() {
    for (name, store) in stores().await {
        store.insert_if_no_open(setup("XTZ")).await.unwrap();
        let with_pnl = StatusUpdate { pnl: Some(Some(4.2)), ..Default::default() };
        store.update_status(1, &with_pnl).await.unwrap();

        // Absent pnl keeps the stored value
        let active = StatusUpdate::status(SignalStatus::Active);
        let kept = store.update_status(1, &active).await.unwrap();
        assert_eq!(kept.unwrap().pnl, Some(4.2), "{name}");

        let cleared = StatusUpdate { pnl: Some(None), ..Default::default() };
        let cleared = store.update_status(1, &cleared).await.unwrap().unwrap();
        assert_eq!(cleared.pnl, None, "{name}");
        assert_eq!(cleared.status, SignalStatus::Active, "{name}");
    }
}

#[tokio::test]
async fn alert_applies_only_to_active_signals() {
    for (name, store) in stores().await {
        store.insert_if_no_open(setup("XTZ")).await.unwrap();

        // Pending is untouched
        assert!(store.raise_alert(1, &wall_alert()).await.unwrap().is_none(), "{name}");
        assert!(store.raise_alert(42, &wall_alert()).await.unwrap().is_none(), "{name}");

        store
            .update_status(1, &StatusUpdate::status(SignalStatus::Active))
            .await
            .unwrap();
        let alerted = store.raise_alert(1, &wall_alert()).await.unwrap().unwrap();
        assert_eq!(alerted.status, SignalStatus::Alert, "{name}");
        assert_eq!(alerted.alert_type, Some(AlertKind::WhaleWall), "{name}");
        assert!(alerted.alert_message.unwrap().contains("whale"), "{name}");

        assert!(store.with_status(SignalStatus::Active).await.unwrap().is_empty(), "{name}");
        assert_eq!(store.with_status(SignalStatus::Alert).await.unwrap().len(), 1, "{name}");
        // An alerted signal no longer blocks the symbol
        assert!(store.find_open("XTZ").await.unwrap().is_none(), "{name}");
    }
}

#[tokio::test]
async fn last_signal_time_tracks_newest_insert() {
    for (name, store) in stores().await {
        assert!(store.last_signal_time().await.unwrap().is_none(), "{name}");
        store.insert_if_no_open(setup("XTZ")).await.unwrap();
        let second = store.insert_if_no_open(setup("HAEDAL")).await.unwrap().unwrap();
        assert_eq!(store.last_signal_time().await.unwrap(), Some(second.created_at), "{name}");
        assert_eq!(store.get(2).await.unwrap().map(|s| s.symbol), Some("HAEDAL".into()), "{name}");
        assert!(store.get(3).await.unwrap().is_none(), "{name}");
    }
}
