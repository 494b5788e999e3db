use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use common::{SignalRecord, SignalStatus, StatusUpdate};

use crate::{ApiError, AppState};

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/signals", get(list_signals))
        .route("/api/signals/:id", get(get_signal))
        .route(
            "/api/signals/:id/status",
            post(update_status).patch(update_status),
        )
        .route("/api/status", get(get_status))
}

/// Ids that do not parse are treated like unknown ids.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::TradeNotFound)
}

// ─── Signals ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    status: Option<SignalStatus>,
}

async fn list_signals(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<SignalRecord>>, ApiError> {
    let signals = match q.status {
        Some(status) => state.store.with_status(status).await?,
        None => state.store.list().await?,
    };
    Ok(Json(signals))
}

async fn get_signal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SignalRecord>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::TradeNotFound)
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<SignalRecord>, ApiError> {
    let id = parse_id(&id)?;
    let record = state
        .store
        .update_status(id, &update)
        .await?
        .ok_or(ApiError::TradeNotFound)?;

    info!(
        id,
        symbol = %record.symbol,
        status = %record.status,
        pnl = ?record.pnl,
        "Signal updated by operator"
    );
    Ok(Json(record))
}

// ─── Status ───────────────────────────────────────────────────────────────────

async fn get_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let last = state.store.last_signal_time().await?;
    Ok(Json(json!({ "lastSignalTime": last })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use common::{
        DataMode, Direction, EntryZone, PollerState, PriceLevels, SignalStore, TakeProfitZone,
        TradeSetup,
    };
    use engine::MemoryStore;

    use crate::{router, AppState};

    fn setup(symbol: &str) -> TradeSetup {
        TradeSetup {
            symbol: symbol.into(),
            direction: Direction::Short,
            levels: PriceLevels {
                entry_zone: EntryZone { low: 0.1755, high: 0.1760 },
                stop_loss: 0.1790,
                take_profit_zone: TakeProfitZone { tp1: 0.1720, tp2: 0.1690 },
            },
            confidence: 95.0,
            risk_note: "Bias confirmed".into(),
            reason: "trend, funding".into(),
            estimated_time_to_tps: "TP1: ~3h, TP2: ~9h".into(),
        }
    }

    async fn state_with(symbols: &[&str]) -> AppState {
        let store = Arc::new(MemoryStore::new());
        for s in symbols {
            store.insert_if_no_open(setup(s)).await.unwrap();
        }
        AppState {
            store,
            poller_state: Arc::new(RwLock::new(PollerState::Running)),
            data_mode: DataMode::Paper,
        }
    }

    async fn call(
        state: AppState,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(b) => {
                req = req.header("content-type", "application/json");
                Body::from(b.to_string())
            }
            None => Body::empty(),
        };
        let resp = router(state).oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn lists_signals_in_insertion_order() {
        let state = state_with(&["HAEDAL", "XTZ"]).await;
        let (status, body) = call(state, Method::GET, "/api/signals", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], 1);
        assert_eq!(list[0]["symbol"], "HAEDAL");
        assert_eq!(list[0]["direction"], "SHORT");
        assert_eq!(list[0]["entryZone"]["low"], 0.1755);
        assert_eq!(list[1]["symbol"], "XTZ");
    }

    #[tokio::test]
    async fn empty_store_lists_nothing_and_has_no_last_signal() {
        let state = state_with(&[]).await;
        let (_, list) = call(state.clone(), Method::GET, "/api/signals", None).await;
        assert_eq!(list, json!([]));
        let (status, body) = call(state, Method::GET, "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["lastSignalTime"].is_null());
    }

    #[tokio::test]
    async fn status_reports_last_signal_time() {
        let state = state_with(&["XTZ"]).await;
        let created = state.store.get(1).await.unwrap().unwrap().created_at;
        let (_, body) = call(state, Method::GET, "/api/status", None).await;
        assert_eq!(body["lastSignalTime"], json!(created));
    }

    #[tokio::test]
    async fn filters_by_status() {
        let state = state_with(&["XTZ", "HAEDAL"]).await;
        let active = Some(r#"{"status":"active"}"#);
        call(state.clone(), Method::POST, "/api/signals/2/status", active).await;
        let (_, body) = call(state, Method::GET, "/api/signals?status=active", None).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["symbol"], "HAEDAL");
    }

    #[tokio::test]
    async fn get_unknown_signal_is_404() {
        let state = state_with(&["XTZ"]).await;
        let (status, body) = call(state, Method::GET, "/api/signals/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Trade not found" }));
    }

    #[tokio::test]
    async fn post_status_overwrites_provided_fields() {
        let state = state_with(&["XTZ"]).await;
        let (status, body) = call(
            state.clone(),
            Method::POST,
            "/api/signals/1/status",
            Some(r#"{"status":"active","entryPrice":0.1757}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["entryPrice"], 0.1757);
        assert!(body["pnl"].is_null());

        // PATCH with only pnl leaves status alone
        let (status, body) = call(
            state,
            Method::PATCH,
            "/api/signals/1/status",
            Some(r#"{"pnl":12.5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["pnl"], 12.5);
        assert_eq!(body["entryPrice"], 0.1757);
    }

    #[tokio::test]
    async fn explicit_null_pnl_clears_it() {
        let state = state_with(&["XTZ"]).await;
        let uri = "/api/signals/1/status";
        call(state.clone(), Method::PATCH, uri, Some(r#"{"pnl":7.5}"#)).await;

        // Absent key keeps the value
        let active = Some(r#"{"status":"active"}"#);
        let (_, body) = call(state.clone(), Method::PATCH, uri, active).await;
        assert_eq!(body["pnl"], 7.5);

        let (status, body) = call(state, Method::PATCH, uri, Some(r#"{"pnl":null}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["pnl"].is_null());
        assert_eq!(body["status"], "active");
    }

    #[tokio::test]
    async fn closed_status_frees_the_symbol() {
        let state = state_with(&["XTZ"]).await;
        let (status, body) = call(
            state.clone(),
            Method::POST,
            "/api/signals/1/status",
            Some(r#"{"status":"closed_loss","pnl":-3.1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "closed_loss");
        assert!(state.store.find_open("XTZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unknown_or_non_numeric_id_is_404_without_mutation() {
        let state = state_with(&["XTZ"]).await;
        let before = state.store.list().await.unwrap();

        for uri in ["/api/signals/99/status", "/api/signals/abc/status"] {
            let (status, body) =
                call(state.clone(), Method::POST, uri, Some(r#"{"status":"active"}"#)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, json!({ "error": "Trade not found" }), "{uri}");
        }
        assert_eq!(state.store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn healthz_reports_poller_and_mode() {
        let state = state_with(&[]).await;
        let (status, body) = call(state, Method::GET, "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "poller": "running", "mode": "paper" }));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let state = state_with(&[]).await;
        let req = Request::builder()
            .uri("/api/signals")
            .header("origin", "http://dashboard.local")
            .body(Body::empty())
            .unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
