use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, DataMode, MarketDataClient, PollerCommand, SignalStore};
use engine::{CoinGlassClient, MemoryStore, Pipeline, Poller, PollerSettings, SqliteStore};
use paper::PaperMarket;
use risk::RiskConfig;
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid configuration")?;
    info!(mode = %cfg.data_mode, port = cfg.port, "Market sniper starting");

    let path = cfg.scoring_config_path.as_deref();
    let strategy_file = StrategyFileConfig::load(path).context("failed to load scoring config")?;
    let risk_cfg = RiskConfig::load(path).context("failed to load risk config")?;

    // ── Signal store ──────────────────────────────────────────────────────────
    let store: Arc<dyn SignalStore> = match &cfg.database_url {
        Some(url) => Arc::new(
            SqliteStore::connect(url)
                .await
                .with_context(|| format!("failed to open database {url}"))?,
        ),
        None => {
            info!("DATABASE_URL not set, signals are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // ── Market data (injected based on MARKET_DATA_MODE) ──────────────────────
    let client: Arc<dyn MarketDataClient> = match (cfg.data_mode, &cfg.coinglass_api_key) {
        (DataMode::Live, Some(key)) => {
            info!(base_url = %cfg.coinglass_base_url, "Live mode, using CoinGlassClient");
            Arc::new(CoinGlassClient::new(
                key.as_str(),
                cfg.coinglass_base_url.as_str(),
                cfg.request_timeout,
            )?)
        }
        _ => {
            info!("Paper mode, using simulated market data");
            Arc::new(PaperMarket::new())
        }
    };

    // ── Poller ────────────────────────────────────────────────────────────────
    let (poller, poller_handle) = Poller::new(
        PollerSettings::from_config(&cfg),
        client,
        store.clone(),
        Pipeline::new(strategy_file, risk_cfg),
    );

    // ── HTTP API ──────────────────────────────────────────────────────────────
    let api_state = api::AppState {
        store,
        poller_state: poller_handle.shared_state(),
        data_mode: cfg.data_mode,
    };

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    tokio::spawn(poller.run());
    poller_handle.send(PollerCommand::Start).await;

    let port = cfg.port;
    let server = tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "API server exited");
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for shutdown signal")?;
            info!("Shutdown signal received. Exiting.");
        }
        _ = server => {
            anyhow::bail!("API server stopped unexpectedly");
        }
    }

    poller_handle.send(PollerCommand::Stop).await;
    Ok(())
}
