use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use common::{
    Config, Error, MarketContext, MarketDataClient, MarketTicker, PollerCommand, PollerState,
    Result, SignalStatus, SignalStore, TickReport,
};
use risk::detect_wall;
use strategy::select_candidates;

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    pub interval: Duration,
    /// Upper bound on every single upstream call.
    pub request_timeout: Duration,
    pub max_candidates: usize,
}

impl PollerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interval: cfg.poll_interval,
            request_timeout: cfg.request_timeout,
            max_candidates: cfg.max_candidates,
        }
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            request_timeout: Duration::from_secs(10),
            max_candidates: 5,
        }
    }
}

/// Cloneable handle passed to the API and the binary.
#[derive(Clone)]
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollerCommand>,
    state: Arc<RwLock<PollerState>>,
    last_report: Arc<RwLock<Option<TickReport>>>,
}

impl PollerHandle {
    pub async fn send(&self, cmd: PollerCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> PollerState {
        *self.state.read().await
    }

    /// The state cell itself, for readers that outlive this handle's borrow.
    pub fn shared_state(&self) -> Arc<RwLock<PollerState>> {
        self.state.clone()
    }

    /// Summary of the most recent completed tick.
    pub async fn last_report(&self) -> Option<TickReport> {
        self.last_report.read().await.clone()
    }
}

/// Scheduled market scan: finds new signals and watches active ones.
///
/// Ticks run inline in the `run` loop, so two ticks never overlap. Commands
/// arriving during a tick are handled once it finishes.
pub struct Poller {
    settings: PollerSettings,
    client: Arc<dyn MarketDataClient>,
    store: Arc<dyn SignalStore>,
    pipeline: Pipeline,
    state: Arc<RwLock<PollerState>>,
    last_report: Arc<RwLock<Option<TickReport>>>,
    command_rx: mpsc::Receiver<PollerCommand>,
}

impl Poller {
    pub fn new(
        settings: PollerSettings,
        client: Arc<dyn MarketDataClient>,
        store: Arc<dyn SignalStore>,
        pipeline: Pipeline,
    ) -> (Self, PollerHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let state = Arc::new(RwLock::new(PollerState::Stopped));
        let last_report = Arc::new(RwLock::new(None));

        let handle = PollerHandle {
            command_tx,
            state: state.clone(),
            last_report: last_report.clone(),
        };

        let poller = Poller {
            settings,
            client,
            store,
            pipeline,
            state,
            last_report,
            command_rx,
        };

        (poller, handle)
    }

    /// Drive the schedule and process commands until every handle is dropped.
    /// Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            interval = ?self.settings.interval,
            "Poller initialized in Stopped state. Waiting for Start command."
        );

        // tokio panics on a zero period
        let period = if self.settings.interval.is_zero() {
            warn!("Poll interval is zero, falling back to one second");
            Duration::from_secs(1)
        } else {
            self.settings.interval
        };
        let mut schedule = interval(period);
        schedule.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = schedule.tick() => {
                    if *self.state.read().await == PollerState::Running {
                        self.tick().await;
                    }
                }

                cmd = self.command_rx.recv() => match cmd {
                    Some(PollerCommand::Start) => {
                        let current = *self.state.read().await;
                        if current == PollerState::Running {
                            info!("Poller already running");
                            continue;
                        }
                        info!("Poller starting");
                        *self.state.write().await = PollerState::Running;
                        schedule.reset_immediately();
                    }

                    Some(PollerCommand::Stop) => {
                        info!("Poller stopped");
                        *self.state.write().await = PollerState::Stopped;
                    }

                    Some(PollerCommand::Pause) => {
                        let current = *self.state.read().await;
                        if current == PollerState::Running {
                            info!("Poller paused, scheduled ticks suppressed");
                            *self.state.write().await = PollerState::Paused;
                        }
                    }

                    Some(PollerCommand::Resume) => {
                        let current = *self.state.read().await;
                        if current == PollerState::Paused {
                            info!("Poller resumed");
                            *self.state.write().await = PollerState::Running;
                        }
                    }

                    Some(PollerCommand::RunNow) => {
                        info!("Manual tick requested");
                        self.tick().await;
                    }

                    None => {
                        warn!("Poller command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One full scan: new signals first, then the alert check.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        self.find_new_signals(&mut report).await;
        self.check_alerts(&mut report).await;

        info!(
            candidates = report.candidates,
            scored = report.scored,
            inserted = report.inserted,
            alerts = report.alerts,
            "Tick complete"
        );
        *self.last_report.write().await = Some(report.clone());
        report
    }

    async fn find_new_signals(&self, report: &mut TickReport) {
        let tickers = match self.bounded(self.client.tickers()).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Market overview unavailable, no new signals this tick");
                return;
            }
        };

        let candidates =
            select_candidates(&self.pipeline.filter, &tickers, self.settings.max_candidates);
        report.candidates = candidates.len();
        debug!(total = tickers.len(), candidates = candidates.len(), "Tickers filtered");

        for ticker in candidates {
            let symbol = ticker.symbol.clone();

            match self.store.find_open(&symbol).await {
                Ok(Some(open)) => {
                    debug!(%symbol, id = open.id, "Open signal exists, skipping");
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%symbol, error = %e, "Store lookup failed, skipping candidate");
                    continue;
                }
            }

            let ctx = match self.context_for(ticker).await {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(%symbol, error = %e, "Candidate data unavailable, skipping");
                    continue;
                }
            };
            report.scored += 1;

            let Some(setup) = self.pipeline.setup_for(&ctx) else {
                continue;
            };

            match self.store.insert_if_no_open(setup).await {
                Ok(Some(record)) => {
                    report.inserted += 1;
                    info!(
                        id = record.id,
                        symbol = %record.symbol,
                        direction = %record.direction,
                        confidence = record.confidence,
                        "NEW SIGNAL ADDED"
                    );
                }
                Ok(None) => debug!(%symbol, "Open signal appeared concurrently, skipped"),
                Err(e) => warn!(%symbol, error = %e, "Failed to store signal"),
            }
        }
    }

    async fn check_alerts(&self, report: &mut TickReport) {
        let active = match self.store.with_status(SignalStatus::Active).await {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "Could not load active signals for alert check");
                return;
            }
        };

        for signal in active {
            let book = match self.bounded(self.client.order_book(&signal.symbol)).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(symbol = %signal.symbol, error = %e, "Order book unavailable");
                    continue;
                }
            };

            let entry = signal.entry_price.unwrap_or_else(|| signal.entry_zone.mid());
            let Some(wall) = detect_wall(&self.pipeline.risk, signal.direction, entry, &book)
            else {
                continue;
            };

            match self.store.raise_alert(signal.id, &wall.to_alert()).await {
                Ok(Some(updated)) => {
                    report.alerts += 1;
                    warn!(
                        id = updated.id,
                        symbol = %updated.symbol,
                        wall_price = wall.price,
                        notional_usd = wall.notional_usd,
                        "ALERT TRIGGERED"
                    );
                }
                Ok(None) => debug!(id = signal.id, "Signal left active state before alert"),
                Err(e) => warn!(id = signal.id, error = %e, "Failed to record alert"),
            }
        }
    }

    /// Fetch everything the scorer needs for one candidate. Any failing call
    /// fails the whole context.
    async fn context_for(&self, ticker: MarketTicker) -> Result<MarketContext> {
        let symbol = ticker.symbol.as_str();
        let (candles, funding_rate, oi_change, order_book, liquidation_levels, sentiment) =
            tokio::try_join!(
                self.bounded(self.client.candles(symbol, self.pipeline.lookback())),
                self.bounded(self.client.funding_rate(symbol)),
                self.bounded(self.client.open_interest_change(symbol)),
                self.bounded(self.client.order_book(symbol)),
                self.bounded(self.client.liquidation_levels(symbol)),
                self.bounded(self.client.sentiment(symbol)),
            )?;

        Ok(MarketContext {
            ticker,
            candles,
            funding_rate,
            open_interest_change_pct: oi_change,
            order_book,
            liquidation_levels,
            sentiment,
        })
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.settings.request_timeout;
        timeout(limit, call).await.map_err(|_| Error::Timeout(limit))?
    }
}
