use std::{
    collections::HashSet,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use async_trait::async_trait;
use common::{
    config::DashboardConfig,
    models::{Direction, Trade, TradeStatus, TraderSummary},
};
use dashboard::{
    DashboardRuntime,
    errors::MutationError,
    services::{AnalyticsAggregator, CycleOutcome, MutationCoordinator, RefreshOutcome},
    state::AnalyticsState,
};
use futures_util::FutureExt;
use gateway::{
    MockTraderGateway, TraderGateway, TransportError,
    remote::{
        CreatedTrader, HealthStatus, ManualTradeAck, RebalanceAck, SignalHistory, StatusAck,
        TradeHistory, TraderListing,
    },
};
use tokio::sync::{Notify, watch};

/// What the mocked backend currently believes; scenarios edit it between cycles.
#[derive(Default)]
struct FakeBackend {
    traders: Vec<String>,
    listing_down: bool,
    broken_summaries: HashSet<String>,
    list_calls: usize,
}

type Shared = Arc<Mutex<FakeBackend>>;

fn backend(ids: &[&str]) -> Shared {
    Arc::new(Mutex::new(FakeBackend {
        traders: ids.iter().map(|id| id.to_string()).collect(),
        ..Default::default()
    }))
}

fn rejected(method: &'static str, path: String, status: u16, message: &str) -> TransportError {
    TransportError::Status {
        method,
        path,
        status,
        message: message.to_string(),
    }
}

fn summary(trader_id: &str) -> TraderSummary {
    TraderSummary {
        trader_id: trader_id.to_string(),
        balance: 1000.0,
        roe: 10.0,
        target_roe: 20.0,
        drawdown: 0.0,
        total_trades: 3,
        active_trades: 1,
        win_rate: 50.0,
        signals_generated: 7,
        long_signals: 4,
        short_signals: 3,
        signal_balance: "4/3".to_string(),
        is_running: true,
        current_price: 0.0191,
        last_error: None,
    }
}

fn trade(id: &str, status: &str, pnl: f64) -> Trade {
    Trade {
        id: id.to_string(),
        signal: Direction::Long,
        entry_price: 0.0191,
        quantity: 1000.0,
        leverage: 10,
        stop_loss: 0.0188,
        take_profit: 0.0195,
        timestamp: "2024-05-01T10:00:00".to_string(),
        status: TradeStatus::from(status),
        exit_price: None,
        pnl,
    }
}

/// Listing and summary calls answered from `backend`.
fn mock_backend(backend: &Shared) -> MockTraderGateway {
    let mut mock = MockTraderGateway::new();

    let b = backend.clone();
    mock.expect_list_traders().returning(move || {
        let mut b = b.lock().unwrap();
        b.list_calls += 1;
        if b.listing_down {
            Err(rejected("GET", "/traders".to_string(), 503, "backend down"))
        } else {
            Ok(TraderListing {
                traders: b.traders.clone(),
                total: b.traders.len(),
            })
        }
    });

    let b = backend.clone();
    mock.expect_get_summary().returning(move |id| {
        if b.lock().unwrap().broken_summaries.contains(id) {
            Err(rejected(
                "GET",
                format!("/trader/{}/summary", id),
                404,
                "Trader not found",
            ))
        } else {
            Ok(summary(id))
        }
    });

    mock
}

fn runtime(mock: MockTraderGateway) -> DashboardRuntime {
    let gateway: Arc<dyn TraderGateway> = Arc::new(mock);
    DashboardRuntime::new(gateway, &DashboardConfig::default())
}

fn ids(traders: &[TraderSummary]) -> Vec<&str> {
    traders.iter().map(|t| t.trader_id.as_str()).collect()
}

#[tokio::test]
async fn test_listing_failure_keeps_last_known_traders_behind_one_banner() {
    let backend = backend(&["a", "b", "c"]);
    let runtime = runtime(mock_backend(&backend));

    assert!(matches!(
        runtime.sync().run_cycle().await,
        CycleOutcome::Committed { traders: 3, partial: None }
    ));

    backend.lock().unwrap().listing_down = true;
    assert!(matches!(
        runtime.sync().run_cycle().await,
        CycleOutcome::ListingFailed(_)
    ));
    assert!(matches!(
        runtime.sync().run_cycle().await,
        CycleOutcome::ListingFailed(_)
    ));

    let snapshot = runtime.state().snapshot().await;
    assert_eq!(ids(&snapshot.traders), vec!["a", "b", "c"]);
    assert_eq!(snapshot.selected.as_deref(), Some("a"));
    let banner = snapshot.banner.expect("banner after failed listing");
    assert!(banner.starts_with("Unable to reach the trading backend"));
    assert_eq!(banner.matches("Unable to reach").count(), 1);

    backend.lock().unwrap().listing_down = false;
    runtime.sync().run_cycle().await;
    assert!(runtime.state().snapshot().await.banner.is_none());
}

#[tokio::test]
async fn test_partial_summary_failure_omits_only_that_trader() {
    let backend = backend(&["a", "b", "c"]);
    backend
        .lock()
        .unwrap()
        .broken_summaries
        .insert("b".to_string());
    let runtime = runtime(mock_backend(&backend));

    match runtime.sync().run_cycle().await {
        CycleOutcome::Committed {
            traders,
            partial: Some(partial),
        } => {
            assert_eq!(traders, 2);
            assert_eq!(partial.listed, 3);
            assert_eq!(partial.failed_ids().collect::<Vec<_>>(), vec!["b"]);
        }
        other => panic!("expected a partial commit, got {:?}", other),
    }

    let snapshot = runtime.state().snapshot().await;
    assert_eq!(ids(&snapshot.traders), vec!["a", "c"]);
    assert!(snapshot.banner.is_none());
}

#[tokio::test]
async fn test_duplicate_ids_in_listing_are_collapsed() {
    let backend = backend(&["a", "b", "a"]);
    let runtime = runtime(mock_backend(&backend));

    runtime.sync().run_cycle().await;
    assert_eq!(
        ids(&runtime.state().snapshot().await.traders),
        vec!["a", "b"]
    );
}

#[tokio::test]
async fn test_selection_moves_when_selected_trader_disappears() {
    let backend = backend(&["a", "b"]);
    let runtime = runtime(mock_backend(&backend));

    runtime.sync().run_cycle().await;
    runtime.state().select("b").await.unwrap();

    backend.lock().unwrap().traders = vec!["a".to_string()];
    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current().as_deref(), Some("a"));

    backend.lock().unwrap().traders.clear();
    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current(), None);
}

#[tokio::test]
async fn test_refresh_never_resets_a_valid_selection() {
    let backend = backend(&["a", "b", "c"]);
    let runtime = runtime(mock_backend(&backend));

    runtime.sync().run_cycle().await;
    runtime.state().select("c").await.unwrap();

    backend.lock().unwrap().traders = vec!["b".to_string(), "c".to_string(), "a".to_string()];
    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current().as_deref(), Some("c"));
}

#[tokio::test]
async fn test_delete_of_only_trader_clears_selection_until_next_cycle() {
    let backend = backend(&["a"]);
    let mut mock = mock_backend(&backend);

    let seen_during_call: Arc<Mutex<Option<Option<String>>>> = Arc::new(Mutex::new(None));
    let state_slot: Arc<OnceLock<DashboardRuntime>> = Arc::new(OnceLock::new());
    {
        let backend = backend.clone();
        let seen = seen_during_call.clone();
        let slot = state_slot.clone();
        mock.expect_delete_trader().times(1).returning(move |id| {
            if let Some(runtime) = slot.get() {
                *seen.lock().unwrap() = Some(runtime.state().selection.current());
            }
            backend.lock().unwrap().traders.retain(|t| t != id);
            Ok(StatusAck {
                status: "deleted".to_string(),
                message: None,
                balance: None,
            })
        });
    }

    let runtime = runtime(mock);
    let _ = state_slot.set(runtime.clone());

    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current().as_deref(), Some("a"));

    runtime.mutations().delete("a").await.unwrap();

    assert_eq!(*seen_during_call.lock().unwrap(), Some(None));
    let snapshot = runtime.state().snapshot().await;
    assert!(snapshot.traders.is_empty());
    assert_eq!(snapshot.selected, None);

    backend.lock().unwrap().traders.push("b".to_string());
    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current().as_deref(), Some("b"));
}

#[tokio::test]
async fn test_failed_delete_is_restored_by_forced_cycle() {
    let backend = backend(&["a", "b"]);
    let mut mock = mock_backend(&backend);
    mock.expect_delete_trader().times(1).returning(|id| {
        Err(rejected(
            "DELETE",
            format!("/trader/{}/delete", id),
            500,
            "Failed to delete trader",
        ))
    });
    let runtime = runtime(mock);
    runtime.sync().run_cycle().await;

    let err = runtime.mutations().delete("b").await.unwrap_err();
    assert_eq!(err.user_message(), "delete on b failed: Failed to delete trader");

    assert_eq!(
        ids(&runtime.state().snapshot().await.traders),
        vec!["a", "b"]
    );
    assert!(!runtime.mutations().is_busy("b"));
}

/// Delegates to `inner`, but holds every delete until `release` is notified.
struct SlowDelete {
    inner: MockTraderGateway,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl TraderGateway for SlowDelete {
    async fn list_traders(&self) -> Result<TraderListing, TransportError> {
        self.inner.list_traders().await
    }

    async fn create_trader(&self) -> Result<CreatedTrader, TransportError> {
        self.inner.create_trader().await
    }

    async fn delete_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.delete_trader(trader_id).await
    }

    async fn start_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError> {
        self.inner.start_trader(trader_id).await
    }

    async fn stop_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError> {
        self.inner.stop_trader(trader_id).await
    }

    async fn get_summary(&self, trader_id: &str) -> Result<TraderSummary, TransportError> {
        self.inner.get_summary(trader_id).await
    }

    async fn get_trades(&self, trader_id: &str) -> Result<TradeHistory, TransportError> {
        self.inner.get_trades(trader_id).await
    }

    async fn get_signals(&self, trader_id: &str) -> Result<SignalHistory, TransportError> {
        self.inner.get_signals(trader_id).await
    }

    async fn manual_trade(
        &self,
        trader_id: &str,
        direction: Direction,
    ) -> Result<ManualTradeAck, TransportError> {
        self.inner.manual_trade(trader_id, direction).await
    }

    async fn force_rebalance(&self, trader_id: &str) -> Result<RebalanceAck, TransportError> {
        self.inner.force_rebalance(trader_id).await
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        self.inner.health().await
    }
}

#[tokio::test]
async fn test_poll_during_pending_delete_does_not_bring_trader_back() {
    let backend = backend(&["a", "b"]);
    let mut mock = mock_backend(&backend);
    {
        let backend = backend.clone();
        mock.expect_delete_trader().times(1).returning(move |id| {
            backend.lock().unwrap().traders.retain(|t| t != id);
            Ok(StatusAck {
                status: "deleted".to_string(),
                message: None,
                balance: None,
            })
        });
    }
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gateway: Arc<dyn TraderGateway> = Arc::new(SlowDelete {
        inner: mock,
        entered: entered.clone(),
        release: release.clone(),
    });
    let runtime = DashboardRuntime::new(gateway, &DashboardConfig::default());
    runtime.sync().run_cycle().await;
    runtime.state().select("a").await.unwrap();

    let mutations = runtime.mutations().clone();
    let delete = tokio::spawn(async move { mutations.delete("a").await });
    entered.notified().await;

    // The backend still lists "a" while its DELETE is pending.
    assert!(matches!(
        runtime.sync().run_cycle().await,
        CycleOutcome::Committed { traders: 1, .. }
    ));
    let snapshot = runtime.state().snapshot().await;
    assert_eq!(ids(&snapshot.traders), vec!["b"]);
    assert_eq!(snapshot.selected.as_deref(), Some("b"));

    release.notify_one();
    delete.await.unwrap().unwrap();

    assert_eq!(ids(&runtime.state().snapshot().await.traders), vec!["b"]);
    assert!(!runtime.mutations().is_busy("a"));
}

#[tokio::test]
async fn test_create_selects_the_new_trader() {
    let backend = backend(&["a"]);
    let mut mock = mock_backend(&backend);
    {
        let backend = backend.clone();
        mock.expect_create_trader().times(1).returning(move || {
            backend.lock().unwrap().traders.push("fresh".to_string());
            Ok(CreatedTrader {
                trader_id: "fresh".to_string(),
                status: "created".to_string(),
            })
        });
    }
    let runtime = runtime(mock);
    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current().as_deref(), Some("a"));

    let created = runtime.mutations().create().await.unwrap();

    assert_eq!(created, "fresh");
    assert_eq!(runtime.state().selection.current().as_deref(), Some("fresh"));
    assert_eq!(
        ids(&runtime.state().snapshot().await.traders),
        vec!["a", "fresh"]
    );
}

#[tokio::test]
async fn test_second_mutation_on_busy_trader_is_refused() {
    let backend = backend(&["a"]);
    let mut mock = mock_backend(&backend);

    let coordinator: Arc<OnceLock<Arc<MutationCoordinator>>> = Arc::new(OnceLock::new());
    let refused: Arc<Mutex<Option<Result<(), MutationError>>>> = Arc::new(Mutex::new(None));
    {
        let coordinator = coordinator.clone();
        let refused = refused.clone();
        mock.expect_start_trader().times(1).returning(move |_| {
            if let Some(coordinator) = coordinator.get() {
                // Claimed synchronously, so the nested call resolves on first poll.
                *refused.lock().unwrap() = coordinator.stop("a").now_or_never();
            }
            Ok(StatusAck {
                status: "started".to_string(),
                message: None,
                balance: None,
            })
        });
    }
    mock.expect_stop_trader().never();

    let runtime = runtime(mock);
    let _ = coordinator.set(runtime.mutations().clone());

    runtime.mutations().start("a").await.unwrap();

    let refused = refused.lock().unwrap().take();
    assert!(matches!(
        refused,
        Some(Err(MutationError::InFlight { trader_id, .. })) if trader_id == "a"
    ));
    assert!(!runtime.mutations().is_busy("a"));
}

#[tokio::test]
async fn test_rejected_manual_trade_surfaces_backend_reason_without_refresh() {
    let backend = backend(&["a"]);
    let mut mock = mock_backend(&backend);
    mock.expect_manual_trade().times(1).returning(|id, _| {
        Err(rejected(
            "POST",
            format!("/trader/{}/manual-trade", id),
            400,
            "Maximum active trades reached (2)",
        ))
    });
    let runtime = runtime(mock);
    runtime.sync().run_cycle().await;
    let calls_before = backend.lock().unwrap().list_calls;

    let err = runtime
        .mutations()
        .manual_trade("a", Direction::Short)
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "manual SHORT trade on a failed: Maximum active trades reached (2)"
    );
    assert_eq!(backend.lock().unwrap().list_calls, calls_before);
}

fn aggregator(
    runtime: &DashboardRuntime,
    gateway: Arc<dyn TraderGateway>,
) -> (AnalyticsAggregator, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let aggregator = AnalyticsAggregator::new(
        gateway,
        runtime.state().clone(),
        Duration::from_secs(5),
        Arc::new(Notify::new()),
        shutdown_rx,
    );
    (aggregator, shutdown_tx)
}

#[tokio::test]
async fn test_analytics_built_for_selected_trader() {
    let backend = backend(&["a"]);
    let mut mock = mock_backend(&backend);
    mock.expect_get_trades().returning(|_| {
        Ok(TradeHistory {
            trades: vec![
                trade("t1", "closed", 5.0),
                trade("t2", "open", 0.0),
                trade("t3", "closed_stop_loss", -2.0),
            ],
            total_trades: 3,
            active_trades: 1,
        })
    });
    mock.expect_get_signals().returning(|_| {
        Ok(SignalHistory {
            signals: Vec::new(),
            total_signals: 0,
            balance_ratio: "0/0".to_string(),
        })
    });
    let gateway: Arc<dyn TraderGateway> = Arc::new(mock);
    let runtime = DashboardRuntime::new(gateway.clone(), &DashboardConfig::default());
    runtime.sync().run_cycle().await;

    let (mut aggregator, _shutdown_tx) = aggregator(&runtime, gateway);
    let mut selection_rx = runtime.state().selection.subscribe();

    assert_eq!(
        aggregator.refresh(&mut selection_rx).await,
        RefreshOutcome::Applied
    );

    let snapshot = runtime.state().snapshot().await;
    let report = snapshot.analytics.report().expect("report ready");
    assert_eq!(report.trader_id, "a");
    let series: Vec<f64> = report.pnl_series.iter().map(|p| p.cumulative).collect();
    assert_eq!(series, vec![5.0, 3.0]);
    assert_eq!((report.win_loss.wins, report.win_loss.losses), (1, 1));
    assert_eq!(report.progress.map(|p| p.raw), Some(50.0));
}

#[tokio::test]
async fn test_analytics_failure_renders_no_partial_series() {
    let backend = backend(&["a"]);
    let mut mock = mock_backend(&backend);
    mock.expect_get_trades().returning(|_| {
        Ok(TradeHistory {
            trades: vec![trade("t1", "closed", 5.0)],
            total_trades: 1,
            active_trades: 0,
        })
    });
    mock.expect_get_signals().returning(|id| {
        Err(rejected(
            "GET",
            format!("/trader/{}/signals", id),
            500,
            "internal error",
        ))
    });
    let gateway: Arc<dyn TraderGateway> = Arc::new(mock);
    let runtime = DashboardRuntime::new(gateway.clone(), &DashboardConfig::default());
    runtime.sync().run_cycle().await;

    let (mut aggregator, _shutdown_tx) = aggregator(&runtime, gateway);
    let mut selection_rx = runtime.state().selection.subscribe();
    aggregator.refresh(&mut selection_rx).await;

    match runtime.state().snapshot().await.analytics {
        AnalyticsState::Failed { trader_id, error } => {
            assert_eq!(trader_id, "a");
            assert!(error.contains("internal error"));
        }
        other => panic!("expected failed analytics, got {:?}", other),
    }
}

#[tokio::test]
async fn test_analytics_for_previous_selection_is_discarded() {
    let backend = backend(&["a", "b"]);
    let mut mock = mock_backend(&backend);

    let runtime_slot: Arc<OnceLock<DashboardRuntime>> = Arc::new(OnceLock::new());
    {
        let slot = runtime_slot.clone();
        mock.expect_get_trades().returning(move |id| {
            // The user switches to "b" while "a" is still loading.
            if id == "a" {
                if let Some(runtime) = slot.get() {
                    runtime.state().selection.select(Some("b".to_string()));
                }
            }
            Ok(TradeHistory {
                trades: vec![trade(&format!("{}-t1", id), "closed", 1.0)],
                total_trades: 1,
                active_trades: 0,
            })
        });
    }
    mock.expect_get_signals().returning(|_| {
        Ok(SignalHistory {
            signals: Vec::new(),
            total_signals: 0,
            balance_ratio: "0/0".to_string(),
        })
    });
    let gateway: Arc<dyn TraderGateway> = Arc::new(mock);
    let runtime = DashboardRuntime::new(gateway.clone(), &DashboardConfig::default());
    let _ = runtime_slot.set(runtime.clone());
    runtime.sync().run_cycle().await;
    assert_eq!(runtime.state().selection.current().as_deref(), Some("a"));

    let (mut aggregator, _shutdown_tx) = aggregator(&runtime, gateway);
    let mut selection_rx = runtime.state().selection.subscribe();

    assert_eq!(
        aggregator.refresh(&mut selection_rx).await,
        RefreshOutcome::Discarded
    );
    let analytics = runtime.state().snapshot().await.analytics;
    assert!(analytics.report().is_none());

    assert_eq!(
        aggregator.refresh(&mut selection_rx).await,
        RefreshOutcome::Applied
    );
    let snapshot = runtime.state().snapshot().await;
    let report = snapshot.analytics.report().expect("report for b");
    assert_eq!(report.trader_id, "b");
    assert_eq!(report.recent_trades[0].id, "b-t1");
}

#[tokio::test]
async fn test_no_selection_leaves_analytics_idle() {
    let backend = backend(&[]);
    let mut mock = mock_backend(&backend);
    mock.expect_get_trades().never();
    mock.expect_get_signals().never();
    let gateway: Arc<dyn TraderGateway> = Arc::new(mock);
    let runtime = DashboardRuntime::new(gateway.clone(), &DashboardConfig::default());
    runtime.sync().run_cycle().await;

    let (mut aggregator, _shutdown_tx) = aggregator(&runtime, gateway);
    let mut selection_rx = runtime.state().selection.subscribe();

    assert_eq!(
        aggregator.refresh(&mut selection_rx).await,
        RefreshOutcome::Idle
    );
    assert!(matches!(
        runtime.state().snapshot().await.analytics,
        AnalyticsState::Idle
    ));
}
