use std::{sync::Arc, time::Duration};

use analytics::AnalyticsReport;
use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage};
use gateway::{
    TraderGateway, TransportError,
    remote::{SignalHistory, TradeHistory},
};
use tokio::{
    sync::{Notify, mpsc, watch},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AnalyticsState, DashboardState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing selected; analytics cleared.
    Idle,
    Applied,
    /// The selection moved while the history was loading.
    Discarded,
    Shutdown,
}

/// Keeps the selected trader's derived analytics current.
///
/// Reloads on every tick, on every selection change, and whenever a mutation nudges it.
/// A result is only committed if the trader it was loaded for is still selected.
pub struct AnalyticsAggregator {
    id: Uuid,
    gateway: Arc<dyn TraderGateway>,
    state: Arc<DashboardState>,
    interval: Duration,
    nudge: Arc<Notify>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AnalyticsAggregator {
    pub fn new(
        gateway: Arc<dyn TraderGateway>,
        state: Arc<DashboardState>,
        interval: Duration,
        nudge: Arc<Notify>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            gateway,
            state,
            interval,
            nudge,
            shutdown_rx,
        }
    }

    async fn load(
        gateway: &dyn TraderGateway,
        trader_id: &str,
    ) -> Result<(TradeHistory, SignalHistory), TransportError> {
        tokio::try_join!(gateway.get_trades(trader_id), gateway.get_signals(trader_id))
    }

    /// Loads and commits analytics for whatever `selection_rx` currently points at.
    pub async fn refresh(
        &mut self,
        selection_rx: &mut watch::Receiver<Option<String>>,
    ) -> RefreshOutcome {
        let selected = selection_rx.borrow_and_update().clone();
        let Some(trader_id) = selected else {
            *self.state.analytics.write().await = AnalyticsState::Idle;
            return RefreshOutcome::Idle;
        };

        {
            let mut analytics = self.state.analytics.write().await;
            if !analytics.has_content_for(&trader_id) {
                *analytics = AnalyticsState::Loading {
                    trader_id: trader_id.clone(),
                };
            }
        }

        let fetched = tokio::select! {
            result = Self::load(self.gateway.as_ref(), &trader_id) => result,
            _ = selection_rx.changed() => {
                debug!("Selection moved off {} mid-load", trader_id);
                return RefreshOutcome::Discarded;
            }
            _ = self.shutdown_rx.changed() => return RefreshOutcome::Shutdown,
        };

        let summary = self.state.summary(&trader_id).await;

        let mut analytics = self.state.analytics.write().await;
        if self.state.selection.current().as_deref() != Some(trader_id.as_str()) {
            debug!("Dropping analytics for {}: no longer selected", trader_id);
            return RefreshOutcome::Discarded;
        }

        *analytics = match fetched {
            Ok((trades, signals)) => AnalyticsState::Ready(Arc::new(AnalyticsReport::build(
                &trader_id,
                &trades.trades,
                &signals.signals,
                summary.as_ref(),
            ))),
            Err(e) => {
                warn!("Analytics for trader {} failed: {}", trader_id, e);
                AnalyticsState::Failed {
                    trader_id,
                    error: e.to_string(),
                }
            }
        };
        RefreshOutcome::Applied
    }
}

#[async_trait]
impl Actor for AnalyticsAggregator {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::AnalyticsAggregator
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Aggregating analytics every {:?}", self.interval);

        let mut selection_rx = self.state.selection.subscribe();
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            match self.refresh(&mut selection_rx).await {
                RefreshOutcome::Shutdown => break,
                RefreshOutcome::Discarded => continue,
                RefreshOutcome::Idle | RefreshOutcome::Applied => {}
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = selection_rx.changed() => {}
                _ = self.nudge.notified() => debug!("Analytics nudged"),
                _ = self.shutdown_rx.changed() => break,
            }
        }

        heartbeat_handle.abort();
        info!("Analytics aggregator stopping");
        let _ = supervisor_tx.send(ControlMessage::Shutdown(self.id)).await;
        Ok(())
    }
}
