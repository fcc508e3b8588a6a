use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use common::models::Direction;
use gateway::{
    TraderGateway,
    remote::{ManualTradeAck, RebalanceAck},
};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::{
    errors::{MutationError, MutationKind},
    services::registry_sync::RegistrySync,
    state::DashboardState,
};

/// Marks a trader busy for as long as it lives.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    trader_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.trader_id);
    }
}

/// User-initiated changes to traders. Each one goes to the backend, then forces a registry
/// cycle so the list reflects the backend's answer rather than a local guess.
pub struct MutationCoordinator {
    gateway: Arc<dyn TraderGateway>,
    sync: RegistrySync,
    state: Arc<DashboardState>,
    analytics_nudge: Arc<Notify>,
    in_flight: Mutex<HashSet<String>>,
}

impl MutationCoordinator {
    pub fn new(
        gateway: Arc<dyn TraderGateway>,
        sync: RegistrySync,
        state: Arc<DashboardState>,
        analytics_nudge: Arc<Notify>,
    ) -> Self {
        Self {
            gateway,
            sync,
            state,
            analytics_nudge,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// At most one mutation per trader at a time.
    fn claim(
        &self,
        operation: MutationKind,
        trader_id: &str,
    ) -> Result<InFlightGuard<'_>, MutationError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(trader_id.to_string()) {
            return Err(MutationError::InFlight {
                operation,
                trader_id: trader_id.to_string(),
            });
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            trader_id: trader_id.to_string(),
        })
    }

    pub fn is_busy(&self, trader_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(trader_id)
    }

    fn failed(
        operation: MutationKind,
        trader_id: Option<&str>,
    ) -> impl FnOnce(gateway::TransportError) -> MutationError {
        let trader_id = trader_id.map(str::to_string);
        move |source| MutationError::Failed {
            operation,
            trader_id,
            source,
        }
    }

    /// Creates a trader and selects it once a registry cycle lists it.
    pub async fn create(&self) -> Result<String, MutationError> {
        let created = self
            .gateway
            .create_trader()
            .await
            .map_err(Self::failed(MutationKind::Create, None))?;

        info!("Created trader {}", created.trader_id);
        self.state.selection.prefer(created.trader_id.clone());
        self.sync.run_cycle().await;
        Ok(created.trader_id)
    }

    /// Hides the trader straight away, then lets the forced cycle confirm or restore it.
    pub async fn delete(&self, trader_id: &str) -> Result<(), MutationError> {
        let _guard = self.claim(MutationKind::Delete, trader_id)?;

        {
            let mut registry = self.state.registry.write().await;
            registry.remove_optimistic(trader_id);
            self.state.selection.on_removed(trader_id, registry.traders());
        }

        let result = self.gateway.delete_trader(trader_id).await;
        if let Err(e) = &result {
            warn!("Delete of trader {} failed, restoring from backend: {}", trader_id, e);
        }
        self.state
            .registry
            .write()
            .await
            .finish_delete(trader_id, result.is_ok());
        self.sync.run_cycle().await;

        result
            .map(|_| info!("Deleted trader {}", trader_id))
            .map_err(Self::failed(MutationKind::Delete, Some(trader_id)))
    }

    pub async fn start(&self, trader_id: &str) -> Result<(), MutationError> {
        let _guard = self.claim(MutationKind::Start, trader_id)?;
        self.gateway
            .start_trader(trader_id)
            .await
            .map_err(Self::failed(MutationKind::Start, Some(trader_id)))?;

        info!("Started trader {}", trader_id);
        self.sync.run_cycle().await;
        Ok(())
    }

    pub async fn stop(&self, trader_id: &str) -> Result<(), MutationError> {
        let _guard = self.claim(MutationKind::Stop, trader_id)?;
        self.gateway
            .stop_trader(trader_id)
            .await
            .map_err(Self::failed(MutationKind::Stop, Some(trader_id)))?;

        info!("Stopped trader {}", trader_id);
        self.sync.run_cycle().await;
        Ok(())
    }

    pub async fn manual_trade(
        &self,
        trader_id: &str,
        direction: Direction,
    ) -> Result<ManualTradeAck, MutationError> {
        let operation = MutationKind::ManualTrade(direction);
        let _guard = self.claim(operation, trader_id)?;
        let ack = self
            .gateway
            .manual_trade(trader_id, direction)
            .await
            .map_err(Self::failed(operation, Some(trader_id)))?;

        info!(
            "Manual {} trade opened for {} (trade {:?})",
            direction, trader_id, ack.trade_id
        );
        self.sync.run_cycle().await;
        self.analytics_nudge.notify_one();
        Ok(ack)
    }

    pub async fn rebalance(&self, trader_id: &str) -> Result<RebalanceAck, MutationError> {
        let _guard = self.claim(MutationKind::Rebalance, trader_id)?;
        let ack = self
            .gateway
            .force_rebalance(trader_id)
            .await
            .map_err(Self::failed(MutationKind::Rebalance, Some(trader_id)))?;

        info!("Rebalanced signals for {}: {}", trader_id, ack.balance);
        self.sync.run_cycle().await;
        self.analytics_nudge.notify_one();
        Ok(ack)
    }
}
