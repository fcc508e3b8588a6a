use std::{sync::Arc, time::Duration};

use common::{actors::ActorType, config::DashboardConfig};
use gateway::TraderGateway;
use tokio::sync::{Notify, watch};

use crate::{
    actors::Supervisor,
    services::{AnalyticsAggregator, MutationCoordinator, RegistryPoller, RegistrySync},
    state::DashboardState,
};

/// Everything wired together around one gateway: state, sync, mutations and the actor factories.
#[derive(Clone)]
pub struct DashboardRuntime {
    gateway: Arc<dyn TraderGateway>,
    state: Arc<DashboardState>,
    sync: RegistrySync,
    mutations: Arc<MutationCoordinator>,
    analytics_nudge: Arc<Notify>,
    registry_interval: Duration,
    analytics_interval: Duration,
}

impl DashboardRuntime {
    pub fn new(gateway: Arc<dyn TraderGateway>, config: &DashboardConfig) -> Self {
        let state = DashboardState::new();
        let sync = RegistrySync::new(gateway.clone(), state.clone());
        let analytics_nudge = Arc::new(Notify::new());
        let mutations = Arc::new(MutationCoordinator::new(
            gateway.clone(),
            sync.clone(),
            state.clone(),
            analytics_nudge.clone(),
        ));

        Self {
            gateway,
            state,
            sync,
            mutations,
            analytics_nudge,
            registry_interval: config.registry_interval,
            analytics_interval: config.analytics_interval,
        }
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    pub fn sync(&self) -> &RegistrySync {
        &self.sync
    }

    pub fn mutations(&self) -> &Arc<MutationCoordinator> {
        &self.mutations
    }

    pub fn register_actors(&self, supervisor: &mut Supervisor, shutdown_rx: watch::Receiver<bool>) {
        let sync = self.sync.clone();
        let interval = self.registry_interval;
        let poller_shutdown = shutdown_rx.clone();
        supervisor.register_actor(
            ActorType::RegistryPoller,
            Box::new(move || {
                Box::new(RegistryPoller::new(
                    sync.clone(),
                    interval,
                    poller_shutdown.clone(),
                ))
            }),
        );

        let gateway = self.gateway.clone();
        let state = self.state.clone();
        let nudge = self.analytics_nudge.clone();
        let interval = self.analytics_interval;
        supervisor.register_actor(
            ActorType::AnalyticsAggregator,
            Box::new(move || {
                Box::new(AnalyticsAggregator::new(
                    gateway.clone(),
                    state.clone(),
                    interval,
                    nudge.clone(),
                    shutdown_rx.clone(),
                ))
            }),
        );
    }
}
