use std::time::Duration;

use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage};
use tokio::{
    sync::{mpsc, watch},
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::registry_sync::{CycleOutcome, RegistrySync};

pub struct RegistryPoller {
    id: Uuid,
    sync: RegistrySync,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl RegistryPoller {
    pub fn new(sync: RegistrySync, interval: Duration, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sync,
            interval,
            shutdown_rx,
        }
    }
}

#[async_trait]
impl Actor for RegistryPoller {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::RegistryPoller
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Polling trader registry every {:?}", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.sync.run_cycle().await {
                        CycleOutcome::ListingFailed(e) => {
                            supervisor_tx
                                .send(ControlMessage::Error(
                                    self.id,
                                    format!("{:?}: trader listing failed: {}", self.name(), e),
                                ))
                                .await?;
                        }
                        CycleOutcome::Committed { partial: Some(partial), .. } => {
                            warn!("{}", partial);
                        }
                        CycleOutcome::Committed { partial: None, .. } | CycleOutcome::Discarded => {}
                    }
                }
                _ = self.shutdown_rx.changed() => break,
            }
        }

        heartbeat_handle.abort();
        info!("Registry poller stopping");
        let _ = supervisor_tx.send(ControlMessage::Shutdown(self.id)).await;
        Ok(())
    }
}
