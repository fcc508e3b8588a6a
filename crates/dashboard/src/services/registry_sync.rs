use std::{collections::HashSet, sync::Arc};

use futures_util::future::join_all;
use gateway::{TraderGateway, TransportError};
use tracing::{debug, error, warn};

use crate::{
    errors::PartialFetchError,
    state::{CommitOutcome, DashboardState},
};

#[derive(Debug)]
pub enum CycleOutcome {
    Committed {
        traders: usize,
        partial: Option<PartialFetchError>,
    },
    /// The listing call failed; the previous set is still shown behind a banner.
    ListingFailed(TransportError),
    /// A newer cycle or a local delete overtook this one.
    Discarded,
}

/// One full registry refresh: list ids, fetch every summary concurrently, commit the result.
///
/// Used by the periodic poller and forced by mutations; the cycle ticket decides which of
/// several overlapping cycles gets to commit.
#[derive(Clone)]
pub struct RegistrySync {
    gateway: Arc<dyn TraderGateway>,
    state: Arc<DashboardState>,
}

impl RegistrySync {
    pub fn new(gateway: Arc<dyn TraderGateway>, state: Arc<DashboardState>) -> Self {
        Self { gateway, state }
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        let ticket = self.state.registry.write().await.begin_cycle();

        let listing = match self.gateway.list_traders().await {
            Ok(listing) => listing,
            Err(e) => {
                let mut registry = self.state.registry.write().await;
                let banner = format!("Unable to reach the trading backend: {}", e);
                return match registry.fail(ticket, banner) {
                    CommitOutcome::Committed => {
                        error!("Trader listing failed: {}", e);
                        CycleOutcome::ListingFailed(e)
                    }
                    CommitOutcome::Stale => CycleOutcome::Discarded,
                };
            }
        };

        let mut seen = HashSet::new();
        let ids: Vec<String> = listing
            .traders
            .into_iter()
            .filter(|id| {
                let fresh = seen.insert(id.clone());
                if !fresh {
                    warn!("Backend listed trader {} twice", id);
                }
                fresh
            })
            .collect();
        let listed = ids.len();

        let results = join_all(ids.iter().map(|id| self.gateway.get_summary(id))).await;

        let mut traders = Vec::with_capacity(listed);
        let mut failures = Vec::new();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(summary) => traders.push(summary),
                Err(e) => {
                    warn!("Summary for trader {} failed: {}", id, e);
                    failures.push((id, e));
                }
            }
        }
        let partial = PartialFetchError::from_failures(listed, failures);

        let mut registry = self.state.registry.write().await;
        match registry.commit(ticket, traders) {
            CommitOutcome::Committed => {
                self.state.selection.reconcile(registry.traders());
                debug!("Registry now holds {} traders", registry.len());
                CycleOutcome::Committed {
                    traders: registry.len(),
                    partial,
                }
            }
            CommitOutcome::Stale => CycleOutcome::Discarded,
        }
    }
}
