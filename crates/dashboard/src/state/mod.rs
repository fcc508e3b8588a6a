pub mod analytics_state;
pub mod registry;
pub mod selection;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::models::TraderSummary;
use tokio::sync::RwLock;

pub use analytics_state::AnalyticsState;
pub use registry::{CommitOutcome, CycleTicket, TraderRegistry};
pub use selection::SelectionModel;

use crate::errors::UnknownTrader;

/// Shared view-model. Background actors write it, the console reads snapshots of it.
#[derive(Default)]
pub struct DashboardState {
    pub registry: RwLock<TraderRegistry>,
    pub selection: SelectionModel,
    pub analytics: RwLock<AnalyticsState>,
}

/// Point-in-time copy of everything the views render.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub traders: Vec<TraderSummary>,
    pub selected: Option<String>,
    pub banner: Option<String>,
    pub loaded: bool,
    pub analytics: AnalyticsState,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    pub fn selected_summary(&self) -> Option<&TraderSummary> {
        let id = self.selected.as_deref()?;
        self.traders.iter().find(|t| t.trader_id == id)
    }
}

impl DashboardState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Selects a listed trader. Unknown ids leave the selection untouched.
    pub async fn select(&self, trader_id: &str) -> Result<(), UnknownTrader> {
        let registry = self.registry.read().await;
        if !registry.contains(trader_id) {
            return Err(UnknownTrader(trader_id.to_string()));
        }
        self.selection.select(Some(trader_id.to_string()));
        Ok(())
    }

    pub async fn summary(&self, trader_id: &str) -> Option<TraderSummary> {
        self.registry.read().await.get(trader_id).cloned()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let registry = self.registry.read().await;
        let selected = self.selection.current();
        let analytics = self.analytics.read().await.clone();

        DashboardSnapshot {
            traders: registry.traders().to_vec(),
            selected,
            banner: registry.banner().map(str::to_string),
            loaded: registry.has_loaded(),
            analytics,
            last_refreshed: registry.last_refreshed(),
        }
    }
}
