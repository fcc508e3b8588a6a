use std::sync::Arc;

use analytics::AnalyticsReport;

/// What the detail view knows about the selected trader's history.
#[derive(Debug, Clone, Default)]
pub enum AnalyticsState {
    #[default]
    Idle,
    Loading {
        trader_id: String,
    },
    Ready(Arc<AnalyticsReport>),
    Failed {
        trader_id: String,
        error: String,
    },
}

impl AnalyticsState {
    pub fn trader_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Loading { trader_id } | Self::Failed { trader_id, .. } => Some(trader_id),
            Self::Ready(report) => Some(&report.trader_id),
        }
    }

    pub fn report(&self) -> Option<&AnalyticsReport> {
        match self {
            Self::Ready(report) => Some(report),
            _ => None,
        }
    }

    /// Whether this state already shows something for `trader_id`, so a refresh can run
    /// without falling back to a loading placeholder.
    pub fn has_content_for(&self, trader_id: &str) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed { .. }) && self.trader_id() == Some(trader_id)
    }
}
