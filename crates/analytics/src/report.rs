use common::models::{Signal, Trade, TraderSummary};
use serde::Serialize;

use crate::pnl::{PerformanceStats, PnlPoint, WinLoss, cumulative_pnl, performance_stats, win_loss};
use crate::progress::TargetProgress;
use crate::signals::{SignalDistribution, recent_signals, recent_trades};

/// Size of the recent signal and trade windows.
pub const RECENT_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub trader_id: String,
    pub pnl_series: Vec<PnlPoint>,
    pub win_loss: WinLoss,
    pub performance: PerformanceStats,
    /// Only known when the trader still has a summary in the registry.
    pub distribution: Option<SignalDistribution>,
    pub progress: Option<TargetProgress>,
    /// Oldest first.
    pub recent_signals: Vec<Signal>,
    /// Newest first.
    pub recent_trades: Vec<Trade>,
}

impl AnalyticsReport {
    pub fn build(
        trader_id: &str,
        trades: &[Trade],
        signals: &[Signal],
        summary: Option<&TraderSummary>,
    ) -> Self {
        Self {
            trader_id: trader_id.to_string(),
            pnl_series: cumulative_pnl(trades),
            win_loss: win_loss(trades),
            performance: performance_stats(trades),
            distribution: summary.map(SignalDistribution::from_summary),
            progress: summary.map(|s| TargetProgress::new(s.roe, s.target_roe)),
            recent_signals: recent_signals(signals, RECENT_WINDOW).to_vec(),
            recent_trades: recent_trades(trades, RECENT_WINDOW)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    pub fn realised_pnl(&self) -> f64 {
        self.pnl_series.last().map(|p| p.cumulative).unwrap_or(0.0)
    }
}
