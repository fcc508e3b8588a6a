use common::models::{Signal, Trade, TraderSummary};
use serde::Serialize;

/// Long/short balance as reported by the trader summary. The raw signal list is only a
/// recent window, so the counters are never recomputed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalDistribution {
    pub long: u32,
    pub short: u32,
}

impl SignalDistribution {
    pub fn from_summary(summary: &TraderSummary) -> Self {
        Self {
            long: summary.long_signals,
            short: summary.short_signals,
        }
    }

    /// Widened so two backend counters can never overflow when summed.
    pub fn total(&self) -> u64 {
        u64::from(self.long) + u64::from(self.short)
    }

    pub fn long_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.long as f64 / total as f64,
        }
    }

    pub fn short_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.short as f64 / total as f64,
        }
    }

    /// Within two signals, or within 10% of the total when that is larger.
    pub fn is_balanced(&self) -> bool {
        let total = self.total();
        if total == 0 {
            return true;
        }
        let tolerance = (total as f64 * 0.1).max(2.0);
        (self.long as f64 - self.short as f64).abs() <= tolerance
    }
}

/// Last `n` signals, oldest first.
pub fn recent_signals(signals: &[Signal], n: usize) -> &[Signal] {
    &signals[signals.len().saturating_sub(n)..]
}

/// Last `n` trades, newest first.
pub fn recent_trades(trades: &[Trade], n: usize) -> Vec<&Trade> {
    trades.iter().rev().take(n).collect()
}
