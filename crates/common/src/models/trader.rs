use serde::{Deserialize, Serialize};

/// Backend-side cap on concurrently open trades per trader.
pub const MAX_ACTIVE_TRADES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraderSummary {
    pub trader_id: String,
    pub balance: f64,
    pub roe: f64,
    pub target_roe: f64,
    pub drawdown: f64,
    pub total_trades: u32,
    pub active_trades: u32,
    pub win_rate: f64,
    pub signals_generated: u32,
    pub long_signals: u32,
    pub short_signals: u32,
    pub signal_balance: String,
    pub is_running: bool,
    pub current_price: f64,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraderState<'a> {
    Running,
    Stopped,
    Faulted(&'a str),
}

impl TraderSummary {
    /// A reported error wins over the running flag.
    pub fn state(&self) -> TraderState<'_> {
        match self.last_error.as_deref() {
            Some(err) if !err.trim().is_empty() => TraderState::Faulted(err),
            _ if self.is_running => TraderState::Running,
            _ => TraderState::Stopped,
        }
    }

    pub fn at_trade_capacity(&self) -> bool {
        self.active_trades >= MAX_ACTIVE_TRADES
    }
}
