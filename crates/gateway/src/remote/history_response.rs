use common::models::{Signal, Trade};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeHistory {
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub total_trades: u32,
    #[serde(default)]
    pub active_trades: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalHistory {
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub total_signals: u32,
    #[serde(default)]
    pub balance_ratio: String,
}
