use common::models::Direction;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManualTradeAck {
    pub status: String,
    #[serde(default)]
    pub trade_id: Option<String>,
    #[serde(default)]
    pub signal: Option<Direction>,
    #[serde(default)]
    pub entry_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RebalanceAck {
    pub status: String,
    #[serde(default)]
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub active_traders: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Body the backend sends alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> String {
        match self.reason {
            Some(reason) if !reason.is_empty() => format!("{}: {}", self.error, reason),
            _ => self.error,
        }
    }
}
