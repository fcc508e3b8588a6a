use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::Direction;

/// Lifecycle tag of a trade as reported by the backend.
///
/// Only the closed variants listed here count as terminal for P&L accounting; a status
/// string outside this set is kept verbatim and treated as still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeStatus {
    Open,
    Closed,
    ClosedStopLoss,
    ClosedTakeProfit,
    ClosedWin,
    ClosedLoss,
    ClosedManual,
    Unrecognized(String),
}

impl TradeStatus {
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Self::Closed
                | Self::ClosedStopLoss
                | Self::ClosedTakeProfit
                | Self::ClosedWin
                | Self::ClosedLoss
                | Self::ClosedManual
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::ClosedStopLoss => "closed_stop_loss",
            Self::ClosedTakeProfit => "closed_take_profit",
            Self::ClosedWin => "closed_win",
            Self::ClosedLoss => "closed_loss",
            Self::ClosedManual => "closed_manual",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for TradeStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "closed_stop_loss" => Self::ClosedStopLoss,
            "closed_take_profit" => Self::ClosedTakeProfit,
            "closed_win" => Self::ClosedWin,
            "closed_loss" => Self::ClosedLoss,
            "closed_manual" => Self::ClosedManual,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<&str> for TradeStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<TradeStatus> for String {
    fn from(status: TradeStatus) -> Self {
        match status {
            TradeStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub signal: Direction,
    pub entry_price: f64,
    pub quantity: f64,
    pub leverage: u32,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub timestamp: String,
    pub status: TradeStatus,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub pnl: f64,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    /// Backend timestamps are naive ISO-8601, with or without fractional seconds.
    pub fn opened_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_status_set() {
        for raw in [
            "closed",
            "closed_stop_loss",
            "CLOSED_TAKE_PROFIT",
            "CLOSED_WIN",
            "closed_loss",
        ] {
            assert!(TradeStatus::from(raw).is_closed(), "{} should be closed", raw);
        }

        assert!(!TradeStatus::from("open").is_closed());
        // Not in the known set, even though it mentions "closed".
        let odd = TradeStatus::from("partially_closed");
        assert!(!odd.is_closed());
        assert_eq!(odd.as_str(), "partially_closed");
    }

    #[test]
    fn test_trade_from_backend_json() {
        let raw = r#"{"id":"a1b2c3d4","signal":"LONG","entry_price":0.0191,"quantity":2617.8,
            "leverage":10,"stop_loss":0.01900,"take_profit":0.01938,
            "timestamp":"2024-05-01T10:15:00.123456","status":"closed_take_profit",
            "exit_price":0.01940,"pnl":7.85}"#;
        let trade: Trade = serde_json::from_str(raw).unwrap();

        assert!(trade.is_closed());
        assert_eq!(trade.signal, Direction::Long);
        assert_eq!(trade.exit_price, Some(0.01940));
        assert!(trade.opened_at().is_some());
    }

    #[test]
    fn test_open_trade_without_exit_fields() {
        let raw = r#"{"id":"e5f6","signal":"SHORT","entry_price":1.0,"quantity":1.0,
            "leverage":10,"stop_loss":1.01,"take_profit":0.97,
            "timestamp":"2024-05-01T10:15:00","status":"open","exit_price":null}"#;
        let trade: Trade = serde_json::from_str(raw).unwrap();

        assert!(!trade.is_closed());
        assert_eq!(trade.pnl, 0.0);
        assert!(trade.opened_at().is_some());
    }
}
