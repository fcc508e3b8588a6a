use std::fmt;

use common::models::Direction;
use gateway::TransportError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Delete,
    Start,
    Stop,
    ManualTrade(Direction),
    Rebalance,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Delete => f.write_str("delete"),
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
            Self::ManualTrade(direction) => write!(f, "manual {} trade", direction),
            Self::Rebalance => f.write_str("signal rebalance"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("{operation} failed{}: {source}", for_trader(.trader_id))]
    Failed {
        operation: MutationKind,
        trader_id: Option<String>,
        #[source]
        source: TransportError,
    },
    #[error("{operation} for trader {trader_id} refused: another action for this trader is still in flight")]
    InFlight {
        operation: MutationKind,
        trader_id: String,
    },
}

fn for_trader(trader_id: &Option<String>) -> String {
    trader_id
        .as_deref()
        .map(|id| format!(" for trader {}", id))
        .unwrap_or_default()
}

impl MutationError {
    pub fn operation(&self) -> MutationKind {
        match self {
            Self::Failed { operation, .. } | Self::InFlight { operation, .. } => *operation,
        }
    }

    /// Short operation-scoped text for the user, preferring the backend's own reason.
    pub fn user_message(&self) -> String {
        match self {
            Self::Failed {
                operation,
                trader_id,
                source,
            } => {
                let target = trader_id
                    .as_deref()
                    .map(|id| format!(" on {}", id))
                    .unwrap_or_default();
                let reason = source
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| source.to_string());
                format!("{}{} failed: {}", operation, target, reason)
            }
            Self::InFlight { .. } => self.to_string(),
        }
    }
}

/// Summaries that could not be fetched during an otherwise successful registry cycle.
#[derive(Error, Debug)]
#[error("{} of {listed} trader summaries failed to load", .failures.len())]
pub struct PartialFetchError {
    pub listed: usize,
    pub failures: Vec<(String, TransportError)>,
}

impl PartialFetchError {
    pub fn from_failures(listed: usize, failures: Vec<(String, TransportError)>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { listed, failures })
        }
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(id, _)| id.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("no trader with id {0} is currently listed")]
pub struct UnknownTrader(pub String);
