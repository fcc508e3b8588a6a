use async_trait::async_trait;
use common::models::{Direction, TraderSummary};

use crate::errors::TransportError;
use crate::remote::{
    CreatedTrader, HealthStatus, ManualTradeAck, RebalanceAck, SignalHistory, StatusAck,
    TradeHistory, TraderListing,
};

/// One call per backend capability. Implementations never retry; callers own retry policy.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TraderGateway: Send + Sync {
    async fn list_traders(&self) -> Result<TraderListing, TransportError>;

    async fn create_trader(&self) -> Result<CreatedTrader, TransportError>;

    async fn delete_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError>;

    async fn start_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError>;

    async fn stop_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError>;

    async fn get_summary(&self, trader_id: &str) -> Result<TraderSummary, TransportError>;

    async fn get_trades(&self, trader_id: &str) -> Result<TradeHistory, TransportError>;

    async fn get_signals(&self, trader_id: &str) -> Result<SignalHistory, TransportError>;

    async fn manual_trade(
        &self,
        trader_id: &str,
        direction: Direction,
    ) -> Result<ManualTradeAck, TransportError>;

    async fn force_rebalance(&self, trader_id: &str) -> Result<RebalanceAck, TransportError>;

    async fn health(&self) -> Result<HealthStatus, TransportError>;
}
