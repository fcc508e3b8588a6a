pub mod ack_response;
pub mod gateway_client;
pub mod history_response;
pub mod traders_response;

pub use ack_response::{HealthStatus, ManualTradeAck, RebalanceAck, StatusAck};
pub use gateway_client::GatewayClient;
pub use history_response::{SignalHistory, TradeHistory};
pub use traders_response::{CreatedTrader, TraderListing};
