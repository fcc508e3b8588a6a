pub mod signal;
pub mod trade;
pub mod trader;

pub use signal::{Direction, Signal};
pub use trade::{Trade, TradeStatus};
pub use trader::{MAX_ACTIVE_TRADES, TraderState, TraderSummary};
