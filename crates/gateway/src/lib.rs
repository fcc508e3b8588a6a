pub mod errors;
pub mod remote;
pub mod traits;

pub use errors::{ClientSetupError, TransportError};
pub use remote::GatewayClient;
pub use traits::TraderGateway;

#[cfg(any(test, feature = "mock"))]
pub use traits::MockTraderGateway;
