pub mod supervisor;

pub use common::actors::{Actor, ActorType, ControlMessage, HEARTBEAT_PERIOD};
pub use supervisor::{ActorFactory, Supervisor};
