pub mod analytics_service;
pub mod mutation_coordinator;
pub mod registry_poller;
pub mod registry_sync;

pub use analytics_service::{AnalyticsAggregator, RefreshOutcome};
pub use mutation_coordinator::MutationCoordinator;
pub use registry_poller::RegistryPoller;
pub use registry_sync::{CycleOutcome, RegistrySync};
