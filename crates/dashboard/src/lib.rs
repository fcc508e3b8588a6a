pub mod actors;
pub mod console;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod state;
pub mod view;

pub use runtime::DashboardRuntime;
