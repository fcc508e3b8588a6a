//! Derived views over a trader's raw trade and signal history.
//!
//! Every function here is pure: results are rebuilt from the full input on each call and
//! nothing is carried between calls, so the same history always yields the same output.

pub mod display;
pub mod pnl;
pub mod progress;
pub mod report;
pub mod signals;

pub use pnl::{PerformanceStats, PnlPoint, WinLoss, cumulative_pnl, performance_stats, win_loss};
pub use progress::TargetProgress;
pub use report::{AnalyticsReport, RECENT_WINDOW};
pub use signals::{SignalDistribution, recent_signals, recent_trades};
