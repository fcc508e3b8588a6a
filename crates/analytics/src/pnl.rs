use common::models::{Trade, TradeStatus};
use serde::Serialize;
use tracing::debug;

/// One step of the running realised P&L, in the order the backend returned the trades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PnlPoint {
    /// 1-based position among closed trades.
    pub index: usize,
    pub pnl: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WinLoss {
    pub wins: usize,
    pub losses: usize,
}

impl WinLoss {
    pub fn closed(&self) -> usize {
        self.wins + self.losses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerformanceStats {
    pub realised_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// `|avg_win / avg_loss|`, or 0 when there is no losing trade to divide by.
    pub profit_factor: f64,
}

fn closed(trades: &[Trade]) -> impl Iterator<Item = &Trade> {
    trades.iter().filter(|trade| {
        if !trade.is_closed() && !matches!(trade.status, TradeStatus::Open) {
            debug!(
                "Trade {} has unrecognized status {:?}; treating it as open",
                trade.id,
                trade.status.as_str()
            );
        }
        trade.is_closed()
    })
}

pub fn cumulative_pnl(trades: &[Trade]) -> Vec<PnlPoint> {
    let mut running = 0.0;
    closed(trades)
        .enumerate()
        .map(|(i, trade)| {
            running += trade.pnl;
            PnlPoint {
                index: i + 1,
                pnl: trade.pnl,
                cumulative: running,
            }
        })
        .collect()
}

/// A closed trade wins only with strictly positive P&L; break-even counts as a loss.
pub fn win_loss(trades: &[Trade]) -> WinLoss {
    closed(trades).fold(WinLoss::default(), |mut tally, trade| {
        if trade.pnl > 0.0 {
            tally.wins += 1;
        } else {
            tally.losses += 1;
        }
        tally
    })
}

pub fn performance_stats(trades: &[Trade]) -> PerformanceStats {
    let (mut win_sum, mut wins, mut loss_sum, mut losses) = (0.0, 0usize, 0.0, 0usize);
    for trade in closed(trades) {
        if trade.pnl > 0.0 {
            win_sum += trade.pnl;
            wins += 1;
        } else {
            loss_sum += trade.pnl;
            losses += 1;
        }
    }

    let avg_win = if wins > 0 { win_sum / wins as f64 } else { 0.0 };
    let avg_loss = if losses > 0 { loss_sum / losses as f64 } else { 0.0 };
    let profit_factor = if avg_loss != 0.0 {
        (avg_win / avg_loss).abs()
    } else {
        0.0
    };

    PerformanceStats {
        realised_pnl: win_sum + loss_sum,
        avg_win,
        avg_loss,
        profit_factor,
    }
}
