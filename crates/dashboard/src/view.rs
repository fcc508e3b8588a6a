//! Plain-text rendering of dashboard snapshots for the console.

use std::fmt::Write;

use analytics::{AnalyticsReport, SignalDistribution, TargetProgress, display};
use common::models::{MAX_ACTIVE_TRADES, TraderState, TraderSummary};

use crate::state::{AnalyticsState, DashboardSnapshot};

const PROGRESS_BAR_WIDTH: usize = 20;

fn state_label(summary: &TraderSummary) -> String {
    match summary.state() {
        TraderState::Running => "RUNNING".to_string(),
        TraderState::Stopped => "STOPPED".to_string(),
        TraderState::Faulted(err) => format!("ERROR: {}", err),
    }
}

fn short_id(trader_id: &str) -> &str {
    trader_id.get(..8).unwrap_or(trader_id)
}

pub fn render_overview(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if let Some(banner) = &snapshot.banner {
        let _ = writeln!(out, "!! {}", banner);
    }

    if !snapshot.loaded {
        out.push_str("Loading traders...\n");
        return out;
    }
    if snapshot.traders.is_empty() {
        out.push_str("No traders. Use `create` to start one.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "   {:<10} {:>12} {:>9} {:>9} {:>7} {:>7}  STATE",
        "TRADER", "BALANCE", "ROE", "TARGET", "TRADES", "WIN"
    );
    for summary in &snapshot.traders {
        let marker = if snapshot.selected.as_deref() == Some(summary.trader_id.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{}  {:<10} {:>12} {:>9} {:>9} {:>3}/{:<3} {:>7}  {}",
            marker,
            short_id(&summary.trader_id),
            display::money(summary.balance),
            display::roe(summary.roe),
            display::roe(summary.target_roe),
            summary.active_trades,
            summary.total_trades,
            display::rate(summary.win_rate),
            state_label(summary),
        );
    }

    if let Some(at) = snapshot.last_refreshed {
        let _ = writeln!(out, "Last refreshed {}", at.format("%H:%M:%S UTC"));
    }
    out
}

fn render_progress(out: &mut String, progress: &TargetProgress) {
    let _ = writeln!(
        out,
        "Progress to target: {} {}{}",
        display::progress_bar(progress, PROGRESS_BAR_WIDTH),
        display::progress(progress),
        if progress.target_reached() { " (reached)" } else { "" }
    );
}

fn render_distribution(out: &mut String, distribution: &SignalDistribution) {
    let _ = writeln!(
        out,
        "Signals: {} LONG ({}) / {} SHORT ({}){}",
        distribution.long,
        display::ratio(distribution.long_ratio()),
        distribution.short,
        display::ratio(distribution.short_ratio()),
        if distribution.is_balanced() {
            ""
        } else {
            "  [imbalanced]"
        }
    );
}

fn render_report(out: &mut String, report: &AnalyticsReport) {
    if let Some(progress) = &report.progress {
        render_progress(out, progress);
    }
    if let Some(distribution) = &report.distribution {
        render_distribution(out, distribution);
    }

    let perf = &report.performance;
    let _ = writeln!(
        out,
        "Closed: {} wins / {} losses, realised {} (avg win {}, avg loss {}, profit factor {:.2})",
        report.win_loss.wins,
        report.win_loss.losses,
        display::signed_money(perf.realised_pnl),
        display::money(perf.avg_win),
        display::money(perf.avg_loss),
        perf.profit_factor,
    );

    if !report.pnl_series.is_empty() {
        let series: Vec<String> = report
            .pnl_series
            .iter()
            .map(|p| display::signed_money(p.cumulative))
            .collect();
        let _ = writeln!(out, "Cumulative P&L: {}", series.join(" "));
    }

    if !report.recent_trades.is_empty() {
        out.push_str("Recent trades (newest first):\n");
        for trade in &report.recent_trades {
            let _ = writeln!(
                out,
                "  {:<10} {:<11} {:<5} entry {:.6} x{} {:<18} pnl {}",
                short_id(&trade.id),
                trade
                    .opened_at()
                    .map(|at| at.format("%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                trade.signal.as_str(),
                trade.entry_price,
                trade.leverage,
                trade.status.as_str(),
                display::signed_money(trade.pnl),
            );
        }
    }

    if !report.recent_signals.is_empty() {
        let directions: Vec<&str> = report
            .recent_signals
            .iter()
            .map(|s| s.direction.as_str())
            .collect();
        let _ = writeln!(out, "Recent signals: {}", directions.join(" "));
    }
}

pub fn render_detail(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    let Some(summary) = snapshot.selected_summary() else {
        out.push_str("No trader selected.\n");
        return out;
    };

    let _ = writeln!(out, "Trader {} [{}]", summary.trader_id, state_label(summary));
    let _ = writeln!(
        out,
        "Balance {}  ROE {} / target {}  Drawdown {}  Win rate {}",
        display::money(summary.balance),
        display::roe(summary.roe),
        display::roe(summary.target_roe),
        display::roe(summary.drawdown),
        display::rate(summary.win_rate),
    );
    let _ = writeln!(
        out,
        "Active trades {}/{}{}  Price {:.6}  Signals generated {} ({})",
        summary.active_trades,
        MAX_ACTIVE_TRADES,
        if summary.at_trade_capacity() {
            " (at capacity)"
        } else {
            ""
        },
        summary.current_price,
        summary.signals_generated,
        summary.signal_balance,
    );

    match &snapshot.analytics {
        AnalyticsState::Ready(report) if report.trader_id == summary.trader_id => {
            render_report(&mut out, report)
        }
        AnalyticsState::Failed { trader_id, error } if *trader_id == summary.trader_id => {
            let _ = writeln!(out, "Analytics unavailable: {}", error);
        }
        _ => out.push_str("Loading analytics...\n"),
    }
    out
}
