//! Fixed-precision text for the values the dashboard shows.
//!
//! Currency and ROE use two decimals, rates (win rate, progress, ratios) use one.

use crate::progress::TargetProgress;

pub fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

pub fn signed_money(value: f64) -> String {
    if value < 0.0 {
        format!("-{:.2}", value.abs())
    } else {
        format!("+{:.2}", value)
    }
}

pub fn roe(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn rate(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Rate given as a fraction in `[0, 1]`.
pub fn ratio(value: f64) -> String {
    rate(value * 100.0)
}

pub fn progress(progress: &TargetProgress) -> String {
    match progress.raw_finite() {
        Some(raw) => rate(raw),
        None => "n/a".to_string(),
    }
}

/// Text bar for the clamped progress, `width` cells wide.
pub fn progress_bar(progress: &TargetProgress, width: usize) -> String {
    let filled = ((progress.clamped / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}
