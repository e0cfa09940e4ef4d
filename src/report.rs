//! Plain-text rendering of log and rollup tables for the terminal.
//!
//! - [`recent_logs`]: newest-first table of raw log entries
//! - [`daily_table`] / [`daily_trend`]: per-day counters and a bar chart
//! - [`source_table`]: per-source totals over the reporting window
//! - [`stacked_trend`]: new vs duplicate articles per day, stacked
//!
//! Every renderer prints a short notice instead of a table when there is no
//! data, so callers never special-case empty input.

use crate::aggregate::{DailyRow, LogRow, SourceTotalRow};
use crate::models::{FETCH_ALL_SOURCE, FetchCounts};
use std::fmt::Write;

const BAR_WIDTH: u64 = 40;

fn opt(v: Option<u64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

/// The last `limit` entries, newest first.
pub fn recent_logs(table: &[LogRow], limit: usize) -> String {
    if table.is_empty() {
        return "No logs yet. Perform a fetch to generate logs.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<26} {:<22} {:<18} {:>8} {:>6} {:>10} {:>11}",
        "timestamp", "source", "category", "incoming", "added", "duplicates", "total_after"
    );
    for row in table.iter().rev().take(limit) {
        let (added, duplicates, total_after) = match row.counts {
            FetchCounts::Partial { .. } => (None, None, None),
            FetchCounts::Complete(s) => (Some(s.added), Some(s.duplicates), Some(s.total_after)),
        };
        let _ = writeln!(
            out,
            "{:<26} {:<22} {:<18} {:>8} {:>6} {:>10} {:>11}",
            row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.source,
            row.category,
            row.counts.incoming(),
            opt(added),
            opt(duplicates),
            opt(total_after)
        );
    }
    out
}

pub fn daily_table(rows: &[DailyRow]) -> String {
    if rows.is_empty() {
        return "No aggregated data yet.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>8} {:>6} {:>10} {:>11}",
        "date", "incoming", "added", "duplicates", "total_after"
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:<10} {:>8} {:>6} {:>10} {:>11}",
            r.date.to_string(),
            r.incoming,
            r.added,
            r.duplicates,
            r.total_after
        );
    }
    out
}

fn bar(value: u64, max: u64, glyph: char) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (value * BAR_WIDTH).div_ceil(max);
    std::iter::repeat_n(glyph, len as usize).collect()
}

/// One bar group per day for incoming, added and duplicates.
pub fn daily_trend(rows: &[DailyRow]) -> String {
    if rows.is_empty() {
        return "No aggregated data yet.\n".to_string();
    }
    let max = rows.iter().map(|r| r.incoming.max(r.added).max(r.duplicates)).max().unwrap_or(0);
    let mut out = String::from("Daily trend: incoming / added / duplicates\n");
    for r in rows {
        let _ = writeln!(out, "{}", r.date);
        let _ = writeln!(out, "  incoming   {:>6} {}", r.incoming, bar(r.incoming, max, '#'));
        let _ = writeln!(out, "  added      {:>6} {}", r.added, bar(r.added, max, '+'));
        let _ = writeln!(out, "  duplicates {:>6} {}", r.duplicates, bar(r.duplicates, max, '='));
    }
    out
}

/// New (`+`) stacked under duplicate (`=`) articles per day.
pub fn stacked_trend(rows: &[DailyRow]) -> String {
    if rows.is_empty() {
        return "No daily data.\n".to_string();
    }
    let max = rows.iter().map(|r| r.added + r.duplicates).max().unwrap_or(0);
    let mut out = String::from("New vs duplicate (+ added, = duplicates)\n");
    for r in rows {
        let _ = writeln!(
            out,
            "{} {}{} {}/{}",
            r.date,
            bar(r.added, max, '+'),
            bar(r.duplicates, max, '='),
            r.added,
            r.duplicates
        );
    }
    out
}

pub fn source_table(rows: &[SourceTotalRow], window_days: u32) -> String {
    if rows.is_empty() {
        return "No recent logs for per-source analytics.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "Per-source totals (last {window_days} days)");
    let _ = writeln!(
        out,
        "{:<22} {:>8} {:>6} {:>10}",
        "source", "incoming", "added", "duplicates"
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:<22} {:>8} {:>6} {:>10}",
            r.source, r.counts.incoming, r.counts.added, r.counts.duplicates
        );
    }
    if rows.iter().any(|r| r.source == FETCH_ALL_SOURCE) {
        let _ = writeln!(out, "Fetch-all runs are counted under {FETCH_ALL_SOURCE}.");
    }
    out
}
