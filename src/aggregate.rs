//! Daily and per-source rollups over the fetch log.
//!
//! Only complete log entries (those carrying `added`, `duplicates` and
//! `total_after`) are aggregated. Per-item entries of a fetch-all run are
//! covered by the run's summary entry; counting both would double the
//! incoming total.
//!
//! Every function returns an empty result for an empty table.

use crate::models::{FetchCounts, LogEntry, MergeStats, SourceCounts};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// A log entry with its calendar date resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub date: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub category: String,
    pub counts: FetchCounts,
}

impl LogRow {
    fn stats(&self) -> Option<&MergeStats> {
        self.counts.complete()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub incoming: u64,
    pub added: u64,
    pub duplicates: u64,
    /// Store size after the last complete fetch of the day.
    pub total_after: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDayRow {
    pub source: String,
    pub date: NaiveDate,
    pub counts: SourceCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTotalRow {
    pub source: String,
    pub counts: SourceCounts,
}

/// Tabulate log entries, deriving each one's local calendar date.
pub fn to_table(entries: Vec<LogEntry>) -> Vec<LogRow> {
    entries
        .into_iter()
        .map(|e| LogRow {
            date: e.date(),
            timestamp: e.timestamp,
            source: e.source,
            category: e.category,
            counts: e.counts,
        })
        .collect()
}

/// Sum counters per date; `total_after` is the last value seen that day.
pub fn daily_rollup(table: &[LogRow]) -> Vec<DailyRow> {
    let mut by_date: BTreeMap<NaiveDate, DailyRow> = BTreeMap::new();
    for row in table {
        let Some(stats) = row.stats() else { continue };
        let day = by_date.entry(row.date).or_insert(DailyRow {
            date: row.date,
            incoming: 0,
            added: 0,
            duplicates: 0,
            total_after: 0,
        });
        day.incoming += stats.incoming;
        day.added += stats.added;
        day.duplicates += stats.duplicates;
        day.total_after = stats.total_after;
    }
    by_date.into_values().collect()
}

/// First instant counted by a window of `window_days` ending `today`.
pub fn window_start(today: NaiveDate, window_days: u32) -> NaiveDateTime {
    (today - Duration::days(i64::from(window_days))).and_time(chrono::NaiveTime::MIN)
}

/// Sum counters per (source, date) over the last `window_days` days.
pub fn per_source_rollup(table: &[LogRow], window_days: u32, today: NaiveDate) -> Vec<SourceDayRow> {
    let cutoff = window_start(today, window_days);
    let mut groups: BTreeMap<(String, NaiveDate), SourceCounts> = BTreeMap::new();
    for row in table.iter().filter(|r| r.timestamp >= cutoff) {
        let Some(stats) = row.stats() else { continue };
        groups
            .entry((row.source.clone(), row.date))
            .or_default()
            .add(stats);
    }
    groups
        .into_iter()
        .map(|((source, date), counts)| SourceDayRow { source, date, counts })
        .collect()
}

/// Sum counters per source over the window, busiest source first.
pub fn per_source_totals(table: &[LogRow], window_days: u32, today: NaiveDate) -> Vec<SourceTotalRow> {
    let mut totals: BTreeMap<String, SourceCounts> = BTreeMap::new();
    for row in per_source_rollup(table, window_days, today) {
        let t = totals.entry(row.source).or_default();
        t.incoming += row.counts.incoming;
        t.added += row.counts.added;
        t.duplicates += row.counts.duplicates;
    }
    let mut rows: Vec<SourceTotalRow> = totals
        .into_iter()
        .map(|(source, counts)| SourceTotalRow { source, counts })
        .collect();
    // BTreeMap order keeps ties alphabetical under a stable sort.
    rows.sort_by(|a, b| b.counts.incoming.cmp(&a.counts.incoming));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FETCH_ALL_SOURCE;

    fn ts(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn complete(at: &str, source: &str, incoming: u64, added: u64, duplicates: u64, total_after: u64) -> LogEntry {
        LogEntry::complete(
            ts(at),
            source,
            "all",
            MergeStats { incoming, added, duplicates, total_after },
        )
    }

    #[test]
    fn test_to_table_derives_date() {
        let table = to_table(vec![complete("2025-05-06T23:59:59", "x", 1, 1, 0, 1)]);
        assert_eq!(table[0].date, day("2025-05-06"));
    }

    #[test]
    fn test_daily_rollup_sums_and_keeps_last_total() {
        let table = to_table(vec![
            complete("2025-05-06T08:00:00", "A", 5, 3, 2, 40),
            complete("2025-05-06T14:00:00", "B", 2, 2, 0, 42),
        ]);
        let rows = daily_rollup(&table);
        assert_eq!(
            rows,
            vec![DailyRow {
                date: day("2025-05-06"),
                incoming: 7,
                added: 5,
                duplicates: 2,
                total_after: 42,
            }]
        );
    }

    #[test]
    fn test_daily_rollup_orders_dates_and_skips_partial() {
        let table = to_table(vec![
            complete("2025-05-07T08:00:00", "A", 1, 1, 0, 11),
            LogEntry::partial(ts("2025-05-06T09:00:00"), "Vice", "all", 50),
            complete("2025-05-06T10:00:00", "A", 4, 4, 0, 10),
        ]);
        let rows = daily_rollup(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day("2025-05-06"));
        assert_eq!(rows[0].incoming, 4);
        assert_eq!(rows[1].total_after, 11);
    }

    #[test]
    fn test_rollups_empty() {
        assert!(daily_rollup(&[]).is_empty());
        assert!(per_source_rollup(&[], 14, day("2025-05-06")).is_empty());
        assert!(per_source_totals(&[], 14, day("2025-05-06")).is_empty());
    }

    #[test]
    fn test_per_source_rollup_window() {
        let table = to_table(vec![
            complete("2025-04-21T23:00:00", "A", 9, 9, 0, 9),
            complete("2025-04-22T00:00:00", "A", 1, 1, 0, 10),
            complete("2025-05-06T08:00:00", "A", 2, 1, 1, 11),
            complete("2025-05-06T09:00:00", "A", 3, 0, 3, 11),
            complete("2025-05-06T09:00:00", "B", 1, 1, 0, 12),
        ]);
        let rows = per_source_rollup(&table, 14, day("2025-05-06"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].source, "A");
        assert_eq!(rows[0].date, day("2025-04-22"));
        assert_eq!(rows[1].counts, SourceCounts { incoming: 5, added: 1, duplicates: 4 });
        assert_eq!(rows[2].source, "B");
    }

    #[test]
    fn test_per_source_rollup_counts_fetch_all_as_one_source() {
        let table = to_table(vec![
            LogEntry::partial(ts("2025-05-06T08:00:00"), "CNN News", "nasional", 2),
            LogEntry::partial(ts("2025-05-06T08:00:01"), "Vice", "all", 3),
            complete("2025-05-06T08:00:02", FETCH_ALL_SOURCE, 5, 4, 1, 4),
        ]);
        let rows = per_source_rollup(&table, 14, day("2025-05-06"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, FETCH_ALL_SOURCE);
        assert_eq!(rows[0].counts, SourceCounts { incoming: 5, added: 4, duplicates: 1 });
    }

    #[test]
    fn test_per_source_totals_sorted_by_incoming() {
        let table = to_table(vec![
            complete("2025-05-05T08:00:00", "Small", 1, 1, 0, 1),
            complete("2025-05-05T08:00:00", "Big", 10, 8, 2, 9),
            complete("2025-05-06T08:00:00", "Big", 5, 0, 5, 9),
        ]);
        let rows = per_source_totals(&table, 14, day("2025-05-06"));
        assert_eq!(rows[0].source, "Big");
        assert_eq!(rows[0].counts, SourceCounts { incoming: 15, added: 8, duplicates: 7 });
        assert_eq!(rows[1].source, "Small");
    }
}
