// Run configuration
//
// Every knob of a report run lives here; nothing downstream reads the
// environment or hardcodes a path.

use std::path::PathBuf;

use chrono::{Datelike, Months, NaiveDate};

/// Name of the destination table when the caller does not pick one.
pub const DEFAULT_DESTINATION_TABLE: &str = "revenue";

/// Everything one report run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// First day of the reporting window, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the reporting window, inclusive.
    pub end_date: NaiveDate,
    /// SQLite file holding the `product` and `sales` relations.
    pub source_location: PathBuf,
    /// Table the report is written to, replaced atomically on success.
    pub destination_table: String,
}

/// First and last day of the calendar month before the one containing
/// `today`. This is the default reporting window for a scheduled run.
pub fn previous_full_month(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // Day 1 exists in every month, so with_day(1) cannot fail.
    let current_first = today.with_day(1).unwrap();
    let start = current_first - Months::new(1);
    let end = current_first.pred_opt().unwrap();
    (start, end)
}

// ============================================================================
// TESTS
// ============================================================================
