// Aggregation of sale events into daily totals per sku

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::dates::DateRange;
use crate::model::SaleRecord;

/// Total quantity sold per (sku_id, calendar day).
pub type DailySales = HashMap<(String, NaiveDate), Decimal>;

/// Sums sale quantities by sku and calendar day.
///
/// Each event is bucketed by the UTC calendar day of its timestamp; events
/// outside the reporting window are dropped. Skus that never sold inside
/// the window simply have no entry; the assembly stage fills those cells
/// with zero.
pub fn aggregate_sales(records: Vec<SaleRecord>, window: &DateRange) -> DailySales {
    let mut totals = DailySales::new();
    for record in records {
        let date = record.ordered_at.date_naive();
        if !window.contains(date) {
            continue;
        }
        *totals
            .entry((record.sku_id, date))
            .or_insert(Decimal::ZERO) += record.quantity;
    }
    totals
}

// ============================================================================
// TESTS
// ============================================================================
