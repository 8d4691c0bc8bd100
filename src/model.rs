// Row types shared by every pipeline stage

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One row of the `product` relation: a sellable item and its unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku_id: String,
    pub price: Decimal,
}

/// One row of the `sales` relation: a single sale event.
///
/// The storage column holding the quantity is historically named `sales`;
/// in memory it is `quantity` to keep it apart from the daily totals the
/// aggregation stage produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleRecord {
    pub sku_id: String,
    pub ordered_at: DateTime<Utc>,
    pub quantity: Decimal,
}

/// One row of the destination `revenue` table: a (sku, day) cell of the
/// report with its price, total quantity sold and rounded revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueRow {
    pub sku_id: String,
    pub date_id: NaiveDate,
    pub price: Decimal,
    pub sales: Decimal,
    pub revenue: Decimal,
}

/// Rounds a monetary amount to 2 decimal places, halves away from zero.
///
/// This is the rounding SQL `ROUND()` applies, not the banker's rounding
/// `Decimal` defaults to: `1.005` rounds to `1.01`, never `1.00`.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_goes_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_round_money_non_midpoints_round_nearest() {
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.346)), dec!(2.35));
        assert_eq!(round_money(dec!(0.004)), dec!(0.00));
    }

    #[test]
    fn test_round_money_is_stable_on_already_rounded_amounts() {
        assert_eq!(round_money(dec!(12.50)), dec!(12.50));
        assert_eq!(round_money(dec!(0)), dec!(0));
    }
}
