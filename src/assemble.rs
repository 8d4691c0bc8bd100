// Assembly of the dense revenue table
//
// The report covers every (sku, day) pair in the window, sold or not.
// Cells with no aggregated sales carry a zero quantity.

use rust_decimal::Decimal;

use crate::aggregate::DailySales;
use crate::dates::DateRange;
use crate::model::{round_money, Product, RevenueRow};

/// Builds one [`RevenueRow`] per (product, day) pair in the window.
///
/// Rows come out sorted by sku_id, then date, so the output order is
/// deterministic regardless of product input order or map iteration
/// order. Revenue is `price * quantity` rounded to cents.
pub fn assemble_revenue(
    products: &[Product],
    dates: &DateRange,
    daily: &DailySales,
) -> Vec<RevenueRow> {
    let mut ordered: Vec<&Product> = products.iter().collect();
    ordered.sort_by(|a, b| a.sku_id.cmp(&b.sku_id));

    let mut rows = Vec::with_capacity(ordered.len() * dates.days());
    for product in ordered {
        for date_id in dates {
            let sales = daily
                .get(&(product.sku_id.clone(), date_id))
                .copied()
                .unwrap_or(Decimal::ZERO);
            rows.push(RevenueRow {
                sku_id: product.sku_id.clone(),
                date_id,
                price: product.price,
                sales,
                revenue: round_money(product.price * sales),
            });
        }
    }
    rows
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_sales;
    use crate::model::SaleRecord;
    use chrono::{DateTime, NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(text: &str) -> DateTime<Utc> {
        text.parse().unwrap()
    }

    fn product(sku: &str, price: Decimal) -> Product {
        Product {
            sku_id: sku.to_string(),
            price,
        }
    }

    fn sale(sku: &str, ordered_at: &str, quantity: Decimal) -> SaleRecord {
        SaleRecord {
            sku_id: sku.to_string(),
            ordered_at: at(ordered_at),
            quantity,
        }
    }

    #[test]
    fn test_one_row_per_product_day_pair() {
        let products = vec![
            product("A", dec!(1.00)),
            product("B", dec!(2.00)),
            product("C", dec!(3.00)),
        ];
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 31)).unwrap();
        let rows = assemble_revenue(&products, &dates, &DailySales::new());

        assert_eq!(rows.len(), 3 * 31);
        let mut keys: Vec<(String, NaiveDate)> = rows
            .iter()
            .map(|r| (r.sku_id.clone(), r.date_id))
            .collect();
        keys.dedup();
        assert_eq!(keys.len(), 3 * 31);
    }

    #[test]
    fn test_rows_sort_by_sku_then_date() {
        // Products arrive unsorted; output order must not care.
        let products = vec![product("B", dec!(2.00)), product("A", dec!(1.00))];
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 2)).unwrap();
        let rows = assemble_revenue(&products, &dates, &DailySales::new());

        let keys: Vec<(String, NaiveDate)> = rows
            .iter()
            .map(|r| (r.sku_id.clone(), r.date_id))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A".to_string(), day(2025, 1, 1)),
                ("A".to_string(), day(2025, 1, 2)),
                ("B".to_string(), day(2025, 1, 1)),
                ("B".to_string(), day(2025, 1, 2)),
            ]
        );
    }

    #[test]
    fn test_unsold_days_fill_with_zero() {
        let products = vec![product("A", dec!(4.00))];
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 3)).unwrap();
        let records = vec![sale("A", "2025-01-02T12:00:00Z", dec!(2))];
        let daily = aggregate_sales(records, &dates);

        let rows = assemble_revenue(&products, &dates, &daily);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].sales, dec!(0));
        assert_eq!(rows[0].revenue, dec!(0));
        assert_eq!(rows[1].sales, dec!(2));
        assert_eq!(rows[1].revenue, dec!(8.00));
        assert_eq!(rows[2].sales, dec!(0));
        assert_eq!(rows[2].revenue, dec!(0));
    }

    #[test]
    fn test_same_day_sales_accumulate_into_one_cell() {
        let products = vec![product("A", dec!(2.50))];
        let dates = DateRange::new(day(2025, 1, 3), day(2025, 1, 3)).unwrap();
        let records = vec![
            sale("A", "2025-01-03T09:00:00Z", dec!(2)),
            sale("A", "2025-01-03T18:30:00Z", dec!(3)),
        ];
        let daily = aggregate_sales(records, &dates);

        let rows = assemble_revenue(&products, &dates, &daily);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sales, dec!(5));
        assert_eq!(rows[0].revenue, dec!(12.50));
    }

    #[test]
    fn test_product_without_any_sales_is_still_reported() {
        let products = vec![product("A", dec!(1.00)), product("B", dec!(9.99))];
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 2)).unwrap();
        let records = vec![sale("A", "2025-01-01T10:00:00Z", dec!(1))];
        let daily = aggregate_sales(records, &dates);

        let rows = assemble_revenue(&products, &dates, &daily);
        let b_rows: Vec<&RevenueRow> = rows.iter().filter(|r| r.sku_id == "B").collect();
        assert_eq!(b_rows.len(), 2);
        assert!(b_rows.iter().all(|r| r.sales == dec!(0)));
        assert!(b_rows.iter().all(|r| r.revenue == dec!(0)));
        assert!(b_rows.iter().all(|r| r.price == dec!(9.99)));
    }

    #[test]
    fn test_revenue_rounds_half_away_from_zero() {
        let products = vec![product("A", dec!(1.005))];
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 1)).unwrap();
        let mut daily = DailySales::new();
        daily.insert(("A".to_string(), day(2025, 1, 1)), dec!(1));

        let rows = assemble_revenue(&products, &dates, &daily);
        assert_eq!(rows[0].revenue, dec!(1.01));
        // Price itself is carried through unrounded.
        assert_eq!(rows[0].price, dec!(1.005));
    }

    #[test]
    fn test_no_products_means_no_rows() {
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 31)).unwrap();
        let rows = assemble_revenue(&[], &dates, &DailySales::new());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_totals_for_unknown_skus_are_ignored() {
        // Can happen when a sale references a sku missing from `product`.
        let products = vec![product("A", dec!(1.00))];
        let dates = DateRange::new(day(2025, 1, 1), day(2025, 1, 1)).unwrap();
        let mut daily = DailySales::new();
        daily.insert(("GHOST".to_string(), day(2025, 1, 1)), dec!(99));

        let rows = assemble_revenue(&products, &dates, &daily);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku_id, "A");
        assert_eq!(rows[0].sales, dec!(0));
    }
}
