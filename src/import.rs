// CSV seeding for the source store
//
// Operational helper for standing up a store from flat files. The report
// pipeline itself only reads stores someone already populated.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::db::{parse_utc_timestamp, sql_number};
use crate::model::{Product, SaleRecord};

/// Shape of one `sales.csv` record. The quantity column keeps its
/// storage name `sales`.
#[derive(Debug, Deserialize)]
struct SalesCsvRow {
    sku_id: String,
    orderdate_utc: String,
    #[serde(rename = "sales")]
    quantity: Decimal,
}

/// Reads `product.csv`: a header line, then `sku_id,price` records.
pub fn read_product_csv<R: Read>(input: R) -> Result<Vec<Product>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut products = Vec::new();
    for (index, record) in reader.deserialize::<Product>().enumerate() {
        let product = record.with_context(|| format!("product.csv record {}", index + 1))?;
        products.push(product);
    }
    Ok(products)
}

/// Reads `sales.csv`: a header line, then `sku_id,orderdate_utc,sales`
/// records with timestamps in any shape the store loader accepts.
pub fn read_sales_csv<R: Read>(input: R) -> Result<Vec<SaleRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut records = Vec::new();
    for (index, record) in reader.deserialize::<SalesCsvRow>().enumerate() {
        let row: SalesCsvRow = record.with_context(|| format!("sales.csv record {}", index + 1))?;
        let ordered_at = parse_utc_timestamp(&row.orderdate_utc).with_context(|| {
            format!(
                "sales.csv record {}: unrecognized timestamp '{}'",
                index + 1,
                row.orderdate_utc
            )
        })?;
        records.push(SaleRecord {
            sku_id: row.sku_id,
            ordered_at,
            quantity: row.quantity,
        });
    }
    Ok(records)
}

/// Creates the `product` and `sales` relations and fills them, all in
/// one transaction. Fails if either relation already exists.
pub fn seed_store(
    conn: &mut Connection,
    products: &[Product],
    sales: &[SaleRecord],
) -> Result<()> {
    let tx = conn
        .transaction()
        .context("cannot begin seeding transaction")?;
    tx.execute_batch(
        "CREATE TABLE product (
             sku_id TEXT PRIMARY KEY,
             price  NUMERIC NOT NULL CHECK (price >= 0)
         );
         CREATE TABLE sales (
             sku_id        TEXT      NOT NULL,
             orderdate_utc TIMESTAMP NOT NULL,
             sales         NUMERIC   NOT NULL CHECK (sales >= 0)
         );",
    )
    .context("cannot create source relations")?;

    {
        let mut insert = tx
            .prepare("INSERT INTO product (sku_id, price) VALUES (?1, ?2)")
            .context("cannot prepare product insert")?;
        for product in products {
            insert
                .execute(params![product.sku_id, sql_number(product.price)])
                .with_context(|| format!("cannot insert product \"{}\"", product.sku_id))?;
        }

        let mut insert = tx
            .prepare("INSERT INTO sales (sku_id, orderdate_utc, sales) VALUES (?1, ?2, ?3)")
            .context("cannot prepare sales insert")?;
        for sale in sales {
            insert
                .execute(params![
                    sale.sku_id,
                    sale.ordered_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    sql_number(sale.quantity),
                ])
                .with_context(|| format!("cannot insert sale for \"{}\"", sale.sku_id))?;
        }
    }

    tx.commit().context("cannot commit seeded store")?;
    info!(
        products = products.len(),
        sales = sales.len(),
        "seeded source store"
    );
    Ok(())
}

/// Imports both CSV files into a fresh store file at `db_path`.
pub fn import_store(db_path: &Path, product_csv: &Path, sales_csv: &Path) -> Result<()> {
    let products = read_product_csv(
        File::open(product_csv)
            .with_context(|| format!("cannot open {}", product_csv.display()))?,
    )?;
    let sales = read_sales_csv(
        File::open(sales_csv)
            .with_context(|| format!("cannot open {}", sales_csv.display()))?,
    )?;

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("cannot create store at {}", db_path.display()))?;
    seed_store(&mut conn, &products, &sales)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{load_products, load_sales};
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;

    const PRODUCT_CSV: &str = "sku_id,price\nSKU-1,2.50\nSKU-2,10\n";
    const SALES_CSV: &str =
        "sku_id,orderdate_utc,sales\nSKU-1,2025-01-03 09:15:00,2\nSKU-1,2025-01-03T18:30:00Z,3\n";

    #[test]
    fn test_product_csv_parses() {
        let products = read_product_csv(PRODUCT_CSV.as_bytes()).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].sku_id, "SKU-1");
        assert_eq!(products[0].price, dec!(2.50));
        assert_eq!(products[1].price, dec!(10));
    }

    #[test]
    fn test_sales_csv_parses_mixed_timestamp_shapes() {
        let records = read_sales_csv(SALES_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].quantity, dec!(2));
        assert_eq!(
            records[0].ordered_at,
            "2025-01-03T09:15:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            records[1].ordered_at,
            "2025-01-03T18:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_sales_csv_rejects_garbage_timestamps() {
        let csv = "sku_id,orderdate_utc,sales\nSKU-1,soon,1\n";
        let err = read_sales_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_sales_csv_rejects_missing_columns() {
        let csv = "sku_id,orderdate_utc\nSKU-1,2025-01-03\n";
        assert!(read_sales_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_seeded_store_loads_back() {
        let products = read_product_csv(PRODUCT_CSV.as_bytes()).unwrap();
        let sales = read_sales_csv(SALES_CSV.as_bytes()).unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        seed_store(&mut conn, &products, &sales).unwrap();

        let loaded = load_products(&conn).unwrap();
        assert_eq!(loaded, products);

        let loaded = load_sales(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].ordered_at, sales[0].ordered_at);
        assert_eq!(loaded[1].quantity, dec!(3));
    }

    #[test]
    fn test_seeding_a_duplicate_sku_fails() {
        let products = vec![
            Product {
                sku_id: "A".into(),
                price: dec!(1),
            },
            Product {
                sku_id: "A".into(),
                price: dec!(2),
            },
        ];
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(seed_store(&mut conn, &products, &[]).is_err());
    }

    #[test]
    fn test_seeding_negative_prices_fails() {
        let products = vec![Product {
            sku_id: "A".into(),
            price: dec!(-1),
        }];
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(seed_store(&mut conn, &products, &[]).is_err());
    }
}
