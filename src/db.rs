// SQLite store access
//
// The source store carries the `product` and `sales` relations; the
// destination table is replaced wholesale inside one transaction. All
// numeric columns use NUMERIC affinity, so a value may come back as
// INTEGER, REAL or TEXT depending on how it was written. The newtypes
// below absorb that.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection, OpenFlags};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::PipelineError;
use crate::model::{Product, RevenueRow, SaleRecord};

// ============================================================================
// COLUMN DECODING
// ============================================================================

/// Decodes a numeric column regardless of the storage class SQLite chose.
struct SqlDecimal(Decimal);

impl FromSql for SqlDecimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(n) => Ok(SqlDecimal(Decimal::from(n))),
            ValueRef::Real(f) => Decimal::from_f64(f)
                .map(SqlDecimal)
                .ok_or_else(|| FromSqlError::Other("non-finite REAL value".into())),
            ValueRef::Text(bytes) => {
                let text =
                    std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                text.trim()
                    .parse::<Decimal>()
                    .map(SqlDecimal)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Decodes a UTC timestamp stored as TEXT in any of the shapes
/// [`parse_utc_timestamp`] accepts, or as INTEGER Unix seconds.
struct SqlUtcTimestamp(DateTime<Utc>);

impl FromSql for SqlUtcTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(bytes) => {
                let text =
                    std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                parse_utc_timestamp(text)
                    .map(SqlUtcTimestamp)
                    .ok_or_else(|| {
                        FromSqlError::Other(format!("unrecognized timestamp '{text}'").into())
                    })
            }
            ValueRef::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(SqlUtcTimestamp)
                .ok_or(FromSqlError::OutOfRange(secs)),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Decodes a calendar day stored as TEXT `YYYY-MM-DD`.
struct SqlDate(NaiveDate);

impl FromSql for SqlDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(bytes) => {
                let text =
                    std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .map(SqlDate)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Parses the timestamp shapes found in `sales.orderdate_utc`. All naive
/// shapes are taken as already being UTC; a bare date means midnight.
pub(crate) fn parse_utc_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    None
}

// ============================================================================
// OPENING
// ============================================================================

/// Opens the backing store. The CREATE flag is absent, so a missing
/// store file fails here instead of silently becoming an empty database.
pub fn open_store(path: &Path) -> Result<Connection, PipelineError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(|e| {
        PipelineError::source_access(format!("source store at {}", path.display()), e)
    })
}

// ============================================================================
// LOADING
// ============================================================================

/// Loads the whole `product` relation and checks the input contract:
/// sku_ids are unique and prices non-negative.
pub fn load_products(conn: &Connection) -> Result<Vec<Product>, PipelineError> {
    let access = |e| PipelineError::source_access("relation 'product'", e);

    let mut stmt = conn
        .prepare("SELECT sku_id, price FROM product")
        .map_err(access)?;
    let products: Vec<Product> = stmt
        .query_map([], |row| {
            Ok(Product {
                sku_id: row.get(0)?,
                price: row.get::<_, SqlDecimal>(1)?.0,
            })
        })
        .map_err(access)?
        .collect::<Result<_, _>>()
        .map_err(access)?;

    let mut seen = HashSet::with_capacity(products.len());
    for product in &products {
        if !seen.insert(product.sku_id.as_str()) {
            return Err(PipelineError::malformed(
                "product",
                format!("duplicate sku_id \"{}\"", product.sku_id),
            ));
        }
        if product.price < Decimal::ZERO {
            return Err(PipelineError::malformed(
                "product",
                format!(
                    "negative price {} for sku_id \"{}\"",
                    product.price, product.sku_id
                ),
            ));
        }
    }

    debug!(count = products.len(), "loaded product relation");
    Ok(products)
}

/// Loads the whole `sales` relation. Quantities must be non-negative;
/// sku_ids referencing no product are allowed here and ignored later.
pub fn load_sales(conn: &Connection) -> Result<Vec<SaleRecord>, PipelineError> {
    let access = |e| PipelineError::source_access("relation 'sales'", e);

    let mut stmt = conn
        .prepare("SELECT sku_id, orderdate_utc, sales FROM sales")
        .map_err(access)?;
    let records: Vec<SaleRecord> = stmt
        .query_map([], |row| {
            Ok(SaleRecord {
                sku_id: row.get(0)?,
                ordered_at: row.get::<_, SqlUtcTimestamp>(1)?.0,
                quantity: row.get::<_, SqlDecimal>(2)?.0,
            })
        })
        .map_err(access)?
        .collect::<Result<_, _>>()
        .map_err(access)?;

    for record in &records {
        if record.quantity < Decimal::ZERO {
            return Err(PipelineError::malformed(
                "sales",
                format!(
                    "negative quantity {} for sku_id \"{}\"",
                    record.quantity, record.sku_id
                ),
            ));
        }
    }

    debug!(count = records.len(), "loaded sales relation");
    Ok(records)
}

// ============================================================================
// WRITING
// ============================================================================

/// Replaces the destination table with `rows` in a single transaction.
///
/// Drop, create and all inserts either commit together or roll back
/// together, so readers only ever see the previous report or the new one.
pub fn replace_revenue(
    conn: &mut Connection,
    table: &str,
    rows: &[RevenueRow],
) -> Result<(), PipelineError> {
    let persist = |e| PipelineError::persistence(table, e);
    let ident = quote_ident(table);

    let tx = conn.transaction().map_err(persist)?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {ident};
         CREATE TABLE {ident} (
             sku_id  TEXT    NOT NULL,
             date_id DATE    NOT NULL,
             price   NUMERIC NOT NULL,
             sales   NUMERIC NOT NULL CHECK (sales >= 0),
             revenue NUMERIC NOT NULL CHECK (revenue >= 0),
             PRIMARY KEY (sku_id, date_id)
         );"
    ))
    .map_err(persist)?;

    {
        let mut insert = tx
            .prepare(&format!(
                "INSERT INTO {ident} (sku_id, date_id, price, sales, revenue)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))
            .map_err(persist)?;
        for row in rows {
            insert
                .execute(params![
                    row.sku_id,
                    row.date_id.to_string(),
                    sql_number(row.price),
                    sql_number(row.sales),
                    sql_number(row.revenue),
                ])
                .map_err(persist)?;
        }
    }

    tx.commit().map_err(persist)?;
    Ok(())
}

/// Reads a destination table back, ordered by sku and day. `limit` caps
/// the row count for previews.
pub fn read_revenue(
    conn: &Connection,
    table: &str,
    limit: Option<usize>,
) -> Result<Vec<RevenueRow>, PipelineError> {
    let access = |e| PipelineError::source_access(format!("table '{table}'"), e);

    let mut sql = format!(
        "SELECT sku_id, date_id, price, sales, revenue FROM {} \
         ORDER BY sku_id ASC, date_id ASC",
        quote_ident(table)
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql).map_err(access)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RevenueRow {
                sku_id: row.get(0)?,
                date_id: row.get::<_, SqlDate>(1)?.0,
                price: row.get::<_, SqlDecimal>(2)?.0,
                sales: row.get::<_, SqlDecimal>(3)?.0,
                revenue: row.get::<_, SqlDecimal>(4)?.0,
            })
        })
        .map_err(access)?
        .collect::<Result<_, _>>()
        .map_err(access)?;
    Ok(rows)
}

/// Double-quotes an identifier so arbitrary table names are safe to
/// splice into DDL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Binds a `Decimal` as REAL. `to_f64` on a `Decimal` is total; the
/// `Option` is a `ToPrimitive` artifact.
pub(crate) fn sql_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================
