// The report pipeline
//
// generate -> load -> aggregate -> assemble -> write, in that order.
// The destination write is the only mutation; a failure in any stage
// leaves the destination as it was.

use rusqlite::Connection;
use tracing::info;

use crate::aggregate::aggregate_sales;
use crate::assemble::assemble_revenue;
use crate::config::ReportConfig;
use crate::dates::DateRange;
use crate::db;
use crate::error::PipelineError;

/// What one successful run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub products: usize,
    pub days: usize,
    pub rows_written: usize,
}

/// Runs the whole report against the store named in `config`.
pub fn run(config: &ReportConfig) -> Result<RunSummary, PipelineError> {
    // Window validation comes first so a bad range never opens the store.
    let window = DateRange::new(config.start_date, config.end_date)?;
    let mut conn = db::open_store(&config.source_location)?;
    run_stages(&mut conn, config, window)
}

/// Same pipeline against an already open connection, so callers and
/// tests can run everything against an in-memory store.
pub fn run_with_store(
    conn: &mut Connection,
    config: &ReportConfig,
) -> Result<RunSummary, PipelineError> {
    let window = DateRange::new(config.start_date, config.end_date)?;
    run_stages(conn, config, window)
}

fn run_stages(
    conn: &mut Connection,
    config: &ReportConfig,
    window: DateRange,
) -> Result<RunSummary, PipelineError> {
    info!(
        start = %window.start(),
        end = %window.end(),
        days = window.days(),
        "generated reporting window"
    );

    let products = db::load_products(conn)?;
    let sales = db::load_sales(conn)?;
    info!(
        products = products.len(),
        sales = sales.len(),
        "loaded source relations"
    );

    let daily = aggregate_sales(sales, &window);
    info!(cells = daily.len(), "aggregated sales by sku and day");

    let rows = assemble_revenue(&products, &window, &daily);
    info!(rows = rows.len(), "assembled revenue table");

    db::replace_revenue(conn, &config.destination_table, &rows)?;
    info!(
        table = %config.destination_table,
        rows = rows.len(),
        "replaced destination table"
    );

    Ok(RunSummary {
        products: products.len(),
        days: window.days(),
        rows_written: rows.len(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
