// Command line entry point for the revenue report pipeline

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use revenue_report::{
    import_store, open_store, previous_full_month, read_revenue, run, ReportConfig, RevenueRow,
    DEFAULT_DESTINATION_TABLE,
};

#[derive(Parser)]
#[command(
    name = "revenue-report",
    version,
    about = "Daily revenue report over a product/sales store"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the report and replace the destination table
    Run(RunArgs),
    /// Seed a new source store from product and sales CSV files
    Import(ImportArgs),
    /// Print rows of a previously written report
    Show(ShowArgs),
}

#[derive(Args)]
struct RunArgs {
    /// SQLite file with the product and sales relations
    #[arg(long)]
    source: PathBuf,

    /// First day of the window; defaults to the previous full month
    #[arg(long, requires = "end_date")]
    start_date: Option<NaiveDate>,

    /// Last day of the window; defaults to the previous full month
    #[arg(long, requires = "start_date")]
    end_date: Option<NaiveDate>,

    /// Destination table to replace
    #[arg(long, default_value = DEFAULT_DESTINATION_TABLE)]
    destination_table: String,

    /// Rows of the finished report to print
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

#[derive(Args)]
struct ImportArgs {
    /// Store file to create
    #[arg(long)]
    db: PathBuf,

    /// CSV with sku_id,price records
    #[arg(long)]
    products: PathBuf,

    /// CSV with sku_id,orderdate_utc,sales records
    #[arg(long)]
    sales: PathBuf,
}

#[derive(Args)]
struct ShowArgs {
    /// SQLite file holding the report
    #[arg(long)]
    source: PathBuf,

    /// Table to read
    #[arg(long, default_value = DEFAULT_DESTINATION_TABLE)]
    table: String,

    /// Print at most this many rows
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Import(args) => handle_import(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let (start_date, end_date) = match (args.start_date, args.end_date) {
        (Some(start), Some(end)) => (start, end),
        // clap enforces the pairing, so anything else means neither.
        _ => previous_full_month(Utc::now().date_naive()),
    };

    let config = ReportConfig {
        start_date,
        end_date,
        source_location: args.source,
        destination_table: args.destination_table,
    };

    let summary = match run(&config) {
        Ok(summary) => summary,
        Err(e) => {
            let phase = e.phase();
            let report = anyhow::Error::new(e);
            error!(phase, "revenue report failed: {report:#}");
            process::exit(1);
        }
    };

    println!(
        "wrote {} rows ({} products x {} days) to '{}' in {}",
        summary.rows_written,
        summary.products,
        summary.days,
        config.destination_table,
        config.source_location.display()
    );

    if args.preview > 0 && summary.rows_written > 0 {
        let conn = open_store(&config.source_location)?;
        let rows = read_revenue(&conn, &config.destination_table, Some(args.preview))?;
        print_rows(&rows);
    }
    Ok(())
}

fn handle_import(args: ImportArgs) -> Result<()> {
    import_store(&args.db, &args.products, &args.sales)
        .with_context(|| format!("import into {} failed", args.db.display()))?;
    println!("imported store at {}", args.db.display());
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<()> {
    let conn = open_store(&args.source)?;
    let rows = read_revenue(&conn, &args.table, args.limit)?;
    if rows.is_empty() {
        println!("table '{}' is empty", args.table);
    } else {
        print_rows(&rows);
    }
    Ok(())
}

fn print_rows(rows: &[RevenueRow]) {
    println!(
        "{:<12} {:<10} {:>10} {:>10} {:>12}",
        "sku_id", "date_id", "price", "sales", "revenue"
    );
    for row in rows {
        println!(
            "{:<12} {:<10} {:>10} {:>10} {:>12}",
            row.sku_id,
            row.date_id.to_string(),
            row.price.to_string(),
            row.sales.to_string(),
            row.revenue.to_string()
        );
    }
}
