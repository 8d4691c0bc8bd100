// Daily Revenue Report - Core Library
// Exposes the pipeline stages for use in the CLI and tests

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod import;
pub mod model;
pub mod pipeline;

// Re-export commonly used types
pub use aggregate::{aggregate_sales, DailySales};
pub use assemble::assemble_revenue;
pub use config::{previous_full_month, ReportConfig, DEFAULT_DESTINATION_TABLE};
pub use dates::{DateRange, DateRangeIter};
pub use db::{load_products, load_sales, open_store, read_revenue, replace_revenue};
pub use error::PipelineError;
pub use import::{import_store, read_product_csv, read_sales_csv, seed_store};
pub use model::{round_money, Product, RevenueRow, SaleRecord};
pub use pipeline::{run, run_with_store, RunSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
