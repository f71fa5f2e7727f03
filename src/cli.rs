//! Command-line interface definitions and argument parsing

use crate::data::DataPaths;
use clap::Parser;
use std::path::PathBuf;

/// Exploratory analysis of retail order baskets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the input CSV files
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Orders file (relative to the data directory)
    #[arg(long, default_value = "orders.csv")]
    pub orders: PathBuf,

    /// Order line items file (relative to the data directory)
    #[arg(long, default_value = "instacart_transaction.csv")]
    pub order_items: PathBuf,

    /// Products file (relative to the data directory)
    #[arg(long, default_value = "products.csv")]
    pub products: PathBuf,

    /// Departments file (relative to the data directory)
    #[arg(long, default_value = "departments.csv")]
    pub departments: PathBuf,

    /// Aisles file (relative to the data directory)
    #[arg(long, default_value = "aisles.csv")]
    pub aisles: PathBuf,

    /// Directory the charts are written to
    #[arg(short, long, default_value = "charts")]
    pub output_dir: PathBuf,

    /// Number of rows kept in the top-N charts
    #[arg(short = 'n', long, default_value = "25")]
    pub top_n: usize,

    /// Print the statistics without rendering any chart
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the input file names against the data directory
    pub fn data_paths(&self) -> DataPaths {
        let resolve = |file: &PathBuf| self.data_dir.join(file);
        DataPaths {
            orders: resolve(&self.orders),
            order_items: resolve(&self.order_items),
            products: resolve(&self.products),
            departments: resolve(&self.departments),
            aisles: resolve(&self.aisles),
        }
    }

    /// Reject option combinations clap cannot express on its own
    pub fn validate(&self) -> crate::Result<()> {
        if self.top_n == 0 {
            anyhow::bail!("--top-n must be at least 1");
        }
        Ok(())
    }
}
