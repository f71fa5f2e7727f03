//! basketlens: exploratory analysis of retail order baskets
//!
//! Loads orders, order items, products, departments and aisles from CSV,
//! rolls reorder statistics up to product, department and aisle level,
//! buckets customers by how many orders they placed and renders the
//! results as static charts.

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod data;
pub mod segment;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{
    aisle_rollup, department_rollup, order_activity, product_rollup, summarize, top_n,
    CategoryRollup, Metric, OrderActivity, ProductRollup, Summary,
};
pub use analysis::{analyze, Analysis};
pub use cli::Args;
pub use data::{load_tables, DataPaths, Tables};
pub use segment::{customer_segments, segment_counts, CustomerCategory, CustomerSegment};
pub use viz::generate_report;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
