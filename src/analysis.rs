//! Runs every aggregation over the loaded tables

use crate::aggregate::{
    aisle_rollup, department_rollup, order_activity, product_rollup, summarize, AisleRollup,
    DepartmentRollup, OrderActivity, ProductRollup, Summary,
};
use crate::data::Tables;
use crate::segment::{customer_segments, segment_counts, CustomerCategory, CustomerSegment};
use std::collections::BTreeMap;
use tracing::info;

/// Every derived table of one run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary: Summary,
    pub activity: OrderActivity,
    pub products: Vec<ProductRollup>,
    pub departments: Vec<DepartmentRollup>,
    pub aisles: Vec<AisleRollup>,
    pub segments: Vec<CustomerSegment>,
    pub segment_counts: BTreeMap<CustomerCategory, usize>,
}

/// Derive all rollups and segments from the raw tables
pub fn analyze(tables: &Tables) -> crate::Result<Analysis> {
    let summary = summarize(tables)?;
    let activity = order_activity(&tables.orders)?;

    let products = product_rollup(&tables.order_items, &tables.products)?;
    let departments = department_rollup(&products, &tables.departments)?;
    let aisles = aisle_rollup(&products, &tables.aisles)?;
    info!(
        products = products.len(),
        departments = departments.len(),
        aisles = aisles.len(),
        "rollups computed"
    );

    let segments = customer_segments(&tables.orders)?;
    let segment_counts = segment_counts(&segments);
    info!(customers = segments.len(), "customers segmented");

    Ok(Analysis {
        summary,
        activity,
        products,
        departments,
        aisles,
        segments,
        segment_counts,
    })
}
