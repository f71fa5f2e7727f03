//! Product, department and aisle rollups plus order-level statistics

use crate::data::{f64_values, i64_values, string_values, Tables};
use anyhow::Context;
use ndarray::Array2;
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Reorder statistics of a single product
///
/// Only products referenced by at least one order item have a rollup,
/// so `total_order` is always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRollup {
    pub product_id: i64,
    pub product_name: String,
    pub aisle_id: i64,
    pub department_id: i64,
    pub total_order: u64,
    pub total_reorder: u64,
    pub reorder_ratio: f64,
}

/// Reorder statistics summed over the products of one department or aisle
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRollup {
    pub id: i64,
    pub name: String,
    pub total_order: u64,
    pub total_reorder: u64,
    pub reorder_ratio: f64,
    /// Distinct ordered products in the category
    pub items: u64,
}

pub type DepartmentRollup = CategoryRollup;
pub type AisleRollup = CategoryRollup;

/// Scalar statistics printed at the start of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub orders: usize,
    pub order_items: usize,
    pub customers: usize,
    pub products_per_order: f64,
    pub products_per_customer: f64,
    pub orders_per_customer: f64,
}

/// When customers place their orders
#[derive(Debug, Clone, PartialEq)]
pub struct OrderActivity {
    /// Orders per day of week, index 0 is Sunday
    pub by_dow: [u64; 7],
    /// Orders per (day of week, hour of day)
    pub by_dow_hour: Array2<u64>,
    /// Number of orders per days-since-prior-order value
    pub days_since_prior: BTreeMap<i64, u64>,
}

/// Anything ranked by the top-N charts
pub trait Ranked {
    fn total_order(&self) -> u64;
    fn reorder_ratio(&self) -> f64;
}

impl Ranked for ProductRollup {
    fn total_order(&self) -> u64 {
        self.total_order
    }

    fn reorder_ratio(&self) -> f64 {
        self.reorder_ratio
    }
}

impl Ranked for CategoryRollup {
    fn total_order(&self) -> u64 {
        self.total_order
    }

    fn reorder_ratio(&self) -> f64 {
        self.reorder_ratio
    }
}

/// Metric used to rank rollups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalOrder,
    ReorderRatio,
}

impl Metric {
    pub fn value<T: Ranked>(self, row: &T) -> f64 {
        match self {
            Metric::TotalOrder => row.total_order() as f64,
            Metric::ReorderRatio => row.reorder_ratio(),
        }
    }
}

/// Compute the three per-order/per-customer averages
pub fn summarize(tables: &Tables) -> crate::Result<Summary> {
    let orders = tables.orders.height();
    let order_items = tables.order_items.height();
    let customers = i64_values(&tables.orders, "user_id")?
        .into_iter()
        .collect::<HashSet<_>>()
        .len();

    Ok(Summary {
        orders,
        order_items,
        customers,
        products_per_order: order_items as f64 / orders as f64,
        products_per_customer: order_items as f64 / customers as f64,
        orders_per_customer: orders as f64 / customers as f64,
    })
}

/// Group order items by product and attach the product attributes
///
/// The join is inner: a product nobody ordered has no rollup. The ratio
/// is computed after the join, so its denominator is never zero.
///
/// # Arguments
/// * `order_items` - order_id, product_id and reordered flag per basket line
/// * `products` - product_id, product_name, aisle_id, department_id
///
/// # Returns
/// * One `ProductRollup` per ordered product, sorted by `product_id`
pub fn product_rollup(
    order_items: &DataFrame,
    products: &DataFrame,
) -> crate::Result<Vec<ProductRollup>> {
    let totals = order_items
        .clone()
        .lazy()
        .group_by_stable([col("product_id")])
        .agg([
            col("order_id").count().cast(DataType::Int64).alias("total_order"),
            col("reordered").sum().cast(DataType::Int64).alias("total_reorder"),
        ]);

    let df = products
        .clone()
        .lazy()
        .join(
            totals,
            [col("product_id")],
            [col("product_id")],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(ratio_expr())
        .sort(["product_id"], SortMultipleOptions::default())
        .collect()
        .context("product rollup failed")?;

    debug!(rows = df.height(), "product rollup computed");

    let ids = i64_values(&df, "product_id")?;
    let names = string_values(&df, "product_name")?;
    let aisles = i64_values(&df, "aisle_id")?;
    let departments = i64_values(&df, "department_id")?;
    let orders = i64_values(&df, "total_order")?;
    let reorders = i64_values(&df, "total_reorder")?;
    let ratios = f64_values(&df, "reorder_ratio")?;

    Ok(ids
        .into_iter()
        .zip(names)
        .zip(aisles)
        .zip(departments)
        .zip(orders)
        .zip(reorders)
        .zip(ratios)
        .map(
            |((((((product_id, product_name), aisle_id), department_id), total_order), total_reorder), reorder_ratio)| {
                ProductRollup {
                    product_id,
                    product_name,
                    aisle_id,
                    department_id,
                    total_order: total_order as u64,
                    total_reorder: total_reorder as u64,
                    reorder_ratio,
                }
            },
        )
        .collect())
}

/// Roll product statistics up to departments
pub fn department_rollup(
    products: &[ProductRollup],
    departments: &DataFrame,
) -> crate::Result<Vec<DepartmentRollup>> {
    category_rollup(products, departments, "department_id", "department", |p| {
        p.department_id
    })
}

/// Roll product statistics up to aisles
pub fn aisle_rollup(products: &[ProductRollup], aisles: &DataFrame) -> crate::Result<Vec<AisleRollup>> {
    category_rollup(products, aisles, "aisle_id", "aisle", |p| p.aisle_id)
}

/// Sum product rollups per category and join onto the category table
///
/// Categories without any ordered product are dropped by the inner join.
/// Rows come back sorted by category id.
fn category_rollup(
    products: &[ProductRollup],
    categories: &DataFrame,
    key: &str,
    name: &str,
    category_of: impl Fn(&ProductRollup) -> i64,
) -> crate::Result<Vec<CategoryRollup>> {
    let frame = DataFrame::new(vec![
        Column::new(key.into(), products.iter().map(&category_of).collect::<Vec<i64>>()),
        Column::new(
            "product_id".into(),
            products.iter().map(|p| p.product_id).collect::<Vec<i64>>(),
        ),
        Column::new(
            "total_order".into(),
            products.iter().map(|p| p.total_order as i64).collect::<Vec<i64>>(),
        ),
        Column::new(
            "total_reorder".into(),
            products.iter().map(|p| p.total_reorder as i64).collect::<Vec<i64>>(),
        ),
    ])?;

    let totals = frame
        .lazy()
        .group_by_stable([col(key)])
        .agg([
            col("total_order").sum().alias("total_order"),
            col("total_reorder").sum().alias("total_reorder"),
            col("product_id").n_unique().cast(DataType::Int64).alias("items"),
        ]);

    let df = categories
        .clone()
        .lazy()
        .join(totals, [col(key)], [col(key)], JoinArgs::new(JoinType::Inner))
        .with_column(ratio_expr())
        .sort([key], SortMultipleOptions::default())
        .collect()
        .with_context(|| format!("{name} rollup failed"))?;

    debug!(category = name, rows = df.height(), "category rollup computed");

    let ids = i64_values(&df, key)?;
    let names = string_values(&df, name)?;
    let orders = i64_values(&df, "total_order")?;
    let reorders = i64_values(&df, "total_reorder")?;
    let ratios = f64_values(&df, "reorder_ratio")?;
    let items = i64_values(&df, "items")?;

    Ok(ids
        .into_iter()
        .zip(names)
        .zip(orders)
        .zip(reorders)
        .zip(ratios)
        .zip(items)
        .map(
            |(((((id, name), total_order), total_reorder), reorder_ratio), items)| CategoryRollup {
                id,
                name,
                total_order: total_order as u64,
                total_reorder: total_reorder as u64,
                reorder_ratio,
                items: items as u64,
            },
        )
        .collect())
}

fn ratio_expr() -> Expr {
    (col("total_reorder").cast(DataType::Float64) / col("total_order").cast(DataType::Float64))
        .alias("reorder_ratio")
}

/// Sort rows non-increasing by `metric` and keep the first `n`
///
/// The sort is stable, so rows with equal metric keep their input order
/// and re-ranking the result is a no-op.
pub fn top_n<T: Ranked + Clone>(rows: &[T], n: usize, metric: Metric) -> Vec<T> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| descending(metric.value(a), metric.value(b)));
    ranked.truncate(n);
    ranked
}

/// All rows sorted non-increasing by `metric`
pub fn sorted_by<T: Ranked + Clone>(rows: &[T], metric: Metric) -> Vec<T> {
    top_n(rows, rows.len(), metric)
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Count orders per weekday, per weekday and hour, and per gap length
pub fn order_activity(orders: &DataFrame) -> crate::Result<OrderActivity> {
    let dows = i64_values(orders, "order_dow")?;
    let hours = i64_values(orders, "order_hour_of_day")?;
    let gaps = i64_values(orders, "days_since_prior_order")?;

    let mut by_dow = [0u64; 7];
    let mut by_dow_hour = Array2::<u64>::zeros((7, 24));
    let mut days_since_prior = BTreeMap::new();

    for ((dow, hour), gap) in dows.into_iter().zip(hours).zip(gaps) {
        let day = usize::try_from(dow)
            .ok()
            .filter(|d| *d < 7)
            .with_context(|| format!("order_dow out of range: {dow}"))?;
        let hour = usize::try_from(hour)
            .ok()
            .filter(|h| *h < 24)
            .with_context(|| format!("order_hour_of_day out of range: {hour}"))?;

        by_dow[day] += 1;
        by_dow_hour[[day, hour]] += 1;
        *days_since_prior.entry(gap).or_insert(0) += 1;
    }

    Ok(OrderActivity {
        by_dow,
        by_dow_hour,
        days_since_prior,
    })
}
