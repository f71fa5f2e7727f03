//! Loading the order dataset from CSV files using Polars

use anyhow::Context;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of the five input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub orders: PathBuf,
    pub order_items: PathBuf,
    pub products: PathBuf,
    pub departments: PathBuf,
    pub aisles: PathBuf,
}

impl DataPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            orders: dir.join("orders.csv"),
            order_items: dir.join("instacart_transaction.csv"),
            products: dir.join("products.csv"),
            departments: dir.join("departments.csv"),
            aisles: dir.join("aisles.csv"),
        }
    }
}

/// The raw tables after loading and column cleanup
///
/// Integer columns are `Int64`, names are `String`.
#[derive(Debug, Clone)]
pub struct Tables {
    /// order_id, user_id, order_number, order_dow, order_hour_of_day, days_since_prior_order
    pub orders: DataFrame,
    /// order_id, product_id, add_to_cart_order, reordered
    pub order_items: DataFrame,
    /// product_id, aisle_id, department_id, product_name
    pub products: DataFrame,
    /// department_id, department
    pub departments: DataFrame,
    /// aisle_id, aisle
    pub aisles: DataFrame,
}

/// Load all input tables
///
/// The orders table loses its `eval_set` label and a missing
/// `days_since_prior_order` (a user's first order) becomes 0.
///
/// # Arguments
/// * `paths` - Locations of the orders, order items, products, departments and aisles files
///
/// # Returns
/// * `Tables` with every id column as `Int64` and every name column as `String`
///
/// A missing file, a missing column or a value that does not parse as
/// the column's type fails the whole load.
pub fn load_tables(paths: &DataPaths) -> crate::Result<Tables> {
    let orders = read_csv(&paths.orders)?
        .lazy()
        .select([
            col("order_id").strict_cast(DataType::Int64),
            col("user_id").strict_cast(DataType::Int64),
            col("order_number").strict_cast(DataType::Int64),
            col("order_dow").strict_cast(DataType::Int64),
            col("order_hour_of_day").strict_cast(DataType::Int64),
            col("days_since_prior_order")
                .fill_null(lit(0))
                .strict_cast(DataType::Int64),
        ])
        .collect()
        .with_context(|| format!("unexpected orders schema in {}", paths.orders.display()))?;

    let order_items = project(
        read_csv(&paths.order_items)?,
        &["order_id", "product_id", "add_to_cart_order", "reordered"],
        &[],
    )
    .with_context(|| {
        format!(
            "unexpected order items schema in {}",
            paths.order_items.display()
        )
    })?;

    let products = project(
        read_csv(&paths.products)?,
        &["product_id", "aisle_id", "department_id"],
        &["product_name"],
    )
    .with_context(|| format!("unexpected products schema in {}", paths.products.display()))?;

    let departments = project(
        read_csv(&paths.departments)?,
        &["department_id"],
        &["department"],
    )
    .with_context(|| {
        format!(
            "unexpected departments schema in {}",
            paths.departments.display()
        )
    })?;

    let aisles = project(read_csv(&paths.aisles)?, &["aisle_id"], &["aisle"])
        .with_context(|| format!("unexpected aisles schema in {}", paths.aisles.display()))?;

    info!(
        orders = orders.height(),
        order_items = order_items.height(),
        products = products.height(),
        departments = departments.height(),
        aisles = aisles.height(),
        "tables loaded"
    );

    Ok(Tables {
        orders,
        order_items,
        products,
        departments,
        aisles,
    })
}

fn read_csv(path: &Path) -> crate::Result<DataFrame> {
    debug!(path = %path.display(), "reading csv");
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Keep only the named columns, casting ids to Int64 and names to String
///
/// Casts are strict: an unparsable value is an error, never a null.
fn project(df: DataFrame, int_columns: &[&str], str_columns: &[&str]) -> PolarsResult<DataFrame> {
    let exprs: Vec<Expr> = int_columns
        .iter()
        .map(|name| col(*name).strict_cast(DataType::Int64))
        .chain(str_columns.iter().map(|name| col(*name).strict_cast(DataType::String)))
        .collect();
    df.lazy().select(exprs).collect()
}

/// Non-null values of an integer column
pub(crate) fn i64_values(df: &DataFrame, name: &str) -> crate::Result<Vec<i64>> {
    df.column(name)?
        .i64()?
        .into_iter()
        .map(|value| value.with_context(|| format!("null value in column `{name}`")))
        .collect()
}

/// Values of a string column, nulls become empty strings
pub(crate) fn string_values(df: &DataFrame, name: &str) -> crate::Result<Vec<String>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

/// Values of a float column; nulls become NaN
pub(crate) fn f64_values(df: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write_dataset() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("orders.csv"),
            "order_id,user_id,eval_set,order_number,order_dow,order_hour_of_day,days_since_prior_order\n\
             1,10,prior,1,0,8,\n\
             2,10,prior,2,3,14,7.0\n\
             3,20,train,1,6,23,\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("instacart_transaction.csv"),
            "order_id,product_id,add_to_cart_order,reordered\n\
             1,100,1,0\n\
             2,100,1,1\n\
             3,200,1,0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("products.csv"),
            "product_id,product_name,aisle_id,department_id\n\
             100,\"Banana, Organic\",24,4\n\
             200,Sparkling Water,115,7\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("departments.csv"),
            "department_id,department\n4,produce\n7,beverages\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("aisles.csv"),
            "aisle_id,aisle\n24,fresh fruits\n115,water seltzer sparkling water\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_load_tables() {
        let dir = write_dataset();
        let tables = load_tables(&DataPaths::in_dir(dir.path())).unwrap();

        assert_eq!(tables.orders.height(), 3);
        assert_eq!(tables.order_items.height(), 3);
        assert_eq!(tables.products.height(), 2);
        assert_eq!(tables.departments.height(), 2);
        assert_eq!(tables.aisles.height(), 2);
    }

    #[test]
    fn test_eval_set_dropped_and_gap_filled() {
        let dir = write_dataset();
        let tables = load_tables(&DataPaths::in_dir(dir.path())).unwrap();

        assert!(tables.orders.column("eval_set").is_err());
        let gaps = i64_values(&tables.orders, "days_since_prior_order").unwrap();
        assert_eq!(gaps, vec![0, 7, 0]);
    }

    #[test]
    fn test_quoted_product_name() {
        let dir = write_dataset();
        let tables = load_tables(&DataPaths::in_dir(dir.path())).unwrap();

        let names = string_values(&tables.products, "product_name").unwrap();
        assert_eq!(names[0], "Banana, Organic");
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = write_dataset();
        fs::remove_file(dir.path().join("aisles.csv")).unwrap();

        let result = load_tables(&DataPaths::in_dir(dir.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_column_fails() {
        let dir = write_dataset();
        fs::write(
            dir.path().join("departments.csv"),
            "department_id,name\n4,produce\n",
        )
        .unwrap();

        let result = load_tables(&DataPaths::in_dir(dir.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_product_id_fails() {
        let dir = write_dataset();
        fs::write(
            dir.path().join("instacart_transaction.csv"),
            "order_id,product_id,add_to_cart_order,reordered\n\
             1,100,1,0\n\
             2,abc,1,1\n",
        )
        .unwrap();

        let err = load_tables(&DataPaths::in_dir(dir.path())).unwrap_err();
        assert!(format!("{err:#}").contains("instacart_transaction.csv"));
    }

    #[test]
    fn test_non_numeric_reordered_flag_fails() {
        let dir = write_dataset();
        fs::write(
            dir.path().join("instacart_transaction.csv"),
            "order_id,product_id,add_to_cart_order,reordered\n\
             1,100,1,0\n\
             2,100,2,yes\n",
        )
        .unwrap();

        assert!(load_tables(&DataPaths::in_dir(dir.path())).is_err());
    }

    #[test]
    fn test_non_numeric_order_dow_fails() {
        let dir = write_dataset();
        fs::write(
            dir.path().join("orders.csv"),
            "order_id,user_id,eval_set,order_number,order_dow,order_hour_of_day,days_since_prior_order\n\
             1,10,prior,1,0,8,\n\
             2,10,prior,2,Mon,14,7.0\n",
        )
        .unwrap();

        let err = load_tables(&DataPaths::in_dir(dir.path())).unwrap_err();
        assert!(format!("{err:#}").contains("orders.csv"));
    }

    #[test]
    fn test_non_numeric_hour_fails() {
        let dir = write_dataset();
        fs::write(
            dir.path().join("orders.csv"),
            "order_id,user_id,eval_set,order_number,order_dow,order_hour_of_day,days_since_prior_order\n\
             1,10,prior,1,0,morning,\n",
        )
        .unwrap();

        assert!(load_tables(&DataPaths::in_dir(dir.path())).is_err());
    }
}
