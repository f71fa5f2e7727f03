//! Chart rendering with Plotters and the console report

use crate::aggregate::{sorted_by, top_n, Metric};
use crate::analysis::Analysis;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Matplotlib's default qualitative palette
const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const BLUE_BAR: RGBColor = TAB10[0];
const ORANGE_BAR: RGBColor = TAB10[1];
const CYAN_BAR: RGBColor = TAB10[9];

const LABEL_CHARS: usize = 28;

/// Caption and axis descriptions of a chart
#[derive(Debug, Clone, Copy)]
pub struct Axes<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

impl<'a> Axes<'a> {
    pub fn new(title: &'a str, x_desc: &'a str, y_desc: &'a str) -> Self {
        Self {
            title,
            x_desc,
            y_desc,
        }
    }
}

/// `order_dow` labels, 0 being Sunday
const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Full weekday name for an `order_dow` value
pub fn weekday_name(dow: usize) -> &'static str {
    WEEKDAYS[dow % WEEKDAYS.len()]
}

fn short_label(label: &str) -> String {
    if label.chars().count() <= LABEL_CHARS {
        label.to_string()
    } else {
        let head: String = label.chars().take(LABEL_CHARS - 1).collect();
        format!("{head}…")
    }
}

/// Room under the x axis for rotated category labels
fn label_area(labels: &[String]) -> u32 {
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
    (longest * 7 + 20).clamp(40, 220)
}

fn y_upper(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn category_label(labels: &[String], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            labels.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

fn ensure_plottable(axes: &Axes, labels: &[String], values: &[f64]) -> crate::Result<()> {
    if labels.is_empty() {
        anyhow::bail!("no data to plot for '{}'", axes.title);
    }
    if labels.len() != values.len() {
        anyhow::bail!(
            "'{}' has {} labels but {} values",
            axes.title,
            labels.len(),
            values.len()
        );
    }
    Ok(())
}

/// Vertical bars, one per category label
pub fn draw_bar_chart(
    output_path: &Path,
    axes: Axes,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
) -> crate::Result<()> {
    ensure_plottable(&axes, labels, values)?;

    let root = BitMapBackend::new(output_path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(axes.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(label_area(labels))
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..labels.len() as u32).into_segmented(), 0f64..y_upper(values))?;

    let format_label = |value: &SegmentValue<u32>| category_label(labels, value);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&format_label)
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .x_desc(axes.x_desc)
        .y_desc(axes.y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(color.filled())
            .margin(3)
            .data(values.iter().enumerate().map(|(i, &v)| (i as u32, v))),
    )?;

    root.present()?;
    info!(path = %output_path.display(), "bar chart saved");
    Ok(())
}

/// A single line through ordered categories
pub fn draw_category_line_chart(
    output_path: &Path,
    axes: Axes,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
) -> crate::Result<()> {
    ensure_plottable(&axes, labels, values)?;

    let root = BitMapBackend::new(output_path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(axes.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(label_area(labels))
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..labels.len() as u32).into_segmented(), 0f64..y_upper(values))?;

    let format_label = |value: &SegmentValue<u32>| category_label(labels, value);
    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&format_label)
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .x_desc(axes.x_desc)
        .y_desc(axes.y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let points: Vec<(SegmentValue<u32>, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (SegmentValue::CenterOf(i as u32), v))
        .collect();

    chart.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?;
    chart.draw_series(
        points
            .into_iter()
            .map(|point| Circle::new(point, 3, color.filled())),
    )?;

    root.present()?;
    info!(path = %output_path.display(), "line chart saved");
    Ok(())
}

/// One line per weekday across the 24 hours of the day
pub fn draw_hourly_chart(
    output_path: &Path,
    axes: Axes,
    by_dow_hour: &ndarray::Array2<u64>,
) -> crate::Result<()> {
    let max = by_dow_hour.iter().copied().max().unwrap_or(0) as f64;
    let y_top = if max > 0.0 { max * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(output_path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(axes.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0i32..23i32, 0f64..y_top)?;

    chart
        .configure_mesh()
        .x_labels(24)
        .x_desc(axes.x_desc)
        .y_desc(axes.y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (dow, row) in by_dow_hour.outer_iter().enumerate() {
        let color = TAB10[dow % TAB10.len()];
        let points: Vec<(i32, f64)> = row
            .iter()
            .enumerate()
            .map(|(hour, &count)| (hour as i32, count as f64))
            .collect();

        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(weekday_name(dow))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "hourly chart saved");
    Ok(())
}

/// Share of each label in the total, with percentages on the slices
pub fn draw_pie_chart(
    output_path: &Path,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> crate::Result<()> {
    ensure_plottable(&Axes::new(title, "", ""), labels, values)?;
    if values.iter().sum::<f64>() <= 0.0 {
        anyhow::bail!("'{title}' has nothing to share out");
    }

    let root = BitMapBackend::new(output_path, (1000, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 30))?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;
    let colors: Vec<RGBColor> = (0..labels.len()).map(|i| TAB10[i % TAB10.len()]).collect();

    let mut pie = Pie::new(&center, &radius, values, &colors, labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 12).into_font().color(&WHITE));
    root.draw(&pie)?;

    root.present()?;
    info!(path = %output_path.display(), "pie chart saved");
    Ok(())
}

/// Render the fixed sequence of charts into `output_dir`
///
/// # Arguments
/// * `analysis` - Rollups, segments and order activity of one run
/// * `top` - Number of rows kept in the top-N product and aisle charts
/// * `output_dir` - Directory the PNG files are written to, created if missing
///
/// # Returns
/// * Paths of the written charts, in rendering order
pub fn generate_report(
    analysis: &Analysis,
    top: usize,
    output_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    let mut target = |name: &str| {
        let path = output_dir.join(name);
        written.push(path.clone());
        path
    };

    let weekdays: Vec<String> = WEEKDAYS.iter().map(|d| d.to_string()).collect();
    let dow_counts: Vec<f64> = analysis.activity.by_dow.iter().map(|&c| c as f64).collect();
    draw_category_line_chart(
        &target("orders_by_dow.png"),
        Axes::new("Days of week", "Day", "Number of orders"),
        &weekdays,
        &dow_counts,
        BLACK,
    )?;

    draw_hourly_chart(
        &target("orders_by_hour.png"),
        Axes::new("Hours of Day", "Hours", "Number of orders"),
        &analysis.activity.by_dow_hour,
    )?;

    let top_ordered = top_n(&analysis.products, top, Metric::TotalOrder);
    draw_bar_chart(
        &target("top_ordered_products.png"),
        Axes::new(&format!("Top {top} Ordered Items"), "Product", "Total Order"),
        &top_ordered.iter().map(|p| short_label(&p.product_name)).collect::<Vec<_>>(),
        &top_ordered.iter().map(|p| p.total_order as f64).collect::<Vec<_>>(),
        ORANGE_BAR,
    )?;

    let top_reordered = top_n(&analysis.products, top, Metric::ReorderRatio);
    draw_category_line_chart(
        &target("top_reordered_products.png"),
        Axes::new(&format!("Top {top} Reordered Items"), "Product", "Reorder Ratio"),
        &top_reordered.iter().map(|p| short_label(&p.product_name)).collect::<Vec<_>>(),
        &top_reordered.iter().map(|p| p.reorder_ratio).collect::<Vec<_>>(),
        ORANGE_BAR,
    )?;

    let department_names: Vec<String> = analysis.departments.iter().map(|d| d.name.clone()).collect();
    draw_bar_chart(
        &target("department_items.png"),
        Axes::new("Number of items in each department", "Department", "Number of items"),
        &department_names,
        &analysis.departments.iter().map(|d| d.items as f64).collect::<Vec<_>>(),
        BLUE_BAR,
    )?;

    let by_sales = sorted_by(&analysis.departments, Metric::TotalOrder);
    let sales_names: Vec<String> = by_sales.iter().map(|d| d.name.clone()).collect();
    let sales: Vec<f64> = by_sales.iter().map(|d| d.total_order as f64).collect();
    draw_bar_chart(
        &target("department_sales.png"),
        Axes::new("Department Sale", "Department", "Number of orders"),
        &sales_names,
        &sales,
        BLUE_BAR,
    )?;

    draw_pie_chart(
        &target("department_sales_share.png"),
        "Department Sale",
        &sales_names,
        &sales,
    )?;

    let by_ratio = sorted_by(&analysis.departments, Metric::ReorderRatio);
    draw_category_line_chart(
        &target("department_reorder_ratio.png"),
        Axes::new("Department Reorder Ratio", "Department", "Reorder Ratio"),
        &by_ratio.iter().map(|d| d.name.clone()).collect::<Vec<_>>(),
        &by_ratio.iter().map(|d| d.reorder_ratio).collect::<Vec<_>>(),
        BLUE_BAR,
    )?;

    // empty buckets would only add zero-width slices
    let (categories, users): (Vec<String>, Vec<f64>) = analysis
        .segment_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(category, &count)| (category.to_string(), count as f64))
        .unzip();
    draw_pie_chart(
        &target("customer_categories.png"),
        "Customers category",
        &categories,
        &users,
    )?;

    let (gaps, gap_users): (Vec<String>, Vec<f64>) = analysis
        .activity
        .days_since_prior
        .iter()
        .map(|(days, &count)| (days.to_string(), count as f64))
        .unzip();
    draw_bar_chart(
        &target("order_frequency.png"),
        Axes::new("Order Frequency", "Days since prior order", "Number of users"),
        &gaps,
        &gap_users,
        CYAN_BAR,
    )?;

    let top_aisles = top_n(&analysis.aisles, top, Metric::TotalOrder);
    draw_bar_chart(
        &target("top_aisles.png"),
        Axes::new(&format!("Top {top} Aisles"), "Aisle", "Total Order"),
        &top_aisles.iter().map(|a| short_label(&a.name)).collect::<Vec<_>>(),
        &top_aisles.iter().map(|a| a.total_order as f64).collect::<Vec<_>>(),
        TAB10[2],
    )?;

    Ok(written)
}

/// Print the summary statistics and rollup tables to stdout
pub fn print_report(analysis: &Analysis, top: usize) {
    let summary = &analysis.summary;
    println!("\n=== Basket Statistics ===");
    println!("Orders: {}", summary.orders);
    println!("Order items: {}", summary.order_items);
    println!("Customers: {}", summary.customers);
    println!("Products per order: {:.4}", summary.products_per_order);
    println!("Products per customer: {:.4}", summary.products_per_customer);
    println!("Orders per customer: {:.4}", summary.orders_per_customer);

    println!("\n=== Departments ===");
    println!("  {:<20} | {:>10} | {:>10} | {:>7} | {:>6}", "Department", "Orders", "Reorders", "Ratio", "Items");
    println!("  {:-<20}-|-{:->10}-|-{:->10}-|-{:->7}-|-{:->6}", "", "", "", "", "");
    for dept in sorted_by(&analysis.departments, Metric::TotalOrder) {
        println!(
            "  {:<20} | {:>10} | {:>10} | {:>7.3} | {:>6}",
            dept.name, dept.total_order, dept.total_reorder, dept.reorder_ratio, dept.items
        );
    }

    println!("\n=== Top {} Products ===", top);
    for (rank, product) in top_n(&analysis.products, top, Metric::TotalOrder)
        .iter()
        .enumerate()
    {
        println!(
            "  {:>3}. {} ({} orders, reorder ratio {:.3})",
            rank + 1,
            product.product_name,
            product.total_order,
            product.reorder_ratio
        );
    }

    let customers = analysis.segments.len().max(1) as f64;
    println!("\n=== Customer Categories ===");
    for (category, &count) in &analysis.segment_counts {
        println!(
            "  {:<8}: {} customers ({:.1}%)",
            category.as_str(),
            count,
            count as f64 / customers * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_weekday_name_starts_on_sunday() {
        assert_eq!(weekday_name(0), "Sunday");
        assert_eq!(weekday_name(1), "Monday");
        assert_eq!(weekday_name(6), "Saturday");
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("Banana"), "Banana");
        let long = "Organic Unsweetened Vanilla Almond Milk";
        let short = short_label(long);
        assert_eq!(short.chars().count(), LABEL_CHARS);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_mismatched_series_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.png");

        let result = draw_bar_chart(
            &path,
            Axes::new("Bad", "x", "y"),
            &labels(&["a", "b"]),
            &[1.0],
            BLUE_BAR,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_pie_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("empty.png");

        assert!(draw_pie_chart(&path, "Empty", &[], &[]).is_err());
        assert!(draw_pie_chart(&path, "Zero", &labels(&["a"]), &[0.0]).is_err());
    }

    #[test]
    fn test_draw_bar_chart() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bars.png");

        let result = draw_bar_chart(
            &path,
            Axes::new("Department Sale", "Department", "Number of orders"),
            &labels(&["produce", "dairy eggs", "snacks"]),
            &[30.0, 12.0, 7.0],
            BLUE_BAR,
        );
        assert!(result.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_draw_pie_chart() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pie.png");

        let result = draw_pie_chart(
            &path,
            "Customers category",
            &labels(&["Light", "Medium", "Heavy"]),
            &[5.0, 3.0, 1.0],
        );
        assert!(result.is_ok());
        assert!(path.exists());
    }
}
