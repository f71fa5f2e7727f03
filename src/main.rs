//! basketlens: loads the order dataset, prints basket statistics and renders
//! the chart sequence.

use anyhow::Result;
use basketlens::{analyze, load_tables, viz, Args};
use clap::Parser;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    args.validate()?;

    let start_time = Instant::now();

    // Step 1: load
    let paths = args.data_paths();
    debug!(?paths, "input files");
    let tables = load_tables(&paths)?;

    // Step 2: aggregate and segment
    let analysis_start = Instant::now();
    let analysis = analyze(&tables)?;
    debug!(
        elapsed_ms = analysis_start.elapsed().as_millis() as u64,
        "analysis finished"
    );

    viz::print_report(&analysis, args.top_n);

    // Step 3: charts
    if args.no_charts {
        info!("chart rendering skipped");
    } else {
        let written = viz::generate_report(&analysis, args.top_n, &args.output_dir)?;
        println!(
            "\n✓ {} charts saved to {}",
            written.len(),
            args.output_dir.display()
        );
    }

    info!(
        elapsed_s = start_time.elapsed().as_secs_f64(),
        "pipeline complete"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
