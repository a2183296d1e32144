mod bootstrap;
mod output;

use anyhow::Result;
use clap::Parser;
use metrics_core::error::MetricsError;
use metrics_core::formatting::victoria_metrics;
use metrics_core::settings::Settings;
use metrics_data::analysis::{analyze_snapshots, AnalysisOptions};

fn main() {
    let settings = Settings::parse();

    if let Err(err) = bootstrap::setup_logging(&settings.log_level) {
        eprintln!("Warning: logging unavailable: {err}");
    }

    if let Err(err) = run(&settings) {
        if let Some(fault) = err.downcast_ref::<MetricsError>() {
            tracing::debug!("{:?} fault", fault.kind());
        }
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

/// Aggregate the snapshot directory and write every requested output.
///
/// Nothing is written until the whole pipeline has succeeded.
fn run(settings: &Settings) -> Result<()> {
    tracing::info!("site-metrics v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Snapshots: {}, window: {:?}, layout: {:?}",
        settings.dir.display(),
        settings.window,
        settings.layout
    );

    let options = AnalysisOptions::from_settings(settings)?;
    let result = analyze_snapshots(&options)?;
    let rendered = result.graphs.render(settings.layout, settings.pretty)?;

    tracing::info!(
        "7-day averages: {} pageview days, {} visitor days",
        result.metadata.pageview_average_days,
        result.metadata.visitor_average_days
    );

    output::write_graphs(settings.graphs_out.as_deref(), &rendered)?;

    if let Some(path) = &settings.victoriametrics_out {
        let metrics = victoria_metrics(&result.graphs, &settings.metric_prefix);
        output::write_victoria_metrics(path, &metrics)?;
        tracing::info!("Wrote {} series to {}", metrics.len(), path.display());
    }

    Ok(())
}
