//! End-to-end aggregation pipeline.
//!
//! Loads every snapshot, merges them, computes the 7-day averages and builds
//! the chart series, returning an [`AnalysisResult`] for the run harness to
//! write out.

use std::path::PathBuf;

use metrics_core::calculations::{moving_average, WindowPolicy};
use metrics_core::error::Result;
use metrics_core::formatting::{build_graphs, Graphs, OutputLayout};
use metrics_core::models::{AveragedData, MergedData, Snapshot};
use metrics_core::settings::Settings;
use metrics_core::time_utils::{resolve_timezone, DateFormatter};
use tracing::info;

use crate::aggregator::SeriesAggregator;
use crate::reader::load_snapshots;

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Directory holding the snapshot files.
    pub dir: PathBuf,
    pub window: WindowPolicy,
    pub layout: OutputLayout,
    /// Formatter for dates in error messages.
    pub dates: DateFormatter,
}

impl AnalysisOptions {
    /// Derive options from parsed CLI settings, resolving the timezone.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            dir: settings.dir.clone(),
            window: settings.window,
            layout: settings.layout,
            dates: DateFormatter::new(resolve_timezone(&settings.timezone)?),
        })
    }
}

/// Counts describing a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisMetadata {
    pub snapshots_read: usize,
    pub pageview_days: usize,
    pub visitor_days: usize,
    pub pageview_average_days: usize,
    pub visitor_average_days: usize,
    pub sources: usize,
    pub window: WindowPolicy,
}

/// The complete output of [`analyze_snapshots`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub data: MergedData,
    pub averages: AveragedData,
    /// Chart series, labelled for the requested layout.
    pub graphs: Graphs,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Compute the 7-day averages of both point series.
pub fn average_all(data: &MergedData, window: WindowPolicy) -> AveragedData {
    AveragedData {
        pageviews: moving_average(&data.pageviews, window),
        visitors: moving_average(&data.visitors, window),
    }
}

/// Run the full pipeline against `options.dir`.
///
/// 1. Load and trim every snapshot file.
/// 2. Merge them, failing on the first inconsistent day.
/// 3. Average and build the chart series.
pub fn analyze_snapshots(options: &AnalysisOptions) -> Result<AnalysisResult> {
    let snapshots = load_snapshots(&options.dir)?;
    analyze_loaded(&snapshots, options)
}

/// Steps 2 and 3 of [`analyze_snapshots`] over already-loaded snapshots.
pub fn analyze_loaded(snapshots: &[Snapshot], options: &AnalysisOptions) -> Result<AnalysisResult> {
    let data = SeriesAggregator::merge_all(snapshots, options.dates)?;
    let averages = average_all(&data, options.window);
    let graphs = build_graphs(&data, &averages, options.layout);

    let metadata = AnalysisMetadata {
        snapshots_read: snapshots.len(),
        pageview_days: data.pageviews.len(),
        visitor_days: data.visitors.len(),
        pageview_average_days: averages.pageviews.len(),
        visitor_average_days: averages.visitors.len(),
        sources: data.sources.len(),
        window: options.window,
    };
    info!(
        "Merged {} snapshots: {} pageview days, {} visitor days, {} sources",
        metadata.snapshots_read, metadata.pageview_days, metadata.visitor_days, metadata.sources
    );

    Ok(AnalysisResult {
        data,
        averages,
        graphs,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
