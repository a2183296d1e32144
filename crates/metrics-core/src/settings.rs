use clap::Parser;
use std::path::PathBuf;

use crate::calculations::WindowPolicy;
use crate::formatting::OutputLayout;

/// Conventional location of the collected snapshot files.
pub const DEFAULT_SNAPSHOT_DIR: &str = "./data/netlify";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Merge daily analytics snapshots into chart-ready JSON
#[derive(Parser, Debug, Clone)]
#[command(
    name = "site-metrics",
    about = "Merge daily analytics snapshots into chart-ready JSON",
    version
)]
pub struct Settings {
    /// Directory holding the snapshot files
    #[arg(long, default_value = DEFAULT_SNAPSHOT_DIR)]
    pub dir: PathBuf,

    /// Placement of the 7-day averaging window
    #[arg(long, value_enum, default_value_t = WindowPolicy::Forward)]
    pub window: WindowPolicy,

    /// Output document shape
    #[arg(long, value_enum, default_value_t = OutputLayout::Grouped)]
    pub layout: OutputLayout,

    /// Timezone used when printing dates (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Write the chart JSON here instead of stdout
    #[arg(long)]
    pub graphs_out: Option<PathBuf>,

    /// Also write a VictoriaMetrics JSON-lines import file
    #[arg(long)]
    pub victoriametrics_out: Option<PathBuf>,

    /// Metric name prefix for the VictoriaMetrics export
    #[arg(long, default_value = "netlify")]
    pub metric_prefix: String,

    /// Pretty-print the chart JSON
    #[arg(long)]
    pub pretty: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::parse_from(["site-metrics"])
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
