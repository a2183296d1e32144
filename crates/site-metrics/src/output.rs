use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use metrics_core::formatting::{write_json_lines, VictoriaMetric};

/// Write the rendered chart document to `dest`, or to stdout when unset.
///
/// The document is already fully serialized, so a failure here never leaves
/// a truncated JSON prefix behind on stdout.
pub fn write_graphs(dest: Option<&Path>, rendered: &str) -> Result<()> {
    match dest {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Unable to create {}", path.display()))?;
            writeln!(file, "{}", rendered)
                .with_context(|| format!("Unable to write {}", path.display()))?;
        }
        None => {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", rendered)?;
            out.flush()?;
        }
    }
    Ok(())
}

/// Write the VictoriaMetrics import lines to `path`.
pub fn write_victoria_metrics(path: &Path, metrics: &[VictoriaMetric]) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    write_json_lines(io::BufWriter::new(file), metrics)
        .with_context(|| format!("Unable to write {}", path.display()))?;
    Ok(())
}
