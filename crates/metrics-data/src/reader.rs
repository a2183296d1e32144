//! Snapshot file discovery and loading.
//!
//! Every regular file in the snapshot directory is parsed as one export of
//! the hosting platform's analytics API. The final pageviews and visitors
//! points of each file cover a day that was still in progress when the
//! export ran, so they are removed before the snapshot is handed on.

use std::path::{Path, PathBuf};

use metrics_core::error::{MetricsError, Result};
use metrics_core::models::{Metric, Snapshot, SnapshotDocument};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// List the regular files directly inside `dir`, sorted by path.
///
/// Subdirectories and other non-file entries are skipped.
pub fn find_snapshot_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(MetricsError::DataPathNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(MetricsError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.map_err(|e| MetricsError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        } else {
            debug!("Skipping non-file entry {}", entry.path().display());
        }
    }

    files.sort();
    Ok(files)
}

/// Read, parse and trim a single snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read(path).map_err(|e| MetricsError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_snapshot(path, &content)
}

/// Parse snapshot bytes that were read from `path`.
///
/// Content that is not valid UTF-8 JSON is a parse fault, not a read fault.
pub fn parse_snapshot(path: &Path, content: &[u8]) -> Result<Snapshot> {
    let doc: SnapshotDocument =
        serde_json::from_slice(content).map_err(|e| MetricsError::SnapshotParse {
            path: path.to_path_buf(),
            source: e,
        })?;
    trim_partial_day(path, doc)
}

/// Load every snapshot in `dir`. The first unreadable or malformed file
/// aborts the whole load.
pub fn load_snapshots(dir: &Path) -> Result<Vec<Snapshot>> {
    let files = find_snapshot_files(dir)?;
    if files.is_empty() {
        warn!("No snapshot files found in {}", dir.display());
    }

    let snapshots = files
        .iter()
        .map(|path| load_snapshot(path))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Loaded {} snapshots from {}",
        snapshots.len(),
        dir.display()
    );
    Ok(snapshots)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Drop the in-progress final day and record which day the file represents.
fn trim_partial_day(path: &Path, doc: SnapshotDocument) -> Result<Snapshot> {
    let missing = |metric| MetricsError::MissingSeries {
        path: path.to_path_buf(),
        metric,
    };

    let mut pageviews = doc.pageviews.ok_or_else(|| missing(Metric::Pageviews))?.data;
    let mut visitors = doc.visitors.ok_or_else(|| missing(Metric::Visitors))?.data;

    let (day, _) = pageviews.pop().ok_or_else(|| MetricsError::EmptySeries {
        path: path.to_path_buf(),
        metric: Metric::Pageviews,
    })?;
    if visitors.pop().is_none() {
        debug!("Empty visitors series in {}", path.display());
    }

    let sources = doc.sources.map(|s| s.data).unwrap_or_default();

    Ok(Snapshot {
        path: path.to_path_buf(),
        day,
        pageviews,
        visitors,
        sources,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
