use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Milliseconds in one calendar day.
pub const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Milliseconds since the Unix epoch, truncated to a day boundary.
pub type DayTimestamp = i64;

/// Merged raw series: one value per day.
pub type DaySeries = BTreeMap<DayTimestamp, u64>;

/// Derived series: one averaged value per day.
pub type AverageSeries = BTreeMap<DayTimestamp, f64>;

/// The series carried by a snapshot export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Pageviews,
    Visitors,
    Sources,
}

impl Metric {
    /// Key used for the metric in snapshot files and in grouped output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Pageviews => "pageviews",
            Metric::Visitors => "visitors",
            Metric::Sources => "sources",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── On-disk snapshot shape ────────────────────────────────────────────────────

/// A `{data: [[ms, value], ...]}` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointList {
    pub data: Vec<(DayTimestamp, u64)>,
}

/// One referrer row of the `sources` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Referrer path; empty for direct traffic.
    pub path: String,
    pub count: u64,
}

/// A `{data: [{path, count}, ...]}` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceList {
    pub data: Vec<SourceEntry>,
}

/// A snapshot file as exported by the hosting platform.
///
/// Other export sections (`pages`, `bandwidth`, `not_found`, ...) are
/// accepted and ignored. Older exports have no `sources` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub pageviews: Option<PointList>,
    pub visitors: Option<PointList>,
    pub sources: Option<SourceList>,
}

// ── Loaded snapshot ───────────────────────────────────────────────────────────

/// A parsed snapshot with its partial final day already removed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// File the snapshot was read from.
    pub path: PathBuf,
    /// The day this file represents: the timestamp of the dropped
    /// final pageviews point.
    pub day: DayTimestamp,
    /// Complete pageview days.
    pub pageviews: Vec<(DayTimestamp, u64)>,
    /// Complete visitor days.
    pub visitors: Vec<(DayTimestamp, u64)>,
    /// Referrer counts for `day`.
    pub sources: Vec<SourceEntry>,
}

impl Snapshot {
    /// Points recorded for `metric`. Sources are not point series and yield
    /// an empty slice.
    pub fn points(&self, metric: Metric) -> &[(DayTimestamp, u64)] {
        match metric {
            Metric::Pageviews => &self.pageviews,
            Metric::Visitors => &self.visitors,
            Metric::Sources => &[],
        }
    }
}

// ── Merged data ───────────────────────────────────────────────────────────────

/// Every snapshot folded into one deduplicated time series per metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedData {
    pub pageviews: DaySeries,
    pub visitors: DaySeries,
    /// Referrer path → day → count.
    pub sources: BTreeMap<String, DaySeries>,
}

impl MergedData {
    /// Mutable access to the raw series of a point metric.
    ///
    /// Returns `None` for [`Metric::Sources`].
    pub fn series_mut(&mut self, metric: Metric) -> Option<&mut DaySeries> {
        match metric {
            Metric::Pageviews => Some(&mut self.pageviews),
            Metric::Visitors => Some(&mut self.visitors),
            Metric::Sources => None,
        }
    }
}

/// The 7-day averages derived from [`MergedData`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AveragedData {
    pub pageviews: AverageSeries,
    pub visitors: AverageSeries,
}
