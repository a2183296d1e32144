//! Cross-file merging of snapshot series.
//!
//! Consecutive exports overlap heavily: each one repeats the previous weeks
//! of daily values. Overlapping days must agree exactly, otherwise the run is
//! aborted with [`MetricsError::Mismatch`].

use std::path::Path;

use metrics_core::error::{MetricsError, Result};
use metrics_core::models::{DayTimestamp, MergedData, Metric, Snapshot};
use metrics_core::time_utils::DateFormatter;
use tracing::debug;

// ── SeriesAggregator ──────────────────────────────────────────────────────────

/// Folds snapshots into one [`MergedData`].
///
/// The result does not depend on the order snapshots are added in; only
/// which file is named in a mismatch report does.
#[derive(Debug)]
pub struct SeriesAggregator {
    data: MergedData,
    dates: DateFormatter,
    snapshots: usize,
}

impl SeriesAggregator {
    /// `dates` renders the day named in mismatch reports.
    pub fn new(dates: DateFormatter) -> Self {
        Self {
            data: MergedData::default(),
            dates,
            snapshots: 0,
        }
    }

    /// Merge every snapshot in turn, stopping at the first conflict.
    pub fn merge_all<'a>(
        snapshots: impl IntoIterator<Item = &'a Snapshot>,
        dates: DateFormatter,
    ) -> Result<MergedData> {
        let mut aggregator = Self::new(dates);
        for snapshot in snapshots {
            aggregator.add_snapshot(snapshot)?;
        }
        debug!("Merged {} snapshots", aggregator.snapshots_merged());
        Ok(aggregator.finish())
    }

    /// Merge one snapshot's pageviews, visitors and sources.
    pub fn add_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        for metric in [Metric::Pageviews, Metric::Visitors] {
            self.merge_points(metric, snapshot.points(metric), &snapshot.path)?;
        }

        // Each file reports sources for its own day only, so there is
        // nothing to cross-check.
        for source in &snapshot.sources {
            self.data
                .sources
                .entry(source.path.clone())
                .or_default()
                .insert(snapshot.day, source.count);
        }

        self.snapshots += 1;
        debug!(
            "Merged {} ({} pageview days, {} visitor days, {} sources)",
            snapshot.path.display(),
            snapshot.pageviews.len(),
            snapshot.visitors.len(),
            snapshot.sources.len()
        );
        Ok(())
    }

    /// Number of snapshots merged so far.
    pub fn snapshots_merged(&self) -> usize {
        self.snapshots
    }

    /// Consume the aggregator and return the merged series.
    pub fn finish(self) -> MergedData {
        self.data
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn merge_points(
        &mut self,
        metric: Metric,
        points: &[(DayTimestamp, u64)],
        path: &Path,
    ) -> Result<()> {
        let Some(series) = self.data.series_mut(metric) else {
            return Ok(());
        };

        for &(day, value) in points {
            let recorded = *series.entry(day).or_insert(value);
            if recorded != value {
                return Err(MetricsError::Mismatch {
                    date: self.dates.format_day(day),
                    metric,
                    previous: recorded,
                    found: value,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_core::error::FaultKind;
    use metrics_core::models::{DaySeries, SourceEntry, MS_PER_DAY};
    use std::path::PathBuf;

    fn snapshot(name: &str, day: i64, pageviews: &[(i64, u64)], visitors: &[(i64, u64)]) -> Snapshot {
        Snapshot {
            path: PathBuf::from(name),
            day: day * MS_PER_DAY,
            pageviews: pageviews.iter().map(|&(d, v)| (d * MS_PER_DAY, v)).collect(),
            visitors: visitors.iter().map(|&(d, v)| (d * MS_PER_DAY, v)).collect(),
            sources: Vec::new(),
        }
    }

    fn with_sources(mut snapshot: Snapshot, sources: &[(&str, u64)]) -> Snapshot {
        snapshot.sources = sources
            .iter()
            .map(|&(path, count)| SourceEntry {
                path: path.to_string(),
                count,
            })
            .collect();
        snapshot
    }

    #[test]
    fn test_disjoint_days_are_unioned() {
        // File A: [[0,10],[1,20]] → {0:10}; file B: [[1,15],[2,30]] → {1:15}.
        let a = snapshot("a.json", 1, &[(0, 10)], &[(0, 1)]);
        let b = snapshot("b.json", 2, &[(1, 15)], &[(1, 2)]);

        let merged = SeriesAggregator::merge_all([&a, &b], DateFormatter::utc()).unwrap();
        assert_eq!(merged.pageviews, DaySeries::from([(0, 10), (MS_PER_DAY, 15)]));
        assert_eq!(merged.visitors, DaySeries::from([(0, 1), (MS_PER_DAY, 2)]));
    }

    #[test]
    fn test_matching_overlap_is_accepted() {
        let a = snapshot("a.json", 3, &[(0, 10), (1, 11), (2, 12)], &[]);
        let b = snapshot("b.json", 4, &[(1, 11), (2, 12), (3, 13)], &[]);

        let merged = SeriesAggregator::merge_all([&a, &b], DateFormatter::utc()).unwrap();
        assert_eq!(merged.pageviews.len(), 4);
        assert_eq!(merged.pageviews[&(3 * MS_PER_DAY)], 13);
    }

    #[test]
    fn test_conflicting_pageviews_is_fatal() {
        let a = snapshot("a.json", 2, &[(0, 10), (1, 20)], &[]);
        let b = snapshot("b.json", 3, &[(1, 21), (2, 30)], &[]);

        let err = SeriesAggregator::merge_all([&a, &b], DateFormatter::utc()).unwrap_err();
        assert_eq!(err.kind(), FaultKind::Consistency);
        match err {
            MetricsError::Mismatch {
                date,
                metric,
                previous,
                found,
                path,
            } => {
                assert_eq!(date, "1970-01-02");
                assert_eq!(metric, Metric::Pageviews);
                assert_eq!(previous, 20);
                assert_eq!(found, 21);
                assert_eq!(path, PathBuf::from("b.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conflicting_visitors_names_series() {
        let a = snapshot("a.json", 1, &[(0, 10)], &[(0, 4)]);
        let b = snapshot("b.json", 1, &[(0, 10)], &[(0, 5)]);

        let err = SeriesAggregator::merge_all([&a, &b], DateFormatter::utc()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data mismatch on 1970-01-01 (visitors): 4 from before and 5 found in file b.json"
        );
    }

    #[test]
    fn test_merge_is_order_independent() {
        let snapshots = vec![
            with_sources(
                snapshot("a.json", 2, &[(0, 10), (1, 11)], &[(0, 3), (1, 4)]),
                &[("", 7), ("github.com", 1)],
            ),
            with_sources(
                snapshot("b.json", 3, &[(1, 11), (2, 12)], &[(1, 4), (2, 5)]),
                &[("", 8)],
            ),
            with_sources(
                snapshot("c.json", 5, &[(3, 13), (4, 14)], &[(3, 6), (4, 7)]),
                &[("news.ycombinator.com", 40)],
            ),
        ];

        let forward = SeriesAggregator::merge_all(&snapshots, DateFormatter::utc()).unwrap();
        let reversed =
            SeriesAggregator::merge_all(snapshots.iter().rev(), DateFormatter::utc()).unwrap();
        let rotated = SeriesAggregator::merge_all(
            [&snapshots[1], &snapshots[2], &snapshots[0]],
            DateFormatter::utc(),
        )
        .unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
    }

    #[test]
    fn test_sources_keyed_by_file_day() {
        let a = with_sources(snapshot("a.json", 2, &[(0, 1), (1, 1)], &[]), &[("", 7)]);
        let b = with_sources(
            snapshot("b.json", 3, &[(1, 1), (2, 1)], &[]),
            &[("", 9), ("github.com", 2)],
        );

        let merged = SeriesAggregator::merge_all([&a, &b], DateFormatter::utc()).unwrap();
        assert_eq!(
            merged.sources[""],
            DaySeries::from([(2 * MS_PER_DAY, 7), (3 * MS_PER_DAY, 9)])
        );
        assert_eq!(
            merged.sources["github.com"],
            DaySeries::from([(3 * MS_PER_DAY, 2)])
        );
    }

    #[test]
    fn test_snapshots_merged_counter() {
        let mut aggregator = SeriesAggregator::new(DateFormatter::utc());
        assert_eq!(aggregator.snapshots_merged(), 0);
        aggregator
            .add_snapshot(&snapshot("a.json", 1, &[(0, 1)], &[(0, 1)]))
            .unwrap();
        assert_eq!(aggregator.snapshots_merged(), 1);
        assert_eq!(aggregator.finish().pageviews.len(), 1);
    }
}
