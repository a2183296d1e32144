//! Chart-series construction and output serialization.
//!
//! Every finalized day→value map is turned into a [`ChartSeries`]: a label
//! plus two index-aligned arrays sorted by day. The series are grouped per
//! category in [`Graphs`], which can be rendered in either output layout.

use std::collections::BTreeMap;
use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AveragedData, DayTimestamp, MergedData, Metric};

/// Label substituted for the empty referrer path.
pub const DIRECT_LABEL: &str = "direct";

// ── OutputLayout ──────────────────────────────────────────────────────────────

/// Shape of the emitted chart document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// `{pageviews: [...], visitors: [...], sources: [...]}`
    #[default]
    Grouped,
    /// `[Pageviews, PV (7 day), Visitors, Visitors (7 day)]`
    Flat,
}

impl OutputLayout {
    /// Labels used for the four pageview/visitor series in this layout.
    pub fn labels(self) -> SeriesLabels {
        match self {
            OutputLayout::Grouped => SeriesLabels {
                pageviews: "Pageviews",
                pageviews_avg: "7 day avg",
                visitors: "Visitors",
                visitors_avg: "7 day avg",
            },
            OutputLayout::Flat => SeriesLabels {
                pageviews: "Pageviews",
                pageviews_avg: "PV (7 day)",
                visitors: "Visitors",
                visitors_avg: "Visitors (7 day)",
            },
        }
    }
}

/// Display labels of the raw and averaged series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesLabels {
    pub pageviews: &'static str,
    pub pageviews_avg: &'static str,
    pub visitors: &'static str,
    pub visitors_avg: &'static str,
}

/// Chart label for a referrer path.
pub fn source_label(path: &str) -> &str {
    if path.is_empty() {
        DIRECT_LABEL
    } else {
        path
    }
}

// ── ChartSeries ───────────────────────────────────────────────────────────────

/// One y-value. Raw counts stay integers in the output; averages are floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sample {
    Count(u64),
    Mean(f64),
}

impl From<u64> for Sample {
    fn from(v: u64) -> Self {
        Sample::Count(v)
    }
}

impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Sample::Mean(v)
    }
}

/// A labelled line: `x` holds ascending days, `y` the value for each day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub x: Vec<DayTimestamp>,
    pub y: Vec<Sample>,
}

impl ChartSeries {
    /// Split a day-keyed map into aligned `x`/`y` arrays.
    pub fn from_points<V>(label: impl Into<String>, points: &BTreeMap<DayTimestamp, V>) -> Self
    where
        V: Copy + Into<Sample>,
    {
        let (x, y) = points.iter().map(|(&day, &v)| (day, v.into())).unzip();
        Self {
            label: label.into(),
            x,
            y,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ── Graphs ────────────────────────────────────────────────────────────────────

/// Chart series grouped by category.
///
/// For `pageviews` and `visitors` the raw series is always first and the
/// 7-day average second.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graphs {
    categories: BTreeMap<Metric, Vec<ChartSeries>>,
}

/// Borrowed view of [`Graphs`] in one of the two output shapes.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChartDocument<'a> {
    Grouped(BTreeMap<Metric, &'a [ChartSeries]>),
    Flat(Vec<&'a ChartSeries>),
}

impl Graphs {
    /// All series of a category, or an empty slice.
    pub fn category(&self, metric: Metric) -> &[ChartSeries] {
        self.categories
            .get(&metric)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The unaveraged series of a point metric.
    pub fn raw_series(&self, metric: Metric) -> Option<&ChartSeries> {
        match metric {
            Metric::Sources => None,
            _ => self.category(metric).first(),
        }
    }

    /// Shape the series for serialization.
    ///
    /// The flat layout carries exactly the four pageview/visitor series and
    /// leaves sources out.
    pub fn document(&self, layout: OutputLayout) -> ChartDocument<'_> {
        match layout {
            OutputLayout::Grouped => ChartDocument::Grouped(
                [Metric::Pageviews, Metric::Visitors, Metric::Sources]
                    .into_iter()
                    .map(|m| (m, self.category(m)))
                    .collect(),
            ),
            OutputLayout::Flat => ChartDocument::Flat(
                self.category(Metric::Pageviews)
                    .iter()
                    .chain(self.category(Metric::Visitors))
                    .collect(),
            ),
        }
    }

    /// Serialize the whole document to a string.
    pub fn render(&self, layout: OutputLayout, pretty: bool) -> Result<String> {
        let doc = self.document(layout);
        let rendered = if pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(rendered)
    }
}

/// Build every chart series from the merged and averaged data.
pub fn build_graphs(data: &MergedData, averages: &AveragedData, layout: OutputLayout) -> Graphs {
    let labels = layout.labels();
    let mut categories = BTreeMap::new();

    categories.insert(
        Metric::Pageviews,
        vec![
            ChartSeries::from_points(labels.pageviews, &data.pageviews),
            ChartSeries::from_points(labels.pageviews_avg, &averages.pageviews),
        ],
    );
    categories.insert(
        Metric::Visitors,
        vec![
            ChartSeries::from_points(labels.visitors, &data.visitors),
            ChartSeries::from_points(labels.visitors_avg, &averages.visitors),
        ],
    );
    categories.insert(
        Metric::Sources,
        data.sources
            .iter()
            .map(|(path, days)| ChartSeries::from_points(source_label(path), days))
            .collect(),
    );

    Graphs { categories }
}

// ── VictoriaMetrics export ────────────────────────────────────────────────────

/// One line of a VictoriaMetrics `/api/v1/import` JSON-lines file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VictoriaMetric {
    pub metric: BTreeMap<String, String>,
    pub values: Vec<Sample>,
    pub timestamps: Vec<DayTimestamp>,
}

impl VictoriaMetric {
    /// Convert a chart series into an import line named `name`.
    ///
    /// When `label_name` is non-empty the series label is attached under it.
    pub fn from_series(name: &str, label_name: &str, series: &ChartSeries) -> Self {
        let mut metric = BTreeMap::from([("__name__".to_string(), name.to_string())]);
        if !label_name.is_empty() {
            metric.insert(label_name.to_string(), series.label.clone());
        }
        Self {
            metric,
            values: series.y.clone(),
            timestamps: series.x.clone(),
        }
    }
}

/// Import lines for the raw pageview, visitor and per-source series.
pub fn victoria_metrics(graphs: &Graphs, prefix: &str) -> Vec<VictoriaMetric> {
    let mut out = Vec::new();
    for metric in [Metric::Pageviews, Metric::Visitors] {
        if let Some(series) = graphs.raw_series(metric) {
            out.push(VictoriaMetric::from_series(
                &format!("{}.{}", prefix, metric),
                "",
                series,
            ));
        }
    }
    let sources_name = format!("{}.{}", prefix, Metric::Sources);
    out.extend(
        graphs
            .category(Metric::Sources)
            .iter()
            .map(|s| VictoriaMetric::from_series(&sources_name, "source", s)),
    );
    out
}

/// Write one JSON object per line.
pub fn write_json_lines<W: Write>(mut writer: W, metrics: &[VictoriaMetric]) -> Result<()> {
    for metric in metrics {
        serde_json::to_writer(&mut writer, metric)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySeries, MS_PER_DAY};
    use serde_json::json;

    fn sample_data() -> (MergedData, AveragedData) {
        let mut data = MergedData::default();
        data.pageviews = DaySeries::from([(MS_PER_DAY, 15), (0, 10)]);
        data.visitors = DaySeries::from([(0, 4), (MS_PER_DAY, 6)]);
        data.sources
            .entry(String::new())
            .or_default()
            .insert(MS_PER_DAY, 3);
        data.sources
            .entry("news.ycombinator.com".to_string())
            .or_default()
            .insert(0, 9);

        let mut averages = AveragedData::default();
        averages.pageviews.insert(MS_PER_DAY, 12.5);
        (data, averages)
    }

    #[test]
    fn test_source_label() {
        assert_eq!(source_label(""), "direct");
        assert_eq!(source_label("github.com"), "github.com");
    }

    #[test]
    fn test_chart_series_sorted_and_aligned() {
        let points = BTreeMap::from([(2 * MS_PER_DAY, 30u64), (0, 10), (MS_PER_DAY, 20)]);
        let series = ChartSeries::from_points("Pageviews", &points);
        assert_eq!(series.x, vec![0, MS_PER_DAY, 2 * MS_PER_DAY]);
        assert_eq!(
            series.y,
            vec![Sample::Count(10), Sample::Count(20), Sample::Count(30)]
        );
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_chart_series_json_shape() {
        let points = BTreeMap::from([(0, 10u64)]);
        let series = ChartSeries::from_points("Visitors", &points);
        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            json!({"label": "Visitors", "x": [0], "y": [10]})
        );

        let avg = BTreeMap::from([(0, 2.5f64)]);
        let series = ChartSeries::from_points("7 day avg", &avg);
        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            json!({"label": "7 day avg", "x": [0], "y": [2.5]})
        );
    }

    #[test]
    fn test_grouped_document() {
        let (data, averages) = sample_data();
        let graphs = build_graphs(&data, &averages, OutputLayout::Grouped);
        let value: serde_json::Value =
            serde_json::from_str(&graphs.render(OutputLayout::Grouped, false).unwrap()).unwrap();

        assert_eq!(
            value["pageviews"],
            json!([
                {"label": "Pageviews", "x": [0, MS_PER_DAY], "y": [10, 15]},
                {"label": "7 day avg", "x": [MS_PER_DAY], "y": [12.5]},
            ])
        );
        assert_eq!(value["visitors"][0]["label"], "Visitors");
        assert_eq!(value["visitors"][1]["label"], "7 day avg");
        assert_eq!(value["visitors"][1]["x"], json!([]));
        assert_eq!(
            value["sources"],
            json!([
                {"label": "direct", "x": [MS_PER_DAY], "y": [3]},
                {"label": "news.ycombinator.com", "x": [0], "y": [9]},
            ])
        );
    }

    #[test]
    fn test_flat_document_has_four_series() {
        let (data, averages) = sample_data();
        let graphs = build_graphs(&data, &averages, OutputLayout::Flat);
        let value: serde_json::Value =
            serde_json::from_str(&graphs.render(OutputLayout::Flat, true).unwrap()).unwrap();

        let labels: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["label"].as_str().unwrap())
            .collect();
        assert_eq!(
            labels,
            vec!["Pageviews", "PV (7 day)", "Visitors", "Visitors (7 day)"]
        );
    }

    #[test]
    fn test_grouped_document_with_no_sources() {
        let graphs = build_graphs(
            &MergedData::default(),
            &AveragedData::default(),
            OutputLayout::Grouped,
        );
        let value = serde_json::to_value(graphs.document(OutputLayout::Grouped)).unwrap();
        assert_eq!(value["sources"], json!([]));
        assert_eq!(value["pageviews"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_raw_series() {
        let (data, averages) = sample_data();
        let graphs = build_graphs(&data, &averages, OutputLayout::Grouped);
        assert_eq!(graphs.raw_series(Metric::Pageviews).unwrap().label, "Pageviews");
        assert_eq!(graphs.raw_series(Metric::Visitors).unwrap().label, "Visitors");
        assert!(graphs.raw_series(Metric::Sources).is_none());
    }

    #[test]
    fn test_victoria_metrics_lines() {
        let (data, averages) = sample_data();
        let graphs = build_graphs(&data, &averages, OutputLayout::Grouped);
        let metrics = victoria_metrics(&graphs, "netlify");
        assert_eq!(metrics.len(), 4);

        assert_eq!(
            serde_json::to_value(&metrics[0]).unwrap(),
            json!({
                "metric": {"__name__": "netlify.pageviews"},
                "values": [10, 15],
                "timestamps": [0, MS_PER_DAY],
            })
        );
        assert_eq!(metrics[1].metric["__name__"], "netlify.visitors");
        assert_eq!(metrics[2].metric["__name__"], "netlify.sources");
        assert_eq!(metrics[2].metric["source"], "direct");
        assert_eq!(metrics[3].metric["source"], "news.ycombinator.com");
    }

    #[test]
    fn test_write_json_lines() {
        let (data, averages) = sample_data();
        let graphs = build_graphs(&data, &averages, OutputLayout::Grouped);
        let metrics = victoria_metrics(&graphs, "netlify");

        let mut buf = Vec::new();
        write_json_lines(&mut buf, &metrics).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 4);
        for line in text.lines() {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
    }
}
