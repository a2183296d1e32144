use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::models::{AverageSeries, DaySeries, DayTimestamp, MS_PER_DAY};

/// Number of daily samples in one averaging window.
pub const WINDOW_DAYS: u8 = 7;

// ── WindowPolicy ──────────────────────────────────────────────────────────────

/// Placement of the 7-day window relative to the day it is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Each sample is spread over its own day and the six days after it, so
    /// the value reported on `d` covers `[d - 6 days, d]`.
    #[default]
    Forward,
    /// Each sample is spread over the three days either side of it, so the
    /// value reported on `d` covers `[d - 3 days, d + 3 days]`.
    Centered,
}

impl WindowPolicy {
    /// Day offsets `k` such that a sample on day `s` contributes to `s + k`.
    pub fn offsets(self) -> RangeInclusive<i64> {
        match self {
            WindowPolicy::Forward => 0..=6,
            WindowPolicy::Centered => -3..=3,
        }
    }
}

// ── Moving average ────────────────────────────────────────────────────────────

/// Compute the 7-day mean of `series` under `policy`.
///
/// Every recorded day adds `value / 7` to each day its window touches and
/// bumps that day's sample count. Only days that collected exactly seven
/// samples are kept; partial windows at the edges of the series, or around
/// gaps, are dropped rather than rescaled.
pub fn moving_average(series: &DaySeries, policy: WindowPolicy) -> AverageSeries {
    let mut avgs = AverageSeries::new();
    let mut samples: BTreeMap<DayTimestamp, u8> = BTreeMap::new();

    for (&day, &value) in series {
        for k in policy.offsets() {
            let Some(target) = day.checked_add(k * MS_PER_DAY) else {
                continue;
            };
            *avgs.entry(target).or_insert(0.0) += value as f64 / f64::from(WINDOW_DAYS);
            *samples.entry(target).or_insert(0) += 1;
        }
    }

    avgs.retain(|day, _| samples.get(day) == Some(&WINDOW_DAYS));
    avgs
}

// ── Tests ─────────────────────────────────────────────────────────────────────
