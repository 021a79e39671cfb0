use crate::models::{AggregateMetrics, InsightRow};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Bucket for rows whose grouping dimension is absent. Such rows are kept,
/// not dropped.
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Impressions,
    Clicks,
    Spend,
    Reach,
    Ctr,
    Cpc,
    Cpm,
    Frequency,
}

/// Which way a change in the metric is good news. Applied at display time
/// only; percent-change values themselves are never sign-flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl MetricKind {
    pub fn direction(self) -> Direction {
        match self {
            MetricKind::Cpc | MetricKind::Cpm => Direction::LowerIsBetter,
            _ => Direction::HigherIsBetter,
        }
    }
}

impl AggregateMetrics {
    pub fn value(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Impressions => self.impressions as f64,
            MetricKind::Clicks => self.clicks as f64,
            MetricKind::Spend => self.spend,
            MetricKind::Reach => self.reach as f64,
            MetricKind::Ctr => self.ctr,
            MetricKind::Cpc => self.cpc,
            MetricKind::Cpm => self.cpm,
            MetricKind::Frequency => self.frequency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupedMetrics {
    pub key: String,
    #[serde(flatten)]
    pub metrics: AggregateMetrics,
}

/// One placement bucket: the platform/position/device combination where an
/// ad was shown, with its aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementGroup {
    pub platform: String,
    pub position: String,
    pub device: String,
    #[serde(flatten)]
    pub metrics: AggregateMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionTotal {
    pub action_type: String,
    pub value: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    impressions: u64,
    clicks: u64,
    spend: f64,
    reach: u64,
}

impl Accumulator {
    fn add(&mut self, row: &InsightRow) {
        self.impressions = self.impressions.saturating_add(row.impressions);
        self.clicks = self.clicks.saturating_add(row.clicks);
        self.spend += row.spend;
        self.reach = self.reach.saturating_add(row.reach);
    }

    fn finish(&self) -> AggregateMetrics {
        AggregateMetrics::from_sums(self.impressions, self.clicks, self.spend, self.reach)
    }
}

/// Groups rows by the key the selector yields and sums the four counters per
/// group; ratios are derived from the group sums once all rows are consumed.
///
/// Output order is insertion order of first key occurrence. Rows for which
/// the selector yields `None` land in the [`UNKNOWN_GROUP`] bucket.
pub fn aggregate_by<F>(rows: &[InsightRow], selector: F) -> Vec<GroupedMetrics>
where
    F: Fn(&InsightRow) -> Option<String>,
{
    let mut groups: Vec<(String, Accumulator)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = selector(row).unwrap_or_else(|| UNKNOWN_GROUP.to_string());
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                index.insert(key.clone(), slot);
                groups.push((key, Accumulator::default()));
                slot
            }
        };
        groups[slot].1.add(row);
    }

    groups
        .into_iter()
        .map(|(key, acc)| GroupedMetrics {
            key,
            metrics: acc.finish(),
        })
        .collect()
}

/// Flat total over all rows (the constant-key grouping).
pub fn aggregate_all(rows: &[InsightRow]) -> AggregateMetrics {
    let mut acc = Accumulator::default();
    for row in rows {
        acc.add(row);
    }
    acc.finish()
}

/// Groups by the full placement triple. Missing dimensions fall back to the
/// unknown bucket per axis.
pub fn aggregate_placements(rows: &[InsightRow]) -> Vec<PlacementGroup> {
    let mut groups: Vec<((String, String, String), Accumulator)> = Vec::new();
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for row in rows {
        let key = (
            dimension(&row.platform),
            dimension(&row.position),
            dimension(&row.device),
        );
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                index.insert(key.clone(), slot);
                groups.push((key, Accumulator::default()));
                slot
            }
        };
        groups[slot].1.add(row);
    }

    groups
        .into_iter()
        .map(|((platform, position, device), acc)| PlacementGroup {
            platform,
            position,
            device,
            metrics: acc.finish(),
        })
        .collect()
}

fn dimension(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| UNKNOWN_GROUP.to_string())
}

/// Per-action-type totals across all rows, insertion ordered.
pub fn sum_actions(rows: &[InsightRow]) -> Vec<ActionTotal> {
    let mut totals: Vec<ActionTotal> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        for action in &row.actions {
            match index.get(&action.action_type) {
                Some(&slot) => totals[slot].value += action.value,
                None => {
                    index.insert(action.action_type.clone(), totals.len());
                    totals.push(ActionTotal {
                        action_type: action.action_type.clone(),
                        value: action.value,
                    });
                }
            }
        }
    }

    totals
}

/// Sorts groups descending by the chosen metric and keeps the first `limit`.
/// Callers wanting a top-N view opt in here; `aggregate_by` itself never
/// reorders.
pub fn top_by(mut groups: Vec<GroupedMetrics>, metric: MetricKind, limit: usize) -> Vec<GroupedMetrics> {
    groups.sort_by(|a, b| {
        b.metrics
            .value(metric)
            .partial_cmp(&a.metrics.value(metric))
            .unwrap_or(Ordering::Equal)
    });
    groups.truncate(limit);
    groups
}

/// Signed period-over-period change in percent. `None` whenever the previous
/// value is zero: a 0 -> 0 comparison is undefined, and a 0 -> positive one
/// has no meaningful percentage (callers label it "new" instead of
/// fabricating an infinite value).
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

/// Sorts rows ascending by date. Rows without a parseable date sort first.
/// Numeric coercion already happened at deserialization, so applying this to
/// its own output is a no-op.
pub fn normalize_series(mut rows: Vec<InsightRow>) -> Vec<InsightRow> {
    rows.sort_by_key(|row| row.date);
    rows
}
