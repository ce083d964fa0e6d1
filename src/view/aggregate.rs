use std::collections::BTreeMap;

use crate::data::filter::FilteredView;
use crate::data::model::{InvestmentRecord, SubSegment};

// ---------------------------------------------------------------------------
// Grouped totals for the charts
// ---------------------------------------------------------------------------

/// Count and summed investment size of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub label: String,
    pub count: usize,
    pub total: f64,
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total_size: f64,
    pub count: usize,
    pub average_size: f64,
}

pub fn summary(view: &FilteredView<'_>) -> Summary {
    let total_size: f64 = view.records().map(|r| r.investment_size).sum();
    let count = view.len();
    let average_size = if count == 0 { 0.0 } else { total_size / count as f64 };
    Summary {
        total_size,
        count,
        average_size,
    }
}

fn group_by<F>(view: &FilteredView<'_>, key: F) -> BTreeMap<String, GroupTotal>
where
    F: Fn(&InvestmentRecord) -> String,
{
    let mut groups: BTreeMap<String, GroupTotal> = BTreeMap::new();
    for rec in view.records() {
        let label = key(rec);
        let entry = groups.entry(label.clone()).or_insert(GroupTotal {
            label,
            count: 0,
            total: 0.0,
        });
        entry.count += 1;
        entry.total += rec.investment_size;
    }
    groups
}

/// Largest total first; equal totals fall back to label order.
fn by_total_desc(groups: BTreeMap<String, GroupTotal>) -> Vec<GroupTotal> {
    let mut out: Vec<GroupTotal> = groups.into_values().collect();
    out.sort_by(|a, b| b.total.total_cmp(&a.total));
    out
}

/// Pie chart data: counts and sums per sub-segment, in vocabulary order.
/// Segments with no rows are omitted.
pub fn by_sub_segment(view: &FilteredView<'_>) -> Vec<GroupTotal> {
    let mut groups = group_by(view, |r| r.sub_segment.as_str().to_string());
    SubSegment::ALL
        .into_iter()
        .filter_map(|seg| groups.remove(seg.as_str()))
        .collect()
}

/// Bar chart data: sums per region, largest first.
pub fn by_region(view: &FilteredView<'_>) -> Vec<GroupTotal> {
    by_total_desc(group_by(view, |r| r.region.clone()))
}

pub fn by_fund_type(view: &FilteredView<'_>) -> Vec<GroupTotal> {
    by_total_desc(group_by(view, |r| r.fund_type.clone()))
}

pub const DOMESTIC_LABEL: &str = "Israel";
pub const INTERNATIONAL_LABEL: &str = "International";

pub fn is_domestic(region: &str) -> bool {
    matches!(
        region.trim().to_lowercase().as_str(),
        "israel" | "ישראל" | "il"
    )
}

/// Domestic vs. international exposure.
pub fn domestic_split(view: &FilteredView<'_>) -> Vec<GroupTotal> {
    let mut groups = group_by(view, |r| {
        if is_domestic(&r.region) {
            DOMESTIC_LABEL.to_string()
        } else {
            INTERNATIONAL_LABEL.to_string()
        }
    });
    [DOMESTIC_LABEL, INTERNATIONAL_LABEL]
        .into_iter()
        .filter_map(|label| groups.remove(label))
        .collect()
}
