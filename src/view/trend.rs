use std::collections::BTreeMap;

use crate::data::loader::LoadReport;
use crate::data::model::{Dataset, FilterAxis};

/// A labelled extra input file, e.g. one quarter's holdings.
#[derive(Debug, Clone)]
pub struct Period {
    pub label: String,
    pub dataset: Dataset,
    pub report: LoadReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub label: String,
    /// One total per period, aligned with [`Trend::periods`].
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub periods: Vec<String>,
    pub series: Vec<TrendSeries>,
}

/// Total investment size per (period, axis label). Periods are ordered by
/// label; a label missing from a period contributes zero there.
pub fn trend(periods: &[Period], axis: FilterAxis) -> Trend {
    let mut ordered: Vec<&Period> = periods.iter().collect();
    ordered.sort_by(|a, b| a.label.cmp(&b.label));

    let mut totals: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (i, period) in ordered.iter().enumerate() {
        for rec in &period.dataset.records {
            let points = totals
                .entry(axis.value_of(rec).to_string())
                .or_insert_with(|| vec![0.0; ordered.len()]);
            points[i] += rec.investment_size;
        }
    }

    Trend {
        periods: ordered.iter().map(|p| p.label.clone()).collect(),
        series: totals
            .into_iter()
            .map(|(label, points)| TrendSeries { label, points })
            .collect(),
    }
}
