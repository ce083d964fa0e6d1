use std::collections::{BTreeMap, BTreeSet};

use super::model::{Dataset, FilterAxis, InvestmentRecord};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Filter selection: which labels are selected per axis
// ---------------------------------------------------------------------------

/// Per-axis selection: maps axis → set of selected labels.
/// An axis that is absent or has an empty set is not filtered (show all).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    selected: BTreeMap<FilterAxis, BTreeSet<String>>,
}

impl FilterSelection {
    /// Selected labels for one axis (empty when unfiltered).
    pub fn values(&self, axis: FilterAxis) -> impl Iterator<Item = &str> {
        self.selected
            .get(&axis)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn is_selected(&self, axis: FilterAxis, value: &str) -> bool {
        self.selected
            .get(&axis)
            .is_some_and(|set| set.contains(value))
    }

    /// Whether any axis narrows the dataset.
    pub fn is_active(&self) -> bool {
        self.selected.values().any(|set| !set.is_empty())
    }

    /// Whether a record passes every filtered axis.
    pub fn matches(&self, record: &InvestmentRecord) -> bool {
        self.selected
            .iter()
            .all(|(axis, set)| set.is_empty() || set.contains(axis.value_of(record)))
    }
}

// ---------------------------------------------------------------------------
// Filter state: selection validated against the loaded labels
// ---------------------------------------------------------------------------

/// Holds the active selection for one dataset. Values are checked against the
/// labels discovered at load time.
#[derive(Debug, Clone)]
pub struct FilterState<'a> {
    dataset: &'a Dataset,
    selection: FilterSelection,
}

impl<'a> FilterState<'a> {
    /// A state with nothing selected, i.e. the full dataset.
    pub fn new(dataset: &'a Dataset) -> Self {
        FilterState {
            dataset,
            selection: FilterSelection::default(),
        }
    }

    /// Replace the selection for one axis. An empty `values` clears it.
    pub fn set_selection<I, S>(&mut self, axis: FilterAxis, values: I) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known = self.dataset.labels.get(&axis);
        let mut selected = BTreeSet::new();
        for value in values {
            let value: String = value.into();
            if !known.is_some_and(|set| set.contains(&value)) {
                return Err(RenderError::UnknownFilterValue {
                    axis: axis.key(),
                    value,
                });
            }
            selected.insert(value);
        }
        self.selection.selected.insert(axis, selected);
        Ok(())
    }

    /// Snapshot of the active selection.
    pub fn current_filter(&self) -> FilterSelection {
        self.selection.clone()
    }

    /// Indices of the records passing the current selection.
    pub fn filtered_indices(&self) -> Vec<usize> {
        filtered_indices(self.dataset, &self.selection)
    }
}

/// Return indices of records that pass all active filters, in load order.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The records passing a selection. Borrows the dataset, never copies it.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub dataset: &'a Dataset,
    pub indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, selection: &FilterSelection) -> Self {
        FilteredView {
            dataset,
            indices: filtered_indices(dataset, selection),
        }
    }

    /// The whole dataset, unfiltered.
    pub fn all(dataset: &'a Dataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a InvestmentRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SubSegment;

    fn record(name: &str, region: &str, fund_type: &str, seg: SubSegment) -> InvestmentRecord {
        InvestmentRecord {
            fund_name: name.into(),
            description: String::new(),
            region: region.into(),
            fund_type: fund_type.into(),
            investment_size: 1.0,
            sub_segment: seg,
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            record("A", "Israel", "PE", SubSegment::Buyout),
            record("B", "USA", "PE", SubSegment::Growth),
            record("C", "Israel", "Credit", SubSegment::Other),
            record("D", "Europe", "PE", SubSegment::Buyout),
        ])
    }

    #[test]
    fn no_selection_keeps_everything() {
        let ds = dataset();
        let state = FilterState::new(&ds);
        assert_eq!(state.filtered_indices(), vec![0, 1, 2, 3]);
        assert!(!state.current_filter().is_active());
    }

    #[test]
    fn empty_selection_equals_no_filter() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        state
            .set_selection(FilterAxis::Region, Vec::<String>::new())
            .unwrap();
        assert_eq!(state.filtered_indices().len(), ds.len());
    }

    #[test]
    fn axes_combine_with_and() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        state.set_selection(FilterAxis::Region, ["Israel"]).unwrap();
        assert_eq!(state.filtered_indices(), vec![0, 2]);
        state.set_selection(FilterAxis::FundType, ["PE"]).unwrap();
        assert_eq!(state.filtered_indices(), vec![0]);
    }

    #[test]
    fn values_within_an_axis_combine_with_or() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        state
            .set_selection(FilterAxis::SubSegment, ["Buyout", "Growth"])
            .unwrap();
        assert_eq!(state.filtered_indices(), vec![0, 1, 3]);
    }

    #[test]
    fn set_selection_replaces_previous_values() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        state.set_selection(FilterAxis::Region, ["USA"]).unwrap();
        state.set_selection(FilterAxis::Region, ["Europe"]).unwrap();
        let snapshot = state.current_filter();
        assert_eq!(snapshot.values(FilterAxis::Region).collect::<Vec<_>>(), vec!["Europe"]);
        assert_eq!(state.filtered_indices(), vec![3]);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        let err = state.set_selection(FilterAxis::Region, ["Mars"]).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownFilterValue {
                axis: "region",
                value: "Mars".into()
            }
        );
        // a segment label that exists in the vocabulary but not in the data
        assert!(state
            .set_selection(FilterAxis::SubSegment, ["Real Estate"])
            .is_err());
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        state.set_selection(FilterAxis::Region, ["USA"]).unwrap();
        let before = state.current_filter();
        state.set_selection(FilterAxis::Region, ["Israel"]).unwrap();
        assert!(before.is_selected(FilterAxis::Region, "USA"));
        assert!(!before.is_selected(FilterAxis::Region, "Israel"));
    }

    #[test]
    fn filtered_view_iterates_in_load_order() {
        let ds = dataset();
        let mut state = FilterState::new(&ds);
        state.set_selection(FilterAxis::FundType, ["PE"]).unwrap();
        let view = FilteredView::new(&ds, &state.current_filter());
        let names: Vec<&str> = view.records().map(|r| r.fund_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "D"]);
    }
}
