use std::collections::BTreeMap;

use crate::color::ColorMap;
use crate::data::filter::{FilterSelection, FilterState};
use crate::data::loader::LoadReport;
use crate::data::model::{Dataset, FilterAxis};
use crate::error::RenderError;
use crate::view::aggregate::{DOMESTIC_LABEL, INTERNATIONAL_LABEL};
use crate::view::table::{PageSpec, SortDirection, SortSpec, TableColumn};
use crate::view::trend::Period;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything loaded at startup. Shared read-only between requests.
#[derive(Debug)]
pub struct AppState {
    pub dataset: Dataset,
    pub report: LoadReport,

    /// Extra labelled files for the period comparison, sorted by label.
    pub periods: Vec<Period>,

    /// Per-axis colours, built from the full dataset.
    pub colors: BTreeMap<FilterAxis, ColorMap>,
    pub domestic_colors: ColorMap,

    /// Per-axis colours for the period comparison.
    pub period_colors: BTreeMap<FilterAxis, ColorMap>,

    pub default_page_size: usize,
}

impl AppState {
    pub fn new(
        dataset: Dataset,
        report: LoadReport,
        mut periods: Vec<Period>,
        default_page_size: usize,
    ) -> Self {
        periods.sort_by(|a, b| a.label.cmp(&b.label));

        let colors = FilterAxis::ALL
            .into_iter()
            .map(|axis| (axis, ColorMap::new(dataset.labels(axis))))
            .collect();

        let period_colors = FilterAxis::ALL
            .into_iter()
            .map(|axis| {
                let mut labels: Vec<&str> =
                    periods.iter().flat_map(|p| p.dataset.labels(axis)).collect();
                labels.sort_unstable();
                labels.dedup();
                (axis, ColorMap::new(labels))
            })
            .collect();

        AppState {
            dataset,
            report,
            periods,
            colors,
            domestic_colors: ColorMap::new([DOMESTIC_LABEL, INTERNATIONAL_LABEL]),
            period_colors,
            default_page_size: default_page_size.max(1),
        }
    }

    pub fn colors(&self, axis: FilterAxis) -> &ColorMap {
        &self.colors[&axis]
    }

    pub fn period_colors(&self, axis: FilterAxis) -> &ColorMap {
        &self.period_colors[&axis]
    }
}

// ---------------------------------------------------------------------------
// Per-request view state
// ---------------------------------------------------------------------------

/// Filter, sort and page choices of one request, carried in the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub selection: FilterSelection,
    pub sort: SortSpec,
    pub page: PageSpec,
}

impl ViewRequest {
    /// Everything unfiltered, largest investments first.
    pub fn initial(default_page_size: usize) -> Self {
        ViewRequest {
            selection: FilterSelection::default(),
            sort: SortSpec::default(),
            page: PageSpec {
                offset: 0,
                page_size: default_page_size,
            },
        }
    }

    /// Parse query pairs. Axis keys may repeat; empty values (the "All"
    /// option) and unrelated keys are ignored.
    pub fn from_query(
        dataset: &Dataset,
        pairs: &[(String, String)],
        default_page_size: usize,
    ) -> Result<Self, RenderError> {
        let mut request = ViewRequest::initial(default_page_size);
        let mut chosen: BTreeMap<FilterAxis, Vec<&str>> = BTreeMap::new();
        let mut sort_column = None;
        let mut direction = None;

        for (key, value) in pairs {
            let value = value.trim();
            if let Some(axis) = FilterAxis::from_key(key) {
                if !value.is_empty() {
                    chosen.entry(axis).or_default().push(value);
                }
                continue;
            }
            match key.as_str() {
                "sort" if !value.is_empty() => sort_column = Some(value.parse::<TableColumn>()?),
                "dir" if !value.is_empty() => direction = Some(value.parse::<SortDirection>()?),
                "offset" => request.page.offset = parse_number(key, value)?,
                "page_size" => request.page.page_size = parse_number(key, value)?,
                _ => {}
            }
        }

        let mut filters = FilterState::new(dataset);
        for (axis, values) in chosen {
            filters.set_selection(axis, values)?;
        }
        request.selection = filters.current_filter();

        if let Some(column) = sort_column {
            request.sort = SortSpec {
                column,
                direction: direction.unwrap_or_else(|| default_direction(column)),
            };
        } else if let Some(direction) = direction {
            request.sort.direction = direction;
        }
        Ok(request)
    }

    /// Query string reproducing this request (without the leading `?`).
    pub fn to_query(&self) -> String {
        let mut parts = self.filter_pairs();
        parts.push(format!("sort={}", self.sort.column.key()));
        parts.push(format!("dir={}", self.sort.direction.key()));
        parts.push(format!("page_size={}", self.page.page_size));
        if self.page.offset > 0 {
            parts.push(format!("offset={}", self.page.offset));
        }
        parts.join("&")
    }

    /// Query string carrying only the filters, for the CSV export.
    pub fn filter_query(&self) -> String {
        self.filter_pairs().join("&")
    }

    fn filter_pairs(&self) -> Vec<String> {
        FilterAxis::ALL
            .into_iter()
            .flat_map(|axis| {
                self.selection
                    .values(axis)
                    .map(move |v| format!("{}={}", axis.key(), urlencoding::encode(v)))
            })
            .collect()
    }

    /// Sort by `column`, flipping direction when it is already the sort
    /// column. Returns to the first page.
    pub fn with_sort(&self, column: TableColumn) -> Self {
        let direction = if self.sort.column == column {
            self.sort.direction.reversed()
        } else {
            default_direction(column)
        };
        ViewRequest {
            sort: SortSpec { column, direction },
            page: PageSpec {
                offset: 0,
                ..self.page
            },
            ..self.clone()
        }
    }

    pub fn with_offset(&self, offset: usize) -> Self {
        ViewRequest {
            page: PageSpec {
                offset,
                ..self.page
            },
            ..self.clone()
        }
    }
}

fn default_direction(column: TableColumn) -> SortDirection {
    match column {
        TableColumn::InvestmentSize => SortDirection::Desc,
        _ => SortDirection::Asc,
    }
}

fn parse_number(param: &str, value: &str) -> Result<usize, RenderError> {
    value.parse().map_err(|_| RenderError::InvalidNumber {
        param: param.to_string(),
        value: value.to_string(),
    })
}
