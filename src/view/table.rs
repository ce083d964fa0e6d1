use std::cmp::Ordering;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::data::filter::FilteredView;
use crate::data::model::InvestmentRecord;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Sort & page specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumn {
    FundName,
    Description,
    Region,
    FundType,
    SubSegment,
    InvestmentSize,
}

impl TableColumn {
    pub const ALL: [TableColumn; 6] = [
        TableColumn::FundName,
        TableColumn::Description,
        TableColumn::Region,
        TableColumn::FundType,
        TableColumn::SubSegment,
        TableColumn::InvestmentSize,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TableColumn::FundName => "fund_name",
            TableColumn::Description => "description",
            TableColumn::Region => "region",
            TableColumn::FundType => "fund_type",
            TableColumn::SubSegment => "sub_segment",
            TableColumn::InvestmentSize => "investment_size",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TableColumn::FundName => "Fund",
            TableColumn::Description => "Description",
            TableColumn::Region => "Region",
            TableColumn::FundType => "Fund type",
            TableColumn::SubSegment => "Sub-segment",
            TableColumn::InvestmentSize => "Investment size",
        }
    }

    fn compare(self, a: &InvestmentRecord, b: &InvestmentRecord) -> Ordering {
        match self {
            TableColumn::FundName => a.fund_name.cmp(&b.fund_name),
            TableColumn::Description => a.description.cmp(&b.description),
            TableColumn::Region => a.region.cmp(&b.region),
            TableColumn::FundType => a.fund_type.cmp(&b.fund_type),
            TableColumn::SubSegment => a.sub_segment.as_str().cmp(b.sub_segment.as_str()),
            TableColumn::InvestmentSize => a.investment_size.total_cmp(&b.investment_size),
        }
    }
}

impl FromStr for TableColumn {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableColumn::ALL
            .into_iter()
            .find(|col| col.key() == s)
            .ok_or_else(|| RenderError::UnknownColumn(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn key(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(RenderError::UnknownDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: TableColumn,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            column: TableColumn::InvestmentSize,
            direction: SortDirection::Desc,
        }
    }
}

/// Largest page a request may ask for.
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub offset: usize,
    pub page_size: usize,
}

// ---------------------------------------------------------------------------
// Table projection
// ---------------------------------------------------------------------------

/// One page of sorted rows plus the numbers the pager needs.
#[derive(Debug, Clone)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a InvestmentRecord>,
    pub offset: usize,
    pub page_size: usize,
    pub total: usize,
}

impl TablePage<'_> {
    /// 1-based page number of `offset`.
    pub fn page_number(&self) -> usize {
        self.offset / self.page_size + 1
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size).max(1)
    }

    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.page_size))
    }

    pub fn next_offset(&self) -> Option<usize> {
        self.offset
            .checked_add(self.page_size)
            .filter(|&next| next < self.total)
    }
}

/// All filtered rows, stably sorted.
pub fn sorted_rows<'a>(view: &FilteredView<'a>, sort: &SortSpec) -> Vec<&'a InvestmentRecord> {
    let mut rows: Vec<&InvestmentRecord> = view.records().collect();
    rows.sort_by(|a, b| {
        let ord = sort.column.compare(a, b);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    rows
}

/// Sort then slice the filtered rows.
pub fn table_page<'a>(
    view: &FilteredView<'a>,
    sort: &SortSpec,
    page: &PageSpec,
) -> Result<TablePage<'a>, RenderError> {
    if page.page_size == 0 || page.page_size > MAX_PAGE_SIZE {
        return Err(RenderError::InvalidPageSize(page.page_size));
    }
    let total = view.len();
    if page.offset > 0 && page.offset >= total {
        return Err(RenderError::PageOutOfRange {
            offset: page.offset,
            total,
        });
    }

    let rows = sorted_rows(view, sort)
        .into_iter()
        .skip(page.offset)
        .take(page.page_size)
        .collect();

    Ok(TablePage {
        rows,
        offset: page.offset,
        page_size: page.page_size,
        total,
    })
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Fund Name")]
    fund_name: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Region")]
    region: &'a str,
    #[serde(rename = "Fund Type")]
    fund_type: &'a str,
    #[serde(rename = "Sub-Segment")]
    sub_segment: &'a str,
    #[serde(rename = "Investment Size")]
    investment_size: f64,
}

/// Write rows as CSV with a UTF-8 BOM so spreadsheet tools pick up the
/// encoding of Hebrew text.
pub fn write_csv<W: Write>(rows: &[&InvestmentRecord], mut out: W) -> Result<(), csv::Error> {
    out.write_all("\u{feff}".as_bytes())?;
    let mut writer = csv::Writer::from_writer(out);
    for rec in rows {
        writer.serialize(CsvRow {
            fund_name: &rec.fund_name,
            description: &rec.description,
            region: &rec.region,
            fund_type: &rec.fund_type,
            sub_segment: rec.sub_segment.as_str(),
            investment_size: rec.investment_size,
        })?;
    }
    writer.flush()?;
    Ok(())
}
