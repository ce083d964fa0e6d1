use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single raw cell, before field extraction
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from a workbook, CSV, JSON or Parquet file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Date/time cells kept as their display text.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) | CellValue::Date(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Empty strings count as missing, like blank spreadsheet cells.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) | CellValue::Date(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text of the cell, `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// SubSegment – closed vocabulary assigned by the classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubSegment {
    Buyout,
    #[serde(rename = "VC")]
    VentureCapital,
    Growth,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Other,
}

impl SubSegment {
    pub const ALL: [SubSegment; 5] = [
        SubSegment::Buyout,
        SubSegment::VentureCapital,
        SubSegment::Growth,
        SubSegment::RealEstate,
        SubSegment::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubSegment::Buyout => "Buyout",
            SubSegment::VentureCapital => "VC",
            SubSegment::Growth => "Growth",
            SubSegment::RealEstate => "Real Estate",
            SubSegment::Other => "Other",
        }
    }
}

impl fmt::Display for SubSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubSegment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubSegment::ALL
            .into_iter()
            .find(|seg| seg.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = SubSegment::ALL.iter().map(|seg| seg.as_str()).collect();
                format!("unknown sub-segment '{s}' (expected one of {})", known.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Label used when an optional categorical column is missing or blank.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One validated input row, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentRow {
    pub fund_name: String,
    pub description: String,
    pub region: String,
    pub fund_type: String,
    pub investment_size: f64,
}

/// A row with its derived sub-segment attached. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentRecord {
    pub fund_name: String,
    pub description: String,
    pub region: String,
    pub fund_type: String,
    pub investment_size: f64,
    pub sub_segment: SubSegment,
}

// ---------------------------------------------------------------------------
// Filter axes
// ---------------------------------------------------------------------------

/// The three categorical columns the page can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterAxis {
    SubSegment,
    Region,
    FundType,
}

impl FilterAxis {
    pub const ALL: [FilterAxis; 3] = [FilterAxis::SubSegment, FilterAxis::Region, FilterAxis::FundType];

    /// Query-string key used by the web shell.
    pub fn key(self) -> &'static str {
        match self {
            FilterAxis::SubSegment => "segment",
            FilterAxis::Region => "region",
            FilterAxis::FundType => "fund_type",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FilterAxis::SubSegment => "Sub-segment",
            FilterAxis::Region => "Region",
            FilterAxis::FundType => "Fund type",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FilterAxis::ALL.into_iter().find(|axis| axis.key() == key)
    }

    pub fn value_of(self, record: &InvestmentRecord) -> &str {
        match self {
            FilterAxis::SubSegment => record.sub_segment.as_str(),
            FilterAxis::Region => &record.region,
            FilterAxis::FundType => &record.fund_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete classified dataset
// ---------------------------------------------------------------------------

/// All classified records plus, per filter axis, the sorted set of labels
/// discovered in the data.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<InvestmentRecord>,
    pub labels: BTreeMap<FilterAxis, BTreeSet<String>>,
}

impl Dataset {
    /// Build label indices from the classified records.
    pub fn from_records(records: Vec<InvestmentRecord>) -> Self {
        let mut labels: BTreeMap<FilterAxis, BTreeSet<String>> =
            FilterAxis::ALL.into_iter().map(|axis| (axis, BTreeSet::new())).collect();

        for rec in &records {
            for axis in FilterAxis::ALL {
                labels
                    .entry(axis)
                    .or_default()
                    .insert(axis.value_of(rec).to_string());
            }
        }
        Dataset { records, labels }
    }

    /// Labels discovered for one axis.
    pub fn labels(&self, axis: FilterAxis) -> impl Iterator<Item = &str> {
        self.labels
            .get(&axis)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
