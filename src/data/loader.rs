use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::classify::Classifier;
use super::model::{CellValue, Dataset, InvestmentRow, UNKNOWN_LABEL};
use crate::error::{LoadError, ParseError};

// ---------------------------------------------------------------------------
// Options & report
// ---------------------------------------------------------------------------

/// What to do with a row whose investment size is not a non-negative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InvalidSizePolicy {
    /// Leave the row out of the dataset.
    #[default]
    Drop,
    /// Keep the row with an investment size of zero.
    Zero,
}

impl fmt::Display for InvalidSizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidSizePolicy::Drop => f.write_str("dropped"),
            InvalidSizePolicy::Zero => f.write_str("counted as zero"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Worksheet to read. Single-table formats ignore it.
    pub sheet: String,
    pub invalid_size: InvalidSizePolicy,
}

/// Outcome of one load, surfaced in the startup log and on the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub source: PathBuf,
    /// The worksheet actually read, `None` for single-table formats.
    pub sheet: Option<String>,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub empty_rows: usize,
    pub size_errors: Vec<ParseError>,
    pub policy: InvalidSizePolicy,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} rows loaded from {}",
            self.rows_loaded,
            self.source.display()
        );
        if let Some(sheet) = &self.sheet {
            text.push_str(&format!(" (sheet '{sheet}')"));
        }
        if self.empty_rows > 0 {
            text.push_str(&format!(", {} empty rows skipped", self.empty_rows));
        }
        if !self.size_errors.is_empty() {
            text.push_str(&format!(
                ", {} rows with an invalid investment size {}",
                self.size_errors.len(),
                self.policy
            ));
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Raw table – what every format reader produces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load, validate and classify a file into a [`Dataset`].
pub fn load_dataset(
    path: &Path,
    options: &LoadOptions,
    classifier: &Classifier,
) -> Result<(Dataset, LoadReport), LoadError> {
    let (rows, report) = load_file(path, options)?;
    let records = rows.into_iter().map(|row| classifier.classify_row(row)).collect();
    let dataset = Dataset::from_records(records);

    log::info!("{}", report.summary());
    for err in &report.size_errors {
        log::warn!("{err}");
    }
    Ok((dataset, report))
}

/// Load a file into validated rows. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – the named sheet
/// * `.csv`     – header row plus data rows
/// * `.json`    – `[{ "Investment Name": ..., "NAV (ILS)": ... }, ...]`
/// * `.parquet` – flat columns as written by pandas or polars
pub fn load_file(
    path: &Path,
    options: &LoadOptions,
) -> Result<(Vec<InvestmentRow>, LoadReport), LoadError> {
    let (table, sheet) = read_table(path, &options.sheet)?;
    let extracted = extract_rows(&table, options.invalid_size)?;

    let report = LoadReport {
        source: path.to_path_buf(),
        sheet,
        rows_read: table.rows.len(),
        rows_loaded: extracted.rows.len(),
        empty_rows: extracted.empty_rows,
        size_errors: extracted.size_errors,
        policy: options.invalid_size,
    };
    Ok((extracted.rows, report))
}

/// Read the raw header + cell grid. Returns the sheet name when one was used.
pub fn read_table(path: &Path, sheet: &str) -> Result<(RawTable, Option<String>), LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            Ok((read_workbook(path, sheet)?, Some(sheet.to_string())))
        }
        "csv" => Ok((read_csv(path)?, None)),
        "json" => Ok((read_json(path)?, None)),
        "parquet" | "pq" => Ok((read_parquet(path)?, None)),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Workbook reader
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path, sheet: &str) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(LoadError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| header.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(cell_from_workbook).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn cell_from_workbook(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => CellValue::Date(cell.to_string()),
        // Error cells (#N/A, #VALUE!) and durations keep their text.
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(csv_cell).collect());
    }

    Ok(RawTable { headers, rows })
}

/// CSV has no cell types. Text is kept verbatim; only the size column is
/// parsed as a number later.
fn csv_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Headers are collected in first-seen order across all objects.
fn read_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected a top-level JSON array".into()))?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("JSON row {i} is not an object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| cell_from_arrow(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

fn cell_from_arrow(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            arrow_display(col, row).map_or(CellValue::Null, CellValue::Date)
        }
        _ => arrow_display(col, row).map_or(CellValue::Null, CellValue::String),
    }
}

fn arrow_display(col: &ArrayRef, row: usize) -> Option<String> {
    arrow::util::display::array_value_to_string(col.as_ref(), row).ok()
}

// ---------------------------------------------------------------------------
// Header normalization
// ---------------------------------------------------------------------------

/// A record field and the header spellings that map onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    FundName,
    Description,
    Region,
    FundType,
    InvestmentSize,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::FundName,
        Field::Description,
        Field::Region,
        Field::FundType,
        Field::InvestmentSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::FundName => "fund name",
            Field::Description => "description",
            Field::Region => "region",
            Field::FundType => "fund type",
            Field::InvestmentSize => "investment size",
        }
    }

    /// Lower-case aliases, English and Hebrew.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::FundName => &["investment name", "fund name", "שם קרן השקעה"],
            Field::Description => &[
                "main characteristic",
                "characteristic",
                "feature",
                "description",
                "מאפיין עיקרי",
                "תיאור",
            ],
            Field::Region => &["geography", "region", "מדינה לפי חשיפה כלכלית", "אזור"],
            Field::FundType => &["strategy", "fund type", "אסטרטגיה", "סוג קרן"],
            Field::InvestmentSize => &[
                "nav (ils)",
                "investment size",
                "שווי הוגן (באלפי ש\"ח)",
                "שווי הוגן (באלפי ש''ח)",
                "שווי הוגן (באלפי ש״ח)",
            ],
        }
    }

    fn is_required(self) -> bool {
        matches!(self, Field::FundName | Field::InvestmentSize)
    }

    /// Match a raw header (trimmed, case-insensitive).
    pub fn from_header(header: &str) -> Option<Field> {
        let key = header.trim().to_lowercase();
        Field::ALL
            .into_iter()
            .find(|field| field.aliases().contains(&key.as_str()))
    }
}

/// Column index per field. The first header mapping onto a field wins.
pub fn resolve_columns(headers: &[String]) -> Result<BTreeMap<Field, usize>, LoadError> {
    let mut columns = BTreeMap::new();
    for (idx, header) in headers.iter().enumerate() {
        let Some(field) = Field::from_header(header) else {
            continue;
        };
        if columns.contains_key(&field) {
            log::warn!(
                "column '{}' duplicates the {} column, ignoring it",
                header.trim(),
                field.name()
            );
            continue;
        }
        columns.insert(field, idx);
    }

    for field in Field::ALL.into_iter().filter(|f| f.is_required()) {
        if !columns.contains_key(&field) {
            return Err(LoadError::MissingColumn {
                column: field.name(),
                headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            });
        }
    }
    Ok(columns)
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// Rows extracted from a raw table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub rows: Vec<InvestmentRow>,
    pub empty_rows: usize,
    pub size_errors: Vec<ParseError>,
}

static NULL_CELL: CellValue = CellValue::Null;

pub fn extract_rows(table: &RawTable, policy: InvalidSizePolicy) -> Result<Extracted, LoadError> {
    let columns = resolve_columns(&table.headers)?;
    let cell = |row: &'_ [CellValue], field: Field| -> Option<String> {
        columns
            .get(&field)
            .and_then(|&idx| row.get(idx))
            .and_then(CellValue::as_text)
    };

    let mut out = Extracted::default();
    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 1;
        if row.iter().all(CellValue::is_blank) {
            out.empty_rows += 1;
            continue;
        }

        let fund_name = cell(row, Field::FundName).unwrap_or_else(|| format!("Row {row_no}"));
        let size_cell = columns
            .get(&Field::InvestmentSize)
            .and_then(|&idx| row.get(idx))
            .unwrap_or(&NULL_CELL);

        let investment_size = match parse_size(size_cell) {
            Ok(size) => size,
            Err(reason) => {
                out.size_errors.push(ParseError {
                    row: row_no,
                    fund: fund_name.clone(),
                    value: size_cell.to_string(),
                    reason,
                });
                match policy {
                    InvalidSizePolicy::Drop => continue,
                    InvalidSizePolicy::Zero => 0.0,
                }
            }
        };

        out.rows.push(InvestmentRow {
            description: cell(row, Field::Description).unwrap_or_default(),
            region: cell(row, Field::Region).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            fund_type: cell(row, Field::FundType).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            fund_name,
            investment_size,
        });
    }
    Ok(out)
}

/// Read an investment size. Text may carry thousands separators and a
/// shekel sign.
pub fn parse_size(cell: &CellValue) -> Result<f64, &'static str> {
    let value = match cell {
        CellValue::Integer(i) => *i as f64,
        CellValue::Float(f) => *f,
        CellValue::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',' && *c != '₪')
                .collect();
            if cleaned.is_empty() {
                return Err("is empty");
            }
            cleaned.parse::<f64>().map_err(|_| "is not a number")?
        }
        CellValue::Null => return Err("is empty"),
        CellValue::Bool(_) | CellValue::Date(_) => return Err("is not a number"),
    };

    if !value.is_finite() {
        return Err("is not a finite number");
    }
    if value < 0.0 {
        return Err("is negative");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[test]
    fn hebrew_headers_resolve() {
        let headers: Vec<String> = [
            " שם קרן השקעה ",
            "מדינה לפי חשיפה כלכלית",
            "אסטרטגיה",
            "שווי הוגן (באלפי ש\"ח)",
            "מאפיין עיקרי",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        let cols = resolve_columns(&headers).unwrap();
        assert_eq!(cols[&Field::FundName], 0);
        assert_eq!(cols[&Field::Region], 1);
        assert_eq!(cols[&Field::FundType], 2);
        assert_eq!(cols[&Field::InvestmentSize], 3);
        assert_eq!(cols[&Field::Description], 4);
    }

    #[test]
    fn first_duplicate_header_wins() {
        let headers = vec!["Fund Name".to_string(), "NAV (ILS)".into(), "Investment Size".into()];
        let cols = resolve_columns(&headers).unwrap();
        assert_eq!(cols[&Field::InvestmentSize], 1);
    }

    #[test]
    fn missing_size_column_is_a_load_error() {
        let headers = vec!["Investment Name".to_string(), "Geography".into()];
        match resolve_columns(&headers) {
            Err(LoadError::MissingColumn { column, .. }) => assert_eq!(column, "investment size"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn optional_columns_default() {
        let t = table(
            &["Investment Name", "NAV (ILS)"],
            vec![vec![text("Alpha"), CellValue::Float(12.5)]],
        );
        let out = extract_rows(&t, InvalidSizePolicy::Drop).unwrap();
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.region, UNKNOWN_LABEL);
        assert_eq!(row.fund_type, UNKNOWN_LABEL);
        assert_eq!(row.description, "");
        assert_eq!(row.investment_size, 12.5);
    }

    #[test]
    fn blank_optional_cells_default_too() {
        let t = table(
            &["Investment Name", "Geography", "NAV (ILS)"],
            vec![vec![text("Alpha"), text("  "), CellValue::Integer(3)]],
        );
        let out = extract_rows(&t, InvalidSizePolicy::Drop).unwrap();
        assert_eq!(out.rows[0].region, UNKNOWN_LABEL);
    }

    #[test]
    fn invalid_sizes_follow_policy_and_are_reported() {
        let t = table(
            &["Investment Name", "NAV (ILS)"],
            vec![
                vec![text("Alpha"), text("1,250.5")],
                vec![text("Beta"), text("n/a")],
                vec![text("Gamma"), CellValue::Float(-4.0)],
                vec![CellValue::Null, CellValue::Null],
            ],
        );

        let dropped = extract_rows(&t, InvalidSizePolicy::Drop).unwrap();
        assert_eq!(dropped.rows.len(), 1);
        assert_eq!(dropped.rows[0].investment_size, 1250.5);
        assert_eq!(dropped.empty_rows, 1);
        assert_eq!(dropped.size_errors.len(), 2);
        assert_eq!(dropped.size_errors[0].row, 2);
        assert_eq!(dropped.size_errors[0].fund, "Beta");
        assert_eq!(dropped.size_errors[1].reason, "is negative");

        let zeroed = extract_rows(&t, InvalidSizePolicy::Zero).unwrap();
        assert_eq!(zeroed.rows.len(), 3);
        assert_eq!(zeroed.rows[1].investment_size, 0.0);
        assert_eq!(zeroed.size_errors.len(), 2);
    }

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size(&text(" ₪ 2,000 ")), Ok(2000.0));
        assert_eq!(parse_size(&CellValue::Integer(7)), Ok(7.0));
        assert_eq!(parse_size(&text("")), Err("is empty"));
        assert_eq!(parse_size(&text("NaN")), Err("is not a finite number"));
        assert_eq!(parse_size(&CellValue::Bool(true)), Err("is not a number"));
    }

    #[test]
    fn unsupported_extension() {
        let err = read_table(Path::new("funds.txt"), "Sheet1").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn csv_cells_keep_their_text() {
        assert_eq!(csv_cell("007"), text("007"));
        assert_eq!(csv_cell("Infinity"), text("Infinity"));
        assert_eq!(csv_cell("  "), CellValue::Null);
        assert_eq!(parse_size(&csv_cell("1,250")), Ok(1250.0));
        assert_eq!(parse_size(&csv_cell("Infinity")), Err("is not a finite number"));
    }
}
