//! Integration tests for loading holdings files in every supported format.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::TempDir;

use fundscope::data::classify::Classifier;
use fundscope::data::loader::{load_dataset, InvalidSizePolicy, LoadOptions};
use fundscope::data::model::{FilterAxis, SubSegment};
use fundscope::error::LoadError;

fn options(policy: InvalidSizePolicy) -> LoadOptions {
    LoadOptions {
        sheet: "Sheet1".into(),
        invalid_size: policy,
    }
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn write_parquet(path: &Path) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Investment Name", DataType::Utf8, false),
        Field::new("Main Characteristic", DataType::Utf8, true),
        Field::new("Geography", DataType::Utf8, true),
        Field::new("Strategy", DataType::Utf8, true),
        Field::new("NAV (ILS)", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["Cedar LBO Fund", "Atlas Seed Fund", "Keystone"])),
            Arc::new(StringArray::from(vec![
                Some("Control buyouts"),
                Some("Seed rounds"),
                None,
            ])),
            Arc::new(StringArray::from(vec![Some("Israel"), Some("USA"), None])),
            Arc::new(StringArray::from(vec![
                Some("Private Equity"),
                Some("Venture Capital"),
                Some("Private Credit"),
            ])),
            Arc::new(Float64Array::from(vec![Some(1500.0), Some(250.5), None])),
        ],
    )
    .unwrap();

    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Two-sheet workbook: "Holdings" with the given headers and rows, plus an
/// unrelated "Notes" sheet. A `None` size cell is written as a date.
fn write_workbook(path: &Path, headers: &[&str], rows: &[(&str, &str, Option<f64>)]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    {
        let sheet = workbook.add_worksheet().set_name("Holdings").unwrap();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (i, (name, region, size)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, *name).unwrap();
            sheet.write_string(row, 1, *region).unwrap();
            if headers.len() > 2 {
                match size {
                    Some(size) => sheet.write_number(row, 2, *size).unwrap(),
                    None => {
                        let date = ExcelDateTime::from_ymd(2024, 3, 31).unwrap();
                        sheet
                            .write_datetime_with_format(row, 2, &date, &date_format)
                            .unwrap()
                    }
                };
            }
        }
    }
    workbook
        .add_worksheet()
        .set_name("Notes")
        .unwrap()
        .write_string(0, 0, "prepared by operations")
        .unwrap();
    workbook.save(path).unwrap();
}

fn sheet_options(sheet: &str) -> LoadOptions {
    LoadOptions {
        sheet: sheet.into(),
        invalid_size: InvalidSizePolicy::Drop,
    }
}

#[test]
fn workbook_sheet_is_read_and_date_sizes_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("holdings.xlsx");
    write_workbook(
        &path,
        &["Investment Name", "Geography", "NAV (ILS)"],
        &[
            ("Cedar Buyout III", "Israel", Some(1500.0)),
            ("Atlas Seed Fund", "USA", Some(250.0)),
            ("Dated Row", "Europe", None),
        ],
    );

    let (dataset, report) =
        load_dataset(&path, &sheet_options("Holdings"), &Classifier::default()).unwrap();
    assert_eq!(report.sheet.as_deref(), Some("Holdings"));
    assert_eq!(report.rows_read, 3);
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.records[0].fund_name, "Cedar Buyout III");
    assert_eq!(dataset.records[0].investment_size, 1500.0);
    assert_eq!(dataset.records[0].sub_segment, SubSegment::Buyout);

    assert_eq!(report.size_errors.len(), 1);
    assert_eq!(report.size_errors[0].fund, "Dated Row");
    assert_eq!(report.size_errors[0].row, 3);
    assert_eq!(report.size_errors[0].reason, "is not a number");
}

#[test]
fn workbook_without_requested_sheet_lists_available_sheets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("holdings.xlsx");
    write_workbook(
        &path,
        &["Investment Name", "Geography", "NAV (ILS)"],
        &[("Cedar Buyout III", "Israel", Some(1500.0))],
    );

    let err = load_dataset(&path, &sheet_options("Sheet1"), &Classifier::default()).unwrap_err();
    match err {
        LoadError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "Sheet1");
            assert_eq!(available, vec!["Holdings", "Notes"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn workbook_without_size_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("holdings.xlsx");
    write_workbook(
        &path,
        &["Investment Name", "Geography"],
        &[("Cedar Buyout III", "Israel", None)],
    );

    let err = load_dataset(&path, &sheet_options("Holdings"), &Classifier::default()).unwrap_err();
    assert!(
        matches!(err, LoadError::MissingColumn { column: "investment size", .. }),
        "{err}"
    );
}

#[test]
fn csv_with_hebrew_headers_and_bom() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "holdings.csv",
        "\u{feff}שם קרן השקעה,מאפיין עיקרי,מדינה לפי חשיפה כלכלית,אסטרטגיה,\"שווי הוגן (באלפי ש\"\"ח)\"\n\
         Harbor Growth Fund,צמיחה בחברות טכנולוגיה,ישראל,Private Equity,\"1,200\"\n\
         Summit Property,נדל\"ן מניב,USA,Real Estate,800\n\
         ,,,,\n",
    );

    let (dataset, report) =
        load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default()).unwrap();

    assert_eq!(report.rows_read, 3);
    assert_eq!(report.rows_loaded, 2);
    assert_eq!(report.empty_rows, 1);
    assert!(report.size_errors.is_empty());
    assert_eq!(report.sheet, None);

    let growth = &dataset.records[0];
    assert_eq!(growth.fund_name, "Harbor Growth Fund");
    assert_eq!(growth.region, "ישראל");
    assert_eq!(growth.investment_size, 1200.0);
    assert_eq!(growth.sub_segment, SubSegment::Growth);
    assert_eq!(dataset.records[1].sub_segment, SubSegment::RealEstate);
}

#[test]
fn csv_text_cells_are_not_reinterpreted_as_numbers() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "holdings.csv",
        "Investment Name,Geography,NAV (ILS)\n\
         Infinity,007,10\n\
         NaN,1e3,\"2,500\"\n",
    );

    let (dataset, report) =
        load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default()).unwrap();
    assert!(report.size_errors.is_empty());
    let loaded: Vec<(&str, &str, f64)> = dataset
        .records
        .iter()
        .map(|r| (r.fund_name.as_str(), r.region.as_str(), r.investment_size))
        .collect();
    assert_eq!(loaded, vec![("Infinity", "007", 10.0), ("NaN", "1e3", 2500.0)]);
}

#[test]
fn json_records_fill_missing_columns() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "holdings.json",
        r#"[
            {"Investment Name": "Meridian Buyout II", "Geography": "Europe", "NAV (ILS)": 3000},
            {"Investment Name": "Northwind Ventures", "Main Characteristic": "early stage software",
             "Strategy": "Venture Capital", "NAV (ILS)": 125.5}
        ]"#,
    );

    let (dataset, report) =
        load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default()).unwrap();

    assert_eq!(report.rows_loaded, 2);
    assert_eq!(dataset.records[0].sub_segment, SubSegment::Buyout);
    assert_eq!(dataset.records[0].fund_type, "Unknown");
    assert_eq!(dataset.records[1].region, "Unknown");
    assert_eq!(dataset.records[1].sub_segment, SubSegment::VentureCapital);
    assert_eq!(
        dataset.labels(FilterAxis::Region).collect::<Vec<_>>(),
        vec!["Europe", "Unknown"]
    );
}

#[test]
fn json_must_be_an_array_of_objects() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "holdings.json", r#"{"Investment Name": "x"}"#);
    let err = load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::Malformed(_)));
}

#[test]
fn parquet_columns_and_null_sizes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("holdings.parquet");
    write_parquet(&path);

    let (dataset, report) =
        load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default()).unwrap();
    assert_eq!(report.rows_read, 3);
    assert_eq!(dataset.len(), 2);
    assert_eq!(report.size_errors.len(), 1);
    assert_eq!(report.size_errors[0].fund, "Keystone");
    assert_eq!(report.size_errors[0].reason, "is empty");
    assert_eq!(dataset.records[1].investment_size, 250.5);

    let (dataset, _) =
        load_dataset(&path, &options(InvalidSizePolicy::Zero), &Classifier::default()).unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.records[2].investment_size, 0.0);
    assert_eq!(dataset.records[2].sub_segment, SubSegment::Other);
}

#[test]
fn invalid_sizes_follow_policy() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "holdings.csv",
        "Investment Name,NAV (ILS)\n\
         Alpha,100\n\
         Beta,n/a\n\
         Gamma,-5\n\
         Delta,\n",
    );

    let (dropped, report) =
        load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default()).unwrap();
    assert_eq!(dropped.len(), 1);
    let reasons: Vec<_> = report.size_errors.iter().map(|e| e.reason).collect();
    assert_eq!(reasons, vec!["is not a number", "is negative", "is empty"]);
    assert_eq!(report.size_errors[0].row, 2);
    assert!(report.summary().contains("dropped"));

    let (zeroed, report) =
        load_dataset(&path, &options(InvalidSizePolicy::Zero), &Classifier::default()).unwrap();
    assert_eq!(zeroed.len(), 4);
    assert_eq!(report.size_errors.len(), 3);
    let total: f64 = zeroed.records.iter().map(|r| r.investment_size).sum();
    assert_eq!(total, 100.0);
}

#[test]
fn missing_size_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "holdings.csv", "Investment Name,Geography\nAlpha,Israel\n");
    let err = load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default())
        .unwrap_err();
    match err {
        LoadError::MissingColumn { column, headers } => {
            assert_eq!(column, "investment size");
            assert_eq!(headers, vec!["Investment Name", "Geography"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unsupported_extension_and_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "holdings.txt", "whatever");
    let err = load_dataset(&path, &options(InvalidSizePolicy::Drop), &Classifier::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "txt"));

    let missing = dir.path().join("absent.json");
    let err = load_dataset(&missing, &options(InvalidSizePolicy::Drop), &Classifier::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn custom_rules_change_classification() {
    let dir = TempDir::new().unwrap();
    let rules = write(
        &dir,
        "rules.json",
        r#"[{"label": "Real Estate", "keywords": ["logistics"]},
            {"label": "Buyout", "keywords": ["fund"]}]"#,
    );
    let path = write(
        &dir,
        "holdings.csv",
        "Investment Name,Main Characteristic,NAV (ILS)\n\
         Cedar Fund,Logistics warehouses,10\n\
         Atlas Fund,Seed rounds,20\n",
    );

    let classifier = Classifier::from_json_file(&rules).unwrap();
    let (dataset, _) =
        load_dataset(&path, &options(InvalidSizePolicy::Drop), &classifier).unwrap();
    assert_eq!(dataset.records[0].sub_segment, SubSegment::RealEstate);
    assert_eq!(dataset.records[1].sub_segment, SubSegment::Buyout);
}
