use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::data::loader::{InvalidSizePolicy, LoadOptions};

pub const DEFAULT_SHEET: &str = "Sheet1";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Process configuration. Built once in `main` and passed down explicitly.
#[derive(Debug, Clone, Parser)]
#[command(name = "fundscope", version, about = "Browse and classify investment fund holdings in the browser")]
pub struct Config {
    /// Holdings file: .xlsx/.xls/.ods workbook, .csv, .json or .parquet
    pub input: PathBuf,

    /// Worksheet to read from a workbook
    #[arg(long, default_value = DEFAULT_SHEET)]
    pub sheet: String,

    /// Address the dashboard listens on
    #[arg(long, default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// JSON file with ordered classification rules
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// What to do with rows whose investment size is not a non-negative number
    #[arg(long, value_enum, default_value_t = InvalidSizePolicy::Drop)]
    pub invalid_size: InvalidSizePolicy,

    /// Extra file for the period comparison, as LABEL=PATH (repeatable)
    #[arg(long = "period", value_name = "LABEL=PATH", value_parser = parse_period)]
    pub periods: Vec<PeriodSource>,

    /// Table rows per page
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: u16,
}

/// A labelled file for the period comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSource {
    pub label: String,
    pub path: PathBuf,
}

fn parse_period(raw: &str) -> Result<PeriodSource, String> {
    let (label, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{raw}'"))?;
    let (label, path) = (label.trim(), path.trim());
    if label.is_empty() || path.is_empty() {
        return Err(format!("expected LABEL=PATH, got '{raw}'"));
    }
    Ok(PeriodSource {
        label: label.to_string(),
        path: PathBuf::from(path),
    })
}

impl Config {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            sheet: self.sheet.clone(),
            invalid_size: self.invalid_size,
        }
    }

    /// The first `--period` label that appears more than once.
    pub fn duplicate_period_label(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.periods
            .iter()
            .map(|p| p.label.as_str())
            .find(|label| !seen.insert(*label))
    }
}
