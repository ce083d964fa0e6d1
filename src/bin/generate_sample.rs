use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

// Headers as they appear in the regulator's Hebrew holdings report.
const HEADERS: [&str; 5] = [
    "שם קרן השקעה",
    "מדינה לפי חשיפה כלכלית",
    "אסטרטגיה",
    "מאפיין עיקרי",
    "שווי הוגן (באלפי ש\"ח)",
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let managers = ["Harbor", "Cedar", "Summit", "Meridian", "Atlas", "Keystone", "Northwind"];
    let themes: [(&str, &[&str]); 5] = [
        ("Buyout", &["Mid-market buyout", "Large-cap LBO", "Control buyout of family businesses"]),
        ("Ventures", &["Early stage technology", "Seed and series A", "הון סיכון ישראלי"]),
        ("Growth", &["Growth equity in software", "Expansion capital", "צמיחה בחברות טכנולוגיה"]),
        ("Property", &["Core-plus real estate", "Logistics property", "נדל\"ן מניב"]),
        ("Capital", &["Senior secured lending", "Secondaries", "Infrastructure debt"]),
    ];
    let regions = ["Israel", "ישראל", "USA", "Europe", "Asia", "Global"];
    let strategies = ["Private Equity", "Venture Capital", "Real Estate", "Private Credit", "Infrastructure"];

    let mut names = Vec::new();
    let mut geo = Vec::new();
    let mut strategy = Vec::new();
    let mut characteristic = Vec::new();
    let mut nav = Vec::new();

    for (i, manager) in managers.iter().enumerate() {
        for (suffix, descriptions) in &themes {
            names.push(format!("{manager} {suffix} Fund {}", i % 4 + 1));
            geo.push(rng.pick(&regions).to_string());
            strategy.push(rng.pick(&strategies).to_string());
            characteristic.push(rng.pick(descriptions).to_string());
            // Fair value in thousands of ILS, log-spread between 1K and ~1M.
            nav.push((10f64.powf(3.0 + rng.next_f64() * 3.0)).round());
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Utf8, false),
        Field::new(HEADERS[2], DataType::Utf8, false),
        Field::new(HEADERS[3], DataType::Utf8, false),
        Field::new(HEADERS[4], DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(names.clone())),
            Arc::new(StringArray::from(geo.clone())),
            Arc::new(StringArray::from(strategy.clone())),
            Arc::new(StringArray::from(characteristic.clone())),
            Arc::new(Float64Array::from(nav.clone())),
        ],
    )
    .context("building record batch")?;

    // Write Parquet
    let parquet_path = "sample_investments.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    // Write CSV with the same rows
    let csv_path = "sample_investments.csv";
    let mut csv_writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    csv_writer.write_record(HEADERS)?;
    for i in 0..names.len() {
        let size = nav[i].to_string();
        csv_writer.write_record([
            names[i].as_str(),
            geo[i].as_str(),
            strategy[i].as_str(),
            characteristic[i].as_str(),
            size.as_str(),
        ])?;
    }
    csv_writer.flush()?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {} investments to {parquet_path} and {csv_path}",
        names.len()
    );
    Ok(())
}
