//! Customer row loaders.
//!
//! CSV files need a header row; any column order works and unknown
//! columns are carried along untouched. JSON files hold an array of
//! objects. Rows are handed to the engine raw: coercion, defaults and
//! skip decisions belong to `aura-core`.

use anyhow::{anyhow, Context, Result};
use aura_core::RawCustomerRecord;
use std::io::Read;
use std::path::Path;

/// Load rows from a CSV reader.
pub fn load_csv<R: Read>(reader: R) -> Result<Vec<RawCustomerRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().context("CSV has no header row")?.clone();

    let mut rows: Vec<RawCustomerRecord> = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| anyhow!("CSV parse error at line {}: {e}", line_num + 2))?;
        rows.push(headers.iter().zip(record.iter()).collect());
    }
    Ok(rows)
}

/// Load rows from a JSON array. Non-object elements become empty rows so
/// the engine reports them as skipped rather than the whole load failing.
pub fn load_json<R: Read>(reader: R) -> Result<Vec<RawCustomerRecord>> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("JSON input must be an array of customer objects"))?;
    Ok(items.iter().map(raw_from_json).collect())
}

pub fn raw_from_json(value: &serde_json::Value) -> RawCustomerRecord {
    value
        .as_object()
        .map(RawCustomerRecord::from_json_object)
        .unwrap_or_default()
}

/// Pick the loader by extension: `.json` is JSON, anything else CSV.
pub fn load_file(path: &Path) -> Result<Vec<RawCustomerRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        load_json(file)
    } else {
        load_csv(file)
    }
}
