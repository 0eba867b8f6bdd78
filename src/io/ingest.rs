//! CSV ingest for the sales table.
//!
//! This module turns the sales CSV into a `Vec<SalesRecord>`:
//! - **Strict schema**: `date`, `country`, `store`, `product`, `num_sold` must exist
//! - **No cleaning**: a malformed row aborts the load (exit code 2) with its line number
//! - Extra columns (e.g. `id`) are ignored
//! - An empty `num_sold` cell is kept as a missing observation

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{DatasetStats, SalesRecord};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 5] = ["date", "country", "store", "product", "num_sold"];

/// Loaded table + summary stats.
#[derive(Debug, Clone)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
    pub stats: DatasetStats,
}

/// Load the sales CSV at `path`.
pub fn load_sales_table(path: &Path) -> Result<SalesTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_sales_table(file)
}

/// Parse a sales CSV from any reader.
pub fn read_sales_table<R: Read>(reader: R) -> Result<SalesTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header line and CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;
        let row = parse_row(&record, &header_map)
            .map_err(|msg| AppError::new(2, format!("Invalid row on line {line}: {msg}")))?;
        records.push(row);
    }

    let stats = compute_stats(&records).ok_or_else(|| AppError::new(3, "The sales CSV contains no rows."))?;

    Ok(SalesTable { records, stats })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::new(
        2,
        format!("Missing required column(s): {}", missing.join(", ")),
    ))
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<SalesRecord, String> {
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let country = get_required(record, header_map, "country")?.to_string();
    let store = get_required(record, header_map, "store")?.to_string();
    let product = get_required(record, header_map, "product")?.to_string();
    let num_sold = get_optional(record, header_map, "num_sold")
        .map(parse_count)
        .transpose()?;

    Ok(SalesRecord {
        date,
        country,
        store,
        product,
        num_sold,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    // Timestamps written by dataframe tools: keep the calendar day.
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, YYYY-MM-DD HH:MM:SS."
    ))
}

/// Parse a unit count. Integral floats (`973.0`) are accepted because tools
/// that support missing values often write integer columns as floats.
fn parse_count(s: &str) -> Result<u64, String> {
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(format!("Invalid `num_sold` value '{s}' (expected a non-negative integer).")),
    }
}

fn compute_stats(records: &[SalesRecord]) -> Option<DatasetStats> {
    let date_min = records.iter().map(|r| r.date).min()?;
    let date_max = records.iter().map(|r| r.date).max()?;
    Some(DatasetStats {
        n_rows: records.len(),
        n_missing: records.iter().filter(|r| r.num_sold.is_none()).count(),
        date_min,
        date_max,
    })
}
