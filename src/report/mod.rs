//! Reporting utilities: table aggregates and unique-value listings.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{MonthKey, SalesRecord};
use crate::error::AppError;

pub mod format;

pub use format::*;

/// The four aggregates shown on the overview grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesSummary {
    /// Total per calendar month, in chronological order.
    pub monthly: Vec<(MonthKey, u64)>,
    /// Totals sorted ascending (ties by name).
    pub by_country: Vec<(String, u64)>,
    pub by_product: Vec<(String, u64)>,
    pub by_store: Vec<(String, u64)>,
}

/// Compute all four aggregates. Missing `num_sold` values add nothing.
pub fn summarize(records: &[SalesRecord]) -> Result<SalesSummary, AppError> {
    let mut monthly: BTreeMap<MonthKey, u64> = BTreeMap::new();
    for r in records {
        let month = r.month();
        let total = monthly.entry(month).or_default();
        *total = add_sold(*total, r, &month.to_string())?;
    }

    Ok(SalesSummary {
        monthly: monthly.into_iter().collect(),
        by_country: totals_by(records, |r| &r.country)?,
        by_product: totals_by(records, |r| &r.product)?,
        by_store: totals_by(records, |r| &r.store)?,
    })
}

/// Sum `num_sold` per key and sort ascending by total.
pub fn totals_by<F>(records: &[SalesRecord], key: F) -> Result<Vec<(String, u64)>, AppError>
where
    F: Fn(&SalesRecord) -> &str,
{
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for r in records {
        let name = key(r);
        let total = totals.entry(name).or_default();
        *total = add_sold(*total, r, name)?;
    }

    let mut out: Vec<(String, u64)> = totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    Ok(out)
}

fn add_sold(total: u64, record: &SalesRecord, group: &str) -> Result<u64, AppError> {
    total
        .checked_add(record.num_sold.unwrap_or(0))
        .ok_or_else(|| AppError::new(4, format!("Total sales for {group} overflow a 64-bit count")))
}

/// Distinct values in order of first appearance.
pub fn unique_values<F>(records: &[SalesRecord], key: F) -> Vec<String>
where
    F: Fn(&SalesRecord) -> &str,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for r in records {
        let v = key(r);
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}
