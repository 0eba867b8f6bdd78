//! Partitioning of the sales table into `(country, store, product)` segments.
//!
//! The index is built once and only stores row positions, so the table stays
//! the single owner of the data:
//! - every row lands in exactly one segment
//! - segments are ordered by first appearance in the table
//! - rows inside a segment keep table order

use std::collections::HashMap;

use crate::domain::{Observation, SalesRecord, SegmentKey};

/// One segment: its key and the table rows that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub key: SegmentKey,
    pub rows: Vec<usize>,
}

impl Segment {
    pub fn records<'a>(&'a self, table: &'a [SalesRecord]) -> impl Iterator<Item = &'a SalesRecord> + 'a {
        self.rows.iter().map(move |&i| &table[i])
    }

    /// The segment's `(ds, y)` series, sorted by date (stable for equal dates).
    pub fn series(&self, table: &[SalesRecord]) -> Vec<Observation> {
        let mut series: Vec<Observation> = self
            .records(table)
            .map(|r| Observation::from_sales_pair(r.date, r.num_sold))
            .collect();
        series.sort_by_key(|o| o.ds);
        series
    }
}

/// All segments of a table.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    pub segments: Vec<Segment>,
}

impl SegmentIndex {
    pub fn build(table: &[SalesRecord]) -> Self {
        let mut positions: HashMap<SegmentKey, usize> = HashMap::new();
        let mut segments: Vec<Segment> = Vec::new();

        for (i, record) in table.iter().enumerate() {
            let key = record.segment_key();
            let slot = match positions.get(&key) {
                Some(&slot) => slot,
                None => {
                    positions.insert(key.clone(), segments.len());
                    segments.push(Segment { key, rows: Vec::new() });
                    segments.len() - 1
                }
            };
            segments[slot].rows.push(i);
        }

        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SegmentKey> {
        self.segments.iter().map(|s| &s.key)
    }

    pub fn get(&self, key: &SegmentKey) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(day: u32, country: &str, store: &str, product: &str, n: Option<u64>) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2015, 3, day).unwrap(),
            country: country.to_string(),
            store: store.to_string(),
            product: product.to_string(),
            num_sold: n,
        }
    }

    #[test]
    fn groups_by_first_appearance() {
        let table = vec![
            rec(1, "Norway", "S1", "Kaggle", Some(5)),
            rec(1, "Canada", "S1", "Kaggle", Some(3)),
            rec(2, "Norway", "S1", "Kaggle", None),
            rec(2, "Norway", "S2", "Kaggle", Some(1)),
        ];
        let index = SegmentIndex::build(&table);

        let keys: Vec<String> = index.keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["(Norway, S1, Kaggle)", "(Canada, S1, Kaggle)", "(Norway, S2, Kaggle)"]
        );
        assert_eq!(index.segments[0].rows, vec![0, 2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn series_is_sorted_by_date() {
        let table = vec![
            rec(9, "A", "B", "C", Some(9)),
            rec(2, "A", "B", "C", Some(2)),
            rec(5, "A", "B", "C", None),
        ];
        let index = SegmentIndex::build(&table);
        let series = index.segments[0].series(&table);
        let days: Vec<u32> = series.iter().map(|o| chrono::Datelike::day(&o.ds)).collect();
        assert_eq!(days, vec![2, 5, 9]);
        assert_eq!(series[1].y, None);
        assert_eq!(series[2].y, Some(9.0));
    }

    #[test]
    fn lookup_by_key() {
        let table = vec![rec(1, "A", "B", "C", Some(1))];
        let index = SegmentIndex::build(&table);
        assert!(index.get(&SegmentKey::new("A", "B", "C")).is_some());
        assert!(index.get(&SegmentKey::new("A", "B", "D")).is_none());
    }
}
