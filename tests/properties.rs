//! Property-based tests for segmentation, aggregation and the horizon grid.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use sales_forecast::domain::{Observation, SalesRecord};
use sales_forecast::fit::future_dates;
use sales_forecast::report::summarize;
use sales_forecast::segment::SegmentIndex;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()
}

/// Strategy for one sales row drawn from small key pools so segments repeat.
fn record_strategy() -> impl Strategy<Value = SalesRecord> {
    (
        0u64..800,
        prop::sample::select(vec!["Canada", "Finland", "Italy"]),
        prop::sample::select(vec!["Discount Stickers", "Stickers for Less"]),
        prop::sample::select(vec!["Holographic Goose", "Kaggle", "Kerneler"]),
        prop::option::weighted(0.9, 0u64..5_000),
    )
        .prop_map(|(day, country, store, product, num_sold)| SalesRecord {
            date: base_date() + Days::new(day),
            country: country.to_string(),
            store: store.to_string(),
            product: product.to_string(),
            num_sold,
        })
}

fn table_strategy() -> impl Strategy<Value = Vec<SalesRecord>> {
    prop::collection::vec(record_strategy(), 0..200)
}

// =============================================================================
// Property: segments partition the table
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn segments_partition_rows_exactly(records in table_strategy()) {
        let index = SegmentIndex::build(&records);

        let mut rows: Vec<usize> = index.segments.iter().flat_map(|s| s.rows.iter().copied()).collect();
        rows.sort_unstable();
        prop_assert_eq!(rows, (0..records.len()).collect::<Vec<_>>());

        for segment in &index.segments {
            prop_assert!(!segment.rows.is_empty());
            for record in segment.records(&records) {
                prop_assert_eq!(&record.segment_key(), &segment.key);
            }
        }

        let mut keys: Vec<_> = index.keys().cloned().collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), index.len());
    }

    #[test]
    fn aggregates_ignore_row_order(
        (records, shuffled) in table_strategy()
            .prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle()))
    ) {
        prop_assert_eq!(summarize(&records).unwrap(), summarize(&shuffled).unwrap());
    }

    #[test]
    fn monthly_totals_sum_to_table_total(records in table_strategy()) {
        let summary = summarize(&records).unwrap();
        let total: u64 = records.iter().filter_map(|r| r.num_sold).sum();
        prop_assert_eq!(summary.monthly.iter().map(|(_, v)| v).sum::<u64>(), total);
        prop_assert_eq!(summary.by_country.iter().map(|(_, v)| v).sum::<u64>(), total);
        prop_assert!(summary.by_store.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}

// =============================================================================
// Property: renaming to (ds, y) and back is lossless
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn series_rename_round_trips(records in table_strategy()) {
        let index = SegmentIndex::build(&records);
        for segment in &index.segments {
            let series = segment.series(&records);

            let mut expected: Vec<(NaiveDate, Option<u64>)> =
                segment.records(&records).map(|r| (r.date, r.num_sold)).collect();
            expected.sort_by_key(|p| p.0);

            let back: Vec<(NaiveDate, Option<u64>)> =
                series.iter().map(|o| o.into_sales_pair()).collect();
            prop_assert_eq!(back, expected);
            prop_assert!(series.windows(2).all(|w| w[0].ds <= w[1].ds));
        }
    }

    #[test]
    fn observation_pair_round_trips(day in 0u64..10_000, n in prop::option::of(0u64..1_000_000)) {
        let date = base_date() + Days::new(day);
        let obs = Observation::from_sales_pair(date, n);
        prop_assert_eq!(obs.into_sales_pair(), (date, n));
    }
}

// =============================================================================
// Property: the horizon is daily, gap-free and exactly `periods` long
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn future_dates_extend_by_exact_horizon(
        offsets in prop::collection::btree_set(0u64..2_000, 1..60),
        periods in 0usize..1_200
    ) {
        let history: Vec<NaiveDate> = offsets
            .into_iter()
            .map(|d| base_date() + Days::new(d))
            .collect();
        let last = *history.last().unwrap();

        let dates = future_dates(&history, periods).unwrap();
        prop_assert_eq!(dates.len(), history.len() + periods);

        let future: Vec<NaiveDate> = dates.iter().copied().filter(|d| *d > last).collect();
        prop_assert_eq!(future.len(), periods);
        for (i, d) in future.iter().enumerate() {
            prop_assert_eq!(*d, last + Days::new(i as u64 + 1));
        }
    }
}
