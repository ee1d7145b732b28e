//! Property-based tests for the profiling invariants.
//!
//! Each property generates columns with controlled nulls and duplicates and
//! checks relations that must hold for every input: count identities,
//! bounded rates, monotone grading and risk, and key soundness.

use proptest::prelude::*;
use term_profiler::batch::{CellValue, Column, TabularBatch};
use term_profiler::config::{GradingConfig, KeyConfig, PiiConfig, RuleConfig};
use term_profiler::profiling::keys::discover_keys;
use term_profiler::profiling::pii::risk_level;
use term_profiler::profiling::quality::column_grade;
use term_profiler::profiling::statistics::{column_statistics, FrequencyTable};
use term_profiler::profiling::{KeyRecommendation, ProfileEngine};
use tokio_util::sync::CancellationToken;

fn small_int_cells(max_len: usize) -> impl Strategy<Value = Vec<CellValue>> {
    prop::collection::vec(prop::option::weighted(0.8, 0i64..20), 0..max_len)
        .prop_map(|values| values.into_iter().map(CellValue::from).collect())
}

fn mixed_cells(max_len: usize) -> impl Strategy<Value = Vec<CellValue>> {
    let cell = prop_oneof![
        Just(CellValue::Null),
        (0i64..50).prop_map(CellValue::Int),
        (-5.0f64..5.0).prop_map(CellValue::Float),
        "[a-c]{0,3}".prop_map(CellValue::Text),
        any::<bool>().prop_map(CellValue::Bool),
    ];
    prop::collection::vec(cell, 0..max_len)
}

proptest! {
    /// Properties tested:
    /// - null + non-null == total
    /// - null percentage within [0, 100]
    /// - unique <= distinct <= non-null <= total
    /// - duplicate == total - distinct
    #[test]
    fn test_column_statistics_identities(values in mixed_cells(200)) {
        let column = Column::new("c", values);
        let stats = column_statistics(&column, &FrequencyTable::build(&column));

        prop_assert_eq!(stats.null_count + stats.non_null_count, stats.total_count);
        prop_assert!((0.0..=100.0).contains(&stats.null_percentage));
        prop_assert!(stats.unique_count <= stats.distinct_count);
        prop_assert!(stats.distinct_count <= stats.non_null_count);
        prop_assert_eq!(stats.duplicate_count, stats.total_count - stats.distinct_count);
        prop_assert_eq!(
            stats.distinct_count_with_null,
            stats.distinct_count + usize::from(stats.null_count > 0)
        );
    }

    #[test]
    fn test_risk_level_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let config = PiiConfig::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(risk_level(low, &config) <= risk_level(high, &config));
    }

    /// A higher null rate never earns a better grade at equal distinctness.
    #[test]
    fn test_grade_is_monotonic_in_null_rate(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        distinctness in 0.0f64..=1.0,
    ) {
        let config = GradingConfig::default();
        let (cleaner, dirtier) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            column_grade(cleaner, distinctness, &config)
                >= column_grade(dirtier, distinctness, &config)
        );
    }

    /// Every reported key really is null-free and unique, and a primary key
    /// recommendation is only ever given once.
    #[test]
    fn test_candidate_keys_are_sound(
        a in small_int_cells(30),
        b_seed in prop::collection::vec(prop::option::weighted(0.9, 0i64..5), 30),
    ) {
        let rows = a.len();
        let b: Vec<CellValue> = b_seed.into_iter().take(rows).map(CellValue::from).collect();
        let ids: Vec<CellValue> = (0..rows as i64).map(CellValue::Int).collect();
        let batch = TabularBatch::new(
            "t",
            vec![Column::new("a", a), Column::new("b", b), Column::new("id", ids)],
        )
        .unwrap();

        let report =
            discover_keys(&batch, &KeyConfig::default(), &CancellationToken::new()).unwrap();

        for key in &report.candidate_keys {
            if key.recommendation == KeyRecommendation::NearUnique {
                continue;
            }
            prop_assert!(!key.has_nulls);
            prop_assert_eq!(key.uniqueness_percentage, 100.0);

            let columns: Vec<&Column> = key
                .columns
                .iter()
                .map(|name| batch.column(name).unwrap())
                .collect();
            let mut tuples: Vec<Vec<String>> = (0..rows)
                .map(|row| columns.iter().map(|c| c.values[row].to_string()).collect())
                .collect();
            tuples.sort();
            tuples.dedup();
            prop_assert_eq!(tuples.len(), rows);
        }

        let primary = report
            .candidate_keys
            .iter()
            .filter(|k| k.recommendation == KeyRecommendation::PrimaryKey)
            .count();
        prop_assert!(primary <= 1);
    }

    /// PII confidence stays within [0, 1] and the engine never fails a column
    /// on arbitrary mixed input.
    #[test]
    fn test_engine_on_mixed_input(left in mixed_cells(60), right in mixed_cells(60)) {
        let rows = left.len().min(right.len());
        let batch = TabularBatch::new(
            "mixed",
            vec![
                Column::new("left", left.into_iter().take(rows).collect()),
                Column::new("email", right.into_iter().take(rows).collect()),
            ],
        )
        .unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let profile = rt.block_on(async {
            ProfileEngine::new(RuleConfig::default()).unwrap().profile(batch).await
        }).unwrap();

        prop_assert_eq!(profile.columns.len(), 2);
        for column in &profile.columns {
            prop_assert!(!column.is_failed());
            let pii = column.pii.as_ref().unwrap();
            prop_assert!((0.0..=1.0).contains(&pii.confidence_score));
            let quality = column.quality.as_ref().unwrap();
            prop_assert!((0.0..=100.0).contains(&quality.completeness_percentage));
        }
    }
}
