//! Single-column and pairwise candidate key discovery.
//!
//! Unlike the column statistics, null counts as a value here: a key must
//! have no nulls at all and as many distinct values as the batch has rows.
//! Composite discovery stops at pairs.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::batch::{TabularBatch, ValueKey};
use crate::config::KeyConfig;
use crate::error::{ProfilerError, Result};
use crate::profiling::statistics::percentage;
use crate::profiling::types::{
    CandidateKey, CandidateKeyReport, ColumnUniqueness, KeyRecommendation, PairUniqueness,
};

/// A key candidate before recommendations are assigned.
#[derive(Debug, Clone)]
struct Evaluated {
    positions: Vec<usize>,
    uniqueness: f64,
    has_nulls: bool,
    qualifies: bool,
}

/// Discovers candidate keys over the whole batch.
pub fn discover_keys(
    batch: &TabularBatch,
    config: &KeyConfig,
    cancel: &CancellationToken,
) -> Result<CandidateKeyReport> {
    let rows = batch.row_count();
    let columns = batch.columns();

    let mut keyed: Vec<Vec<Option<ValueKey>>> = Vec::with_capacity(columns.len());
    let mut singles: Vec<Evaluated> = Vec::with_capacity(columns.len());
    for (position, column) in columns.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ProfilerError::Cancelled);
        }
        let keys: Vec<Option<ValueKey>> = column.values.iter().map(|v| v.key()).collect();
        let distinct = keys.iter().collect::<HashSet<_>>().len();
        let has_nulls = keys.iter().any(Option::is_none);
        singles.push(Evaluated {
            positions: vec![position],
            uniqueness: percentage(distinct, rows),
            has_nulls,
            qualifies: rows > 0 && !has_nulls && distinct == rows,
        });
        keyed.push(keys);
    }

    let single_key_count = singles.iter().filter(|e| e.qualifies).count();

    // Pairs only among columns that are not keys on their own.
    let considered: Vec<usize> = singles
        .iter()
        .take(config.max_composite_columns)
        .filter(|e| !e.qualifies)
        .map(|e| e.positions[0])
        .collect();

    let mut evaluated_pairs: Vec<Evaluated> = Vec::new();
    for (i, &left) in considered.iter().enumerate() {
        for &right in &considered[i + 1..] {
            if cancel.is_cancelled() {
                return Err(ProfilerError::Cancelled);
            }
            let distinct = keyed[left]
                .iter()
                .zip(&keyed[right])
                .collect::<HashSet<_>>()
                .len();
            let has_nulls = singles[left].has_nulls || singles[right].has_nulls;
            evaluated_pairs.push(Evaluated {
                positions: vec![left, right],
                uniqueness: percentage(distinct, rows),
                has_nulls,
                qualifies: rows > 0 && !has_nulls && distinct == rows,
            });
        }
    }
    let composite_pairs_evaluated = evaluated_pairs.len();
    let pairs: Vec<&Evaluated> = evaluated_pairs
        .iter()
        .filter(|e| e.qualifies || e.uniqueness >= config.near_unique_threshold)
        .collect();

    let composite_key_count = pairs.iter().filter(|e| e.qualifies).count();
    debug!(
        single_keys = single_key_count,
        composite_keys = composite_key_count,
        pairs_evaluated = composite_pairs_evaluated,
        "Candidate key discovery finished"
    );

    let names = |positions: &[usize]| -> Vec<String> {
        positions.iter().map(|p| columns[*p].name.clone()).collect()
    };
    let to_key = |e: &Evaluated, recommendation| CandidateKey {
        columns: names(&e.positions),
        is_composite: e.positions.len() > 1,
        uniqueness_percentage: e.uniqueness,
        has_nulls: e.has_nulls,
        recommendation,
    };

    let mut candidate_keys = Vec::new();
    let mut qualifying: Vec<(&Evaluated, CandidateKey)> = Vec::new();
    for e in &singles {
        if e.qualifies {
            let recommendation = if single_key_count == 1 {
                KeyRecommendation::PrimaryKey
            } else {
                KeyRecommendation::CandidateKey
            };
            qualifying.push((e, to_key(e, recommendation)));
            candidate_keys.push(to_key(e, recommendation));
        } else if rows > 0 && e.uniqueness >= config.near_unique_threshold {
            candidate_keys.push(to_key(e, KeyRecommendation::NearUnique));
        }
    }
    for &e in &pairs {
        let recommendation = if !e.qualifies {
            KeyRecommendation::NearUnique
        } else if single_key_count == 0 && composite_key_count == 1 {
            KeyRecommendation::PrimaryKey
        } else {
            KeyRecommendation::CandidateKey
        };
        if e.qualifies {
            qualifying.push((e, to_key(e, recommendation)));
        }
        candidate_keys.push(to_key(e, recommendation));
    }

    qualifying.sort_by(|(a, _), (b, _)| {
        b.uniqueness
            .total_cmp(&a.uniqueness)
            .then(a.positions.len().cmp(&b.positions.len()))
            .then(a.positions.cmp(&b.positions))
    });
    let primary_key_suggestions = qualifying
        .into_iter()
        .take(config.max_primary_key_suggestions)
        .map(|(_, key)| key)
        .collect();

    let column_uniqueness = singles
        .iter()
        .map(|e| ColumnUniqueness {
            column: columns[e.positions[0]].name.clone(),
            uniqueness_percentage: e.uniqueness,
            has_nulls: e.has_nulls,
        })
        .collect();

    let pair_uniqueness = evaluated_pairs
        .iter()
        .map(|e| PairUniqueness {
            columns: names(&e.positions),
            uniqueness_percentage: e.uniqueness,
            has_nulls: e.has_nulls,
        })
        .collect();

    Ok(CandidateKeyReport {
        column_uniqueness,
        pair_uniqueness,
        candidate_keys,
        primary_key_suggestions,
        composite_pairs_evaluated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{CellValue, Column};

    fn discover(columns: Vec<Column>) -> CandidateKeyReport {
        let batch = TabularBatch::new("t", columns).unwrap();
        discover_keys(&batch, &KeyConfig::default(), &CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_sole_unique_column_is_primary_key() {
        let report = discover(vec![
            Column::from_values("id", [1i64, 2, 3, 4, 5]),
            Column::from_values("status", ["a", "b", "a", "b", "a"]),
        ]);
        let id = &report.candidate_keys[0];
        assert_eq!(id.columns, vec!["id"]);
        assert_eq!(id.recommendation, KeyRecommendation::PrimaryKey);
        assert_eq!(id.uniqueness_percentage, 100.0);
        assert!(!id.has_nulls);
        assert_eq!(report.primary_key_suggestions.len(), 1);
        assert_eq!(report.column_uniqueness[1].uniqueness_percentage, 40.0);
    }

    #[test]
    fn test_two_unique_columns_are_candidates() {
        let report = discover(vec![
            Column::from_values("id", [1i64, 2, 3]),
            Column::from_values("code", ["x", "y", "z"]),
        ]);
        assert!(report
            .candidate_keys
            .iter()
            .all(|k| k.recommendation == KeyRecommendation::CandidateKey));
        assert_eq!(report.primary_key_suggestions[0].columns, vec!["id"]);
        assert_eq!(report.composite_pairs_evaluated, 0);
    }

    #[test]
    fn test_null_disqualifies_and_marks_near_unique() {
        let mut values: Vec<CellValue> = (0..99).map(CellValue::from).collect();
        values.push(CellValue::Null);
        let report = discover(vec![Column::new("maybe_id", values)]);
        let key = &report.candidate_keys[0];
        assert_eq!(key.recommendation, KeyRecommendation::NearUnique);
        assert!(key.has_nulls);
        assert_eq!(key.uniqueness_percentage, 100.0);
        assert!(report.primary_key_suggestions.is_empty());
    }

    #[test]
    fn test_composite_pair_becomes_primary_key() {
        let report = discover(vec![
            Column::from_values("order_id", [1i64, 1, 2, 2]),
            Column::from_values("line", [1i64, 2, 1, 2]),
            Column::from_values("qty", [5i64, 5, 5, 5]),
        ]);
        let composite: Vec<&CandidateKey> = report
            .candidate_keys
            .iter()
            .filter(|k| k.is_composite)
            .collect();
        assert_eq!(composite.len(), 1);
        assert_eq!(composite[0].columns, vec!["order_id", "line"]);
        assert_eq!(composite[0].recommendation, KeyRecommendation::PrimaryKey);
        assert_eq!(report.composite_pairs_evaluated, 3);
        assert_eq!(
            report.primary_key_suggestions[0].columns,
            vec!["order_id", "line"]
        );
    }

    #[test]
    fn test_pair_uniqueness_reported_below_threshold() {
        let report = discover(vec![
            Column::from_values("region", ["n", "n", "s", "s"]),
            Column::from_values("tier", ["a", "a", "a", "b"]),
        ]);
        assert!(report.candidate_keys.is_empty());
        assert_eq!(report.pair_uniqueness.len(), 1);
        let pair = &report.pair_uniqueness[0];
        assert_eq!(pair.columns, vec!["region", "tier"]);
        assert_eq!(pair.uniqueness_percentage, 75.0);
        assert!(!pair.has_nulls);
    }

    #[test]
    fn test_pair_with_null_does_not_qualify() {
        let report = discover(vec![
            Column::from_values("a", [Some(1i64), Some(1), None]),
            Column::from_values("b", [1i64, 2, 1]),
        ]);
        assert!(report.candidate_keys.iter().all(|k| !k.is_composite
            || k.recommendation == KeyRecommendation::NearUnique));
        assert!(report.primary_key_suggestions.is_empty());
    }

    #[test]
    fn test_cancellation_stops_discovery() {
        let batch = TabularBatch::new("t", vec![Column::from_values("a", [1i64])]).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = discover_keys(&batch, &KeyConfig::default(), &cancel);
        assert!(matches!(result, Err(ProfilerError::Cancelled)));
    }

    #[test]
    fn test_empty_batch_has_no_keys() {
        let report = discover(vec![Column::new("a", vec![])]);
        assert!(report.candidate_keys.is_empty());
        assert!(report.primary_key_suggestions.is_empty());
    }
}
