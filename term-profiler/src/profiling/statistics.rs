//! Record, null and distinct counts.

use std::collections::HashMap;

use crate::batch::{Column, ValueKey};
use crate::profiling::types::ColumnStatistics;

/// Value frequencies of a column's non-null cells in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    entries: Vec<(ValueKey, usize)>,
}

impl FrequencyTable {
    pub fn build(column: &Column) -> Self {
        let mut index: HashMap<ValueKey, usize> = HashMap::new();
        let mut entries: Vec<(ValueKey, usize)> = Vec::new();
        for key in column.values.iter().filter_map(|v| v.key()) {
            match index.get(&key) {
                Some(&position) => entries[position].1 += 1,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, 1));
                }
            }
        }
        Self { entries }
    }

    /// `(value, count)` pairs, first occurrence first.
    pub fn entries(&self) -> &[(ValueKey, usize)] {
        &self.entries
    }

    pub fn distinct_count(&self) -> usize {
        self.entries.len()
    }

    pub fn unique_count(&self) -> usize {
        self.entries.iter().filter(|(_, count)| *count == 1).count()
    }
}

/// Computes the counts block for one column.
pub fn column_statistics(column: &Column, frequencies: &FrequencyTable) -> ColumnStatistics {
    let total_count = column.len();
    let null_count = column.null_count();
    let distinct_count = frequencies.distinct_count();

    ColumnStatistics {
        total_count,
        null_count,
        non_null_count: total_count - null_count,
        null_percentage: percentage(null_count, total_count),
        unique_count: frequencies.unique_count(),
        distinct_count,
        distinct_count_with_null: distinct_count + usize::from(null_count > 0),
        duplicate_count: total_count - distinct_count,
    }
}

/// `part / whole` on a 0-100 scale, 0 for an empty whole.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `part / whole` on a 0-1 scale, 0 for an empty whole.
pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CellValue;

    fn stats(values: Vec<CellValue>) -> ColumnStatistics {
        let column = Column::new("c", values);
        let frequencies = FrequencyTable::build(&column);
        column_statistics(&column, &frequencies)
    }

    #[test]
    fn test_counts_with_nulls() {
        let s = stats(vec![
            "a".into(),
            "b".into(),
            "a".into(),
            CellValue::Null,
            CellValue::Null,
        ]);
        assert_eq!(s.total_count, 5);
        assert_eq!(s.null_count, 2);
        assert_eq!(s.non_null_count, 3);
        assert_eq!(s.null_percentage, 40.0);
        assert_eq!(s.unique_count, 1);
        assert_eq!(s.distinct_count, 2);
        assert_eq!(s.distinct_count_with_null, 3);
        assert_eq!(s.duplicate_count, 3);
    }

    #[test]
    fn test_empty_column() {
        let s = stats(vec![]);
        assert_eq!(s.total_count, 0);
        assert_eq!(s.null_percentage, 0.0);
        assert_eq!(s.duplicate_count, 0);
    }

    #[test]
    fn test_integral_float_and_int_are_one_value() {
        let s = stats(vec![1i64.into(), 1.0f64.into(), 2.5f64.into()]);
        assert_eq!(s.distinct_count, 2);
        assert_eq!(s.unique_count, 1);
    }

    #[test]
    fn test_frequency_table_keeps_first_occurrence_order() {
        let column = Column::from_values("c", ["z", "a", "z", "m"]);
        let table = FrequencyTable::build(&column);
        let order: Vec<String> = table.entries().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(order, vec!["z", "a", "m"]);
        assert_eq!(table.entries()[0].1, 2);
    }
}
