//! Frequency tables, skewness and histograms.

use chrono::DateTime;

use crate::batch::{Column, ValueKey};
use crate::config::RuleConfig;
use crate::profiling::datetime::parsed_dates;
use crate::profiling::numeric::{mean_variance, numeric_values};
use crate::profiling::statistics::{percentage, ratio, FrequencyTable};
use crate::profiling::types::{
    BinEdge, HistogramBin, InferredType, ValueDistribution, ValueFrequency,
};

/// Computes the distribution block.
pub fn value_distribution(
    column: &Column,
    frequencies: &FrequencyTable,
    inferred: InferredType,
    config: &RuleConfig,
) -> ValueDistribution {
    let total = column.len();
    let entries = frequencies.entries();
    let to_frequency = |(value, count): &(ValueKey, usize)| ValueFrequency {
        value: value.to_string(),
        count: *count,
        percentage: percentage(*count, total),
    };

    // Both sorts are stable, so ties keep first-occurrence order.
    let mut descending: Vec<&(ValueKey, usize)> = entries.iter().collect();
    descending.sort_by(|a, b| b.1.cmp(&a.1));
    let mut ascending: Vec<&(ValueKey, usize)> = entries.iter().collect();
    ascending.sort_by(|a, b| a.1.cmp(&b.1));

    let top_values: Vec<ValueFrequency> = descending
        .iter()
        .take(config.distribution.top_n)
        .map(|e| to_frequency(*e))
        .collect();
    let bottom_values = ascending
        .iter()
        .take(config.distribution.bottom_n)
        .map(|e| to_frequency(*e))
        .collect();

    let bins = config.distribution.histogram_bins;
    let (skewness, histogram) = match inferred {
        InferredType::Numeric => {
            let (values, _) = numeric_values(column);
            (skewness(&values), numeric_histogram(&values, bins))
        }
        InferredType::Date => {
            let stamps: Vec<i64> = parsed_dates(column, &config.datetime.formats)
                .iter()
                .map(|p| p.value.and_utc().timestamp_millis())
                .collect();
            (None, date_histogram(&stamps, bins))
        }
        _ => (None, None),
    };

    ValueDistribution {
        cardinality: frequencies.distinct_count(),
        cardinality_ratio: ratio(frequencies.distinct_count(), total),
        mode: descending.first().map(|e| to_frequency(*e)),
        top_values,
        bottom_values,
        skewness,
        histogram,
    }
}

/// Population skewness `g1 = m3 / m2^1.5`; zero for a constant column.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let (mean, m2) = mean_variance(values)?;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / values.len() as f64;
    Some(m3 / m2.powf(1.5))
}

/// Equal-width bin counts as `(lower, upper, count)`. The last bin is
/// closed on both ends; a constant input yields one bin.
fn bin_counts(values: &[f64], bins: usize) -> Option<Vec<(f64, f64, usize)>> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;

    if min == max || bins <= 1 {
        return Some(vec![(min, max, values.len())]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let index = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    Some(
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| {
                let lower = min + width * i as f64;
                let upper = if i == bins - 1 {
                    max
                } else {
                    min + width * (i + 1) as f64
                };
                (lower, upper, count)
            })
            .collect(),
    )
}

fn numeric_histogram(values: &[f64], bins: usize) -> Option<Vec<HistogramBin>> {
    Some(
        bin_counts(values, bins)?
            .into_iter()
            .map(|(lower, upper, count)| HistogramBin {
                lower: BinEdge::Number(lower),
                upper: BinEdge::Number(upper),
                count,
            })
            .collect(),
    )
}

fn date_histogram(stamps: &[i64], bins: usize) -> Option<Vec<HistogramBin>> {
    let as_float: Vec<f64> = stamps.iter().map(|s| *s as f64).collect();
    let to_edge = |millis: f64| {
        DateTime::from_timestamp_millis(millis.round() as i64)
            .map(|d| BinEdge::Timestamp(d.naive_utc()))
    };
    bin_counts(&as_float, bins)?
        .into_iter()
        .map(|(lower, upper, count)| {
            Some(HistogramBin {
                lower: to_edge(lower)?,
                upper: to_edge(upper)?,
                count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CellValue;

    fn distribution(values: Vec<CellValue>, inferred: InferredType) -> ValueDistribution {
        let column = Column::new("c", values);
        let table = FrequencyTable::build(&column);
        value_distribution(&column, &table, inferred, &RuleConfig::default())
    }

    #[test]
    fn test_top_and_bottom_ties_keep_input_order() {
        let d = distribution(
            vec!["b".into(), "a".into(), "c".into(), "a".into(), CellValue::Null],
            InferredType::String,
        );
        assert_eq!(d.cardinality, 3);
        assert_eq!(d.cardinality_ratio, 0.6);
        let mode = d.mode.unwrap();
        assert_eq!(mode.value, "a");
        assert_eq!(mode.count, 2);
        assert_eq!(mode.percentage, 40.0);

        let bottom: Vec<&str> = d.bottom_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(bottom, vec!["b", "c", "a"]);
        let top: Vec<&str> = d.top_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(top, vec!["a", "b", "c"]);
        assert!(d.skewness.is_none());
        assert!(d.histogram.is_none());
    }

    #[test]
    fn test_numeric_histogram_has_configured_bins() {
        let values: Vec<CellValue> = (0..100).map(CellValue::from).collect();
        let d = distribution(values, InferredType::Numeric);
        let histogram = d.histogram.unwrap();
        assert_eq!(histogram.len(), 20);
        assert_eq!(histogram.iter().map(|b| b.count).sum::<usize>(), 100);
        assert_eq!(histogram[19].upper, BinEdge::Number(99.0));
        assert!(d.skewness.unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_single_bin() {
        let d = distribution(vec![7i64.into(), 7i64.into()], InferredType::Numeric);
        let histogram = d.histogram.unwrap();
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].count, 2);
        assert_eq!(d.skewness, Some(0.0));
    }

    #[test]
    fn test_right_skewed_is_positive() {
        let d = distribution(
            vec![1i64.into(), 1i64.into(), 2i64.into(), 2i64.into(), 50i64.into()],
            InferredType::Numeric,
        );
        assert!(d.skewness.unwrap() > 1.0);
    }

    #[test]
    fn test_date_histogram_edges_are_timestamps() {
        let d = distribution(
            vec!["2024-01-01".into(), "2024-01-11".into()],
            InferredType::Date,
        );
        let histogram = d.histogram.unwrap();
        assert_eq!(histogram.len(), 20);
        assert!(matches!(histogram[0].lower, BinEdge::Timestamp(_)));
        assert_eq!(histogram[0].count, 1);
        assert_eq!(histogram[19].count, 1);
    }

    #[test]
    fn test_empty_column_has_no_histogram() {
        let d = distribution(vec![CellValue::Null], InferredType::Unknown);
        assert!(d.histogram.is_none());
        assert!(d.mode.is_none());
        assert_eq!(d.cardinality, 0);
    }
}
