//! Numeric summary statistics and outlier detection.
//!
//! Quantiles use linear interpolation between closest ranks, the same
//! definition as most dataframe libraries. Standard deviation and variance
//! are population figures.

use crate::batch::Column;
use crate::config::NumericConfig;
use crate::profiling::statistics::percentage;
use crate::profiling::types::{NumericStats, OutlierMethod, PercentileValue};

/// The numeric view of every non-null cell, plus how many failed to coerce.
pub fn numeric_values(column: &Column) -> (Vec<f64>, usize) {
    let mut failures = 0;
    let values = column
        .non_null()
        .filter_map(|v| {
            let number = v.as_f64();
            if number.is_none() {
                failures += 1;
            }
            number
        })
        .collect();
    (values, failures)
}

/// Interpolated quantile of already sorted values, `q` in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Population mean and variance.
pub fn mean_variance(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance))
}

/// Computes the numeric block. Returns `None` when no value coerces.
pub fn numeric_stats(column: &Column, config: &NumericConfig) -> Option<NumericStats> {
    let (mut values, coercion_failure_count) = numeric_values(column);
    values.sort_by(f64::total_cmp);

    let (mean, variance) = mean_variance(&values)?;
    let std_dev = variance.sqrt();
    let q1 = quantile(&values, 0.25)?;
    let median = quantile(&values, 0.5)?;
    let q3 = quantile(&values, 0.75)?;
    let iqr = q3 - q1;

    let percentiles = config
        .percentiles
        .iter()
        .filter_map(|p| {
            quantile(&values, p / 100.0).map(|value| PercentileValue {
                percentile: *p,
                value,
            })
        })
        .collect();

    let (outlier_method, lower_fence, upper_fence, outlier_count) = if iqr > 0.0 {
        let lower = q1 - config.iqr_multiplier * iqr;
        let upper = q3 + config.iqr_multiplier * iqr;
        let count = values.iter().filter(|v| **v < lower || **v > upper).count();
        (OutlierMethod::Iqr, Some(lower), Some(upper), count)
    } else if std_dev > 0.0 {
        let threshold = config.z_score_threshold;
        let count = values
            .iter()
            .filter(|v| ((**v - mean) / std_dev).abs() > threshold)
            .count();
        (
            OutlierMethod::ZScore,
            Some(mean - threshold * std_dev),
            Some(mean + threshold * std_dev),
            count,
        )
    } else {
        (OutlierMethod::ZScore, None, None, 0)
    };

    Some(NumericStats {
        count: values.len(),
        min: values[0],
        max: values[values.len() - 1],
        mean,
        median,
        std_dev,
        variance,
        q1,
        q3,
        iqr,
        percentiles,
        outlier_method,
        lower_fence,
        upper_fence,
        outlier_count,
        outlier_percentage: percentage(outlier_count, values.len()),
        coercion_failure_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CellValue;

    fn stats(values: Vec<CellValue>) -> NumericStats {
        numeric_stats(&Column::new("n", values), &NumericConfig::default()).unwrap()
    }

    #[test]
    fn test_iqr_outlier() {
        let s = stats(vec![
            1i64.into(),
            2i64.into(),
            3i64.into(),
            4i64.into(),
            100i64.into(),
        ]);
        assert_eq!(s.q1, 2.0);
        assert_eq!(s.q3, 4.0);
        assert_eq!(s.iqr, 2.0);
        assert_eq!(s.upper_fence, Some(7.0));
        assert_eq!(s.lower_fence, Some(-1.0));
        assert_eq!(s.outlier_method, OutlierMethod::Iqr);
        assert_eq!(s.outlier_count, 1);
        assert_eq!(s.outlier_percentage, 20.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 100.0);
    }

    #[test]
    fn test_population_variance() {
        let s = stats([2i64, 4, 4, 4, 5, 5, 7, 9].map(CellValue::from).to_vec());
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.variance, 4.0);
        assert_eq!(s.std_dev, 2.0);
    }

    #[test]
    fn test_zscore_fallback_when_iqr_is_zero() {
        let mut values: Vec<CellValue> = (0..20).map(|_| CellValue::Int(10)).collect();
        values.push(CellValue::Int(1000));
        let s = stats(values);
        assert_eq!(s.iqr, 0.0);
        assert_eq!(s.outlier_method, OutlierMethod::ZScore);
        assert_eq!(s.outlier_count, 1);
    }

    #[test]
    fn test_constant_column_has_no_outliers() {
        let s = stats(vec![5i64.into(), 5i64.into(), 5i64.into()]);
        assert_eq!(s.outlier_count, 0);
        assert_eq!(s.std_dev, 0.0);
        assert!(s.upper_fence.is_none());
    }

    #[test]
    fn test_percentiles_and_coercion_failures() {
        let s = stats(vec![
            "10".into(),
            "20".into(),
            "oops".into(),
            CellValue::Null,
            30.0f64.into(),
            40i64.into(),
        ]);
        assert_eq!(s.count, 4);
        assert_eq!(s.coercion_failure_count, 1);
        let p5 = &s.percentiles[0];
        assert_eq!(p5.percentile, 5.0);
        assert!((p5.value - 11.5).abs() < 1e-9);
        assert_eq!(s.percentiles.len(), 4);
    }

    #[test]
    fn test_no_numeric_values() {
        let column = Column::from_values("n", ["a", "b"]);
        assert!(numeric_stats(&column, &NumericConfig::default()).is_none());
    }
}
