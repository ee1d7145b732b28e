//! Dataset-level roll-ups computed from the column profiles.

use chrono::{DateTime, Utc};

use crate::batch::TabularBatch;
use crate::config::RuleConfig;
use crate::profiling::pii::risk_level;
use crate::profiling::quality::dataset_grade;
use crate::profiling::statistics::percentage;
use crate::profiling::types::{
    ColumnProfile, DatasetQuality, DatasetStatistics, QualityMetrics, RiskLevel,
};

pub fn dataset_statistics(
    batch: &TabularBatch,
    profiled_at: DateTime<Utc>,
    profiling_duration_ms: Option<u64>,
) -> DatasetStatistics {
    let (dataset_size_bytes, size_estimated) = batch.effective_size_bytes();
    DatasetStatistics {
        row_count: batch.row_count(),
        column_count: batch.column_count(),
        dataset_size_bytes,
        size_estimated,
        profiled_at,
        profiling_duration_ms,
    }
}

/// Averages column quality over the columns that were graded.
///
/// Failed columns are counted but excluded from every mean. With no graded
/// columns the means are zero and the grade falls to the lowest band.
pub fn dataset_quality(
    columns: &[ColumnProfile],
    batch: &TabularBatch,
    config: &RuleConfig,
) -> DatasetQuality {
    let graded: Vec<&QualityMetrics> = columns
        .iter()
        .filter(|c| !c.is_failed())
        .filter_map(|c| c.quality.as_ref())
        .collect();

    let mean = |select: fn(&QualityMetrics) -> f64| -> f64 {
        if graded.is_empty() {
            0.0
        } else {
            graded.iter().map(|q| select(q)).sum::<f64>() / graded.len() as f64
        }
    };
    let overall_quality_score = mean(|q| q.quality_score);

    let total_null_count: usize = batch.columns().iter().map(|c| c.null_count()).sum();
    let total_cells = batch.row_count() * batch.column_count();

    let pii_risk_score = columns
        .iter()
        .filter_map(|c| c.pii.as_ref())
        .map(|p| p.confidence_score)
        .fold(0.0_f64, f64::max);
    let pii_risk_level = if columns.iter().any(|c| c.pii.is_some()) {
        risk_level(pii_risk_score, &config.pii)
    } else {
        RiskLevel::Low
    };

    DatasetQuality {
        overall_completeness: mean(|q| q.completeness_percentage),
        overall_validity: mean(|q| q.validity_percentage),
        overall_consistency: mean(|q| q.consistency_score),
        overall_conformity: mean(|q| q.conformity_rate),
        overall_quality_score,
        overall_quality_grade: dataset_grade(overall_quality_score, &config.grading),
        total_null_count,
        overall_null_percentage: percentage(total_null_count, total_cells),
        pii_risk_score,
        pii_risk_level,
        graded_column_count: graded.len(),
        failed_column_count: columns.iter().filter(|c| c.is_failed()).count(),
    }
}
