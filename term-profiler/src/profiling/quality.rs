//! Column quality scoring and grading.
//!
//! The 0-100 quality score is a weighted average of completeness, validity,
//! consistency and conformity. The grade is decided separately from two
//! signals, null rate and distinctness, so a near-constant or near-unique
//! but dirty column is not rated as generously as its average suggests.

use crate::config::GradingConfig;
use crate::profiling::statistics::{percentage, ratio};
use crate::profiling::types::{
    ColumnStatistics, DateTimeStats, InferredType, IssueKind, IssueSeverity, NumericStats,
    QualityGrade, QualityIssue, QualityMetrics, StringStats, TypeAnalysis,
};

/// Outputs of the earlier column rules that grading consumes.
#[derive(Debug, Clone, Copy)]
pub struct QualityInputs<'a> {
    pub statistics: &'a ColumnStatistics,
    pub type_analysis: &'a TypeAnalysis,
    pub numeric: Option<&'a NumericStats>,
    pub string: Option<&'a StringStats>,
    pub datetime: Option<&'a DateTimeStats>,
}

/// Scores and grades a column.
pub fn grade_column(inputs: QualityInputs<'_>, config: &GradingConfig) -> QualityMetrics {
    let stats = inputs.statistics;
    let inferred = inputs.type_analysis.inferred_type;

    let completeness = 100.0 - stats.null_percentage;
    let validity = 100.0 * inputs.type_analysis.type_consistency_rate;

    let consistency = match inferred {
        InferredType::String => inputs
            .string
            .map(|s| percentage(s.count - s.untrimmed_count, s.count))
            .unwrap_or(validity),
        InferredType::Date => inputs
            .datetime
            .and_then(|d| {
                d.format_patterns
                    .first()
                    .map(|dominant| percentage(dominant.count, d.parsed_count))
            })
            .unwrap_or(validity),
        InferredType::Numeric | InferredType::Boolean => validity,
        InferredType::Unknown => 0.0,
    };

    let conformity = match inferred {
        InferredType::String => inputs
            .string
            .and_then(|s| s.top_patterns.first().map(|p| p.percentage))
            .unwrap_or(validity),
        InferredType::Date => inputs
            .datetime
            .map(|d| 100.0 * d.format_consistency)
            .unwrap_or(validity),
        InferredType::Numeric => inputs
            .numeric
            .map(|n| 100.0 - n.outlier_percentage)
            .unwrap_or(validity),
        InferredType::Boolean => validity,
        InferredType::Unknown => 0.0,
    };

    let weights = config.weights;
    let quality_score = (weights.completeness * completeness
        + weights.validity * validity
        + weights.consistency * consistency
        + weights.conformity * conformity)
        / weights.sum();

    let null_rate = ratio(stats.null_count, stats.total_count);
    let distinctness = ratio(stats.distinct_count_with_null, stats.total_count);

    QualityMetrics {
        completeness_percentage: completeness,
        validity_percentage: validity,
        consistency_score: consistency,
        conformity_rate: conformity,
        quality_score,
        null_rate,
        distinctness,
        grade: column_grade(null_rate, distinctness, config),
        issues: collect_issues(inputs, config),
    }
}

/// Gold and Silver each require the null rate at or below the band's
/// maximum and distinctness inside the band; everything else is Bronze.
pub fn column_grade(null_rate: f64, distinctness: f64, config: &GradingConfig) -> QualityGrade {
    if config.gold.admits(null_rate, distinctness) {
        QualityGrade::Gold
    } else if config.silver.admits(null_rate, distinctness) {
        QualityGrade::Silver
    } else {
        QualityGrade::Bronze
    }
}

/// Coarser grade for a whole dataset, from its mean quality score.
pub fn dataset_grade(score: f64, config: &GradingConfig) -> QualityGrade {
    if score >= config.dataset_gold_score {
        QualityGrade::Gold
    } else if score >= config.dataset_silver_score {
        QualityGrade::Silver
    } else {
        QualityGrade::Bronze
    }
}

fn collect_issues(inputs: QualityInputs<'_>, config: &GradingConfig) -> Vec<QualityIssue> {
    let mut issues = Vec::new();
    let mut push = |kind, severity, message: String| {
        issues.push(QualityIssue {
            kind,
            severity,
            message,
        })
    };

    let stats = inputs.statistics;
    if stats.null_percentage > config.null_warning_percentage {
        push(
            IssueKind::HighNullRate,
            IssueSeverity::Warning,
            format!("{:.1}% of values are null", stats.null_percentage),
        );
    }

    let analysis = inputs.type_analysis;
    if analysis.native_kinds.len() > 1 {
        let kinds: Vec<String> = analysis
            .native_kinds
            .iter()
            .map(|k| format!("{k:?}").to_lowercase())
            .collect();
        push(
            IssueKind::MixedTypes,
            IssueSeverity::Warning,
            format!("Column contains multiple value kinds: {}", kinds.join(", ")),
        );
    }
    if analysis.type_mismatch_count > 0 {
        push(
            IssueKind::TypeMismatch,
            IssueSeverity::Error,
            format!(
                "{} of {} sampled values do not match the inferred type",
                analysis.type_mismatch_count, analysis.sampled_count
            ),
        );
    }

    if let Some(s) = inputs.string {
        if s.untrimmed_count > 0 {
            push(
                IssueKind::Whitespace,
                IssueSeverity::Warning,
                format!(
                    "Found {} values with leading/trailing whitespace",
                    s.untrimmed_count
                ),
            );
        }
        if s.mixed_case {
            push(
                IssueKind::InconsistentCase,
                IssueSeverity::Warning,
                format!(
                    "Mixed case: {} lowercase, {} uppercase",
                    s.lowercase_count, s.uppercase_count
                ),
            );
        }
        if s.special_character_count > 0 {
            push(
                IssueKind::SpecialCharacters,
                IssueSeverity::Warning,
                format!(
                    "Found {} values with special characters",
                    s.special_character_count
                ),
            );
        }
    }

    if let Some(n) = inputs.numeric {
        if n.outlier_count > 0 {
            push(
                IssueKind::Outliers,
                IssueSeverity::Warning,
                format!("Found {} potential outliers", n.outlier_count),
            );
        }
    }

    if let Some(d) = inputs.datetime {
        if d.low_format_consistency {
            push(
                IssueKind::LowFormatConsistency,
                IssueSeverity::Warning,
                format!(
                    "Only {:.1}% of values parse as dates",
                    d.format_consistency * 100.0
                ),
            );
        }
    }

    issues
}
