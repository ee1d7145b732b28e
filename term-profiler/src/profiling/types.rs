//! Profile document types.
//!
//! Everything here is produced once per run and never mutated afterwards.
//! Optional blocks are omitted from JSON when absent so consumers can test
//! for a disabled or inapplicable rule by key absence.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::CellKind;
use crate::error::Result;
use crate::profiling::plan::RuleKind;

/// Dominant semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    Numeric,
    String,
    Date,
    Boolean,
    Unknown,
}

/// The coercion that won inference, finer grained than [`InferredType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionKind {
    Boolean,
    Integer,
    Float,
    DateTime,
    Text,
}

impl CoercionKind {
    pub fn inferred_type(&self) -> InferredType {
        match self {
            CoercionKind::Boolean => InferredType::Boolean,
            CoercionKind::Integer | CoercionKind::Float => InferredType::Numeric,
            CoercionKind::DateTime => InferredType::Date,
            CoercionKind::Text => InferredType::String,
        }
    }
}

/// Output of the type inferencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAnalysis {
    pub inferred_type: InferredType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coercion: Option<CoercionKind>,
    /// Fraction of the sample that coerces to the inferred type, 0-1
    pub type_consistency_rate: f64,
    pub sampled_count: usize,
    pub type_mismatch_count: usize,
    /// Date formats seen in the sample, most frequent first
    pub detected_formats: Vec<String>,
    /// Native cell kinds present among non-null values
    pub native_kinds: Vec<CellKind>,
}

/// Record counts for one column.
///
/// `distinct_count` excludes null. `distinct_count_with_null` counts null
/// as one more value and is what grading and key discovery use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub total_count: usize,
    pub null_count: usize,
    pub non_null_count: usize,
    /// 0-100
    pub null_percentage: f64,
    pub unique_count: usize,
    pub distinct_count: usize,
    pub distinct_count_with_null: usize,
    pub duplicate_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub percentiles: Vec<PercentileValue>,
    pub outlier_method: OutlierMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_fence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_fence: Option<f64>,
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    pub coercion_failure_count: usize,
}

/// Character counts across all non-null values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSetSummary {
    pub ascii_alphanumeric: usize,
    pub ascii_whitespace: usize,
    pub ascii_special: usize,
    pub non_ascii: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFrequency {
    pub pattern: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringStats {
    pub count: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub avg_length: f64,
    pub empty_count: usize,
    pub whitespace_only_count: usize,
    pub leading_whitespace_count: usize,
    pub trailing_whitespace_count: usize,
    /// Values with leading or trailing whitespace
    pub untrimmed_count: usize,
    pub character_set: CharacterSetSummary,
    pub top_patterns: Vec<PatternFrequency>,
    pub lowercase_count: usize,
    pub uppercase_count: usize,
    pub mixed_case: bool,
    pub special_character_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatCount {
    pub format: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeStats {
    pub parsed_count: usize,
    pub invalid_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_days: Option<i64>,
    /// parsed / non-null, 0-1
    pub format_consistency: f64,
    pub low_format_consistency: bool,
    pub future_count: usize,
    pub past_count: usize,
    pub weekend_count: usize,
    pub weekday_count: usize,
    pub format_patterns: Vec<FormatCount>,
    pub timezone_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFrequency {
    pub value: String,
    pub count: usize,
    /// Share of total_count, nulls included, 0-100
    pub percentage: f64,
}

/// A histogram edge: a number, or a timestamp for date columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinEdge {
    Number(f64),
    Timestamp(NaiveDateTime),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: BinEdge,
    pub upper: BinEdge,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDistribution {
    pub cardinality: usize,
    pub cardinality_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ValueFrequency>,
    pub top_values: Vec<ValueFrequency>,
    pub bottom_values: Vec<ValueFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skewness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Vec<HistogramBin>>,
}

/// PII risk bucket. Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiCategoryMatch {
    pub category: String,
    pub match_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiFinding {
    pub matched_count: usize,
    pub match_rate: f64,
    pub name_hint: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    pub confidence_score: f64,
    pub risk_level: RiskLevel,
    pub pii_categories: Vec<PiiCategoryMatch>,
    pub sample_values: Vec<String>,
}

/// Column grade. Ordered so that `Bronze < Silver < Gold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Bronze,
    Silver,
    Gold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    HighNullRate,
    MixedTypes,
    TypeMismatch,
    Whitespace,
    InconsistentCase,
    SpecialCharacters,
    Outliers,
    LowFormatConsistency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness_percentage: f64,
    pub validity_percentage: f64,
    pub consistency_score: f64,
    pub conformity_rate: f64,
    pub quality_score: f64,
    /// 0-1
    pub null_rate: f64,
    /// Distinct values including null over row count, 0-1
    pub distinctness: f64,
    pub grade: QualityGrade,
    pub issues: Vec<QualityIssue>,
}

/// Why a rule produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    NotApplicable,
    BatchTooLarge,
    NoDeclarations,
}

/// Outcome of one rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleStatus {
    Completed,
    Skipped { reason: SkipReason },
    Failed { message: String },
}

impl RuleStatus {
    pub fn skipped(reason: SkipReason) -> Self {
        RuleStatus::Skipped { reason }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        RuleStatus::Failed {
            message: message.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuleStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStatus {
    Completed,
    Failed,
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub index: usize,
    pub status: ColumnStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub inferred_type: InferredType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_analysis: Option<TypeAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ColumnStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<StringStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTimeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<ValueDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pii: Option<PiiFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
    pub rule_status: BTreeMap<RuleKind, RuleStatus>,
}

impl ColumnProfile {
    /// A profile for a column whose analysis failed outright.
    pub fn failed(name: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        let rule_status = RuleKind::ALL
            .into_iter()
            .filter(|kind| kind.level() == crate::profiling::plan::RuleLevel::Attribute)
            .map(|kind| (kind, RuleStatus::failed(message.clone())))
            .collect();
        Self {
            name: name.into(),
            index,
            status: ColumnStatus::Failed,
            failure: Some(message),
            inferred_type: InferredType::Unknown,
            type_analysis: None,
            statistics: None,
            numeric: None,
            string: None,
            datetime: None,
            distribution: None,
            pii: None,
            quality: None,
            rule_status,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ColumnStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRecommendation {
    PrimaryKey,
    CandidateKey,
    NearUnique,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateKey {
    pub columns: Vec<String>,
    pub is_composite: bool,
    /// 0-100
    pub uniqueness_percentage: f64,
    pub has_nulls: bool,
    pub recommendation: KeyRecommendation,
}

/// Uniqueness of a single column, reported whether or not it qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnUniqueness {
    pub column: String,
    pub uniqueness_percentage: f64,
    pub has_nulls: bool,
}

/// Uniqueness of one evaluated column pair, whether or not it qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairUniqueness {
    pub columns: Vec<String>,
    pub uniqueness_percentage: f64,
    pub has_nulls: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateKeyReport {
    pub column_uniqueness: Vec<ColumnUniqueness>,
    pub pair_uniqueness: Vec<PairUniqueness>,
    pub candidate_keys: Vec<CandidateKey>,
    pub primary_key_suggestions: Vec<CandidateKey>,
    pub composite_pairs_evaluated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Evaluated,
    NotEvaluated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferentialIntegrityResult {
    pub child_column: String,
    pub parent_column: String,
    pub status: IntegrityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub non_null_child_count: usize,
    pub missing_count: usize,
    /// 0-1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_rate: Option<f64>,
    pub orphan_samples: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    OrphanRecords,
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityFinding {
    pub kind: FindingKind,
    pub child_column: String,
    pub parent_column: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferentialIntegrityReport {
    pub results: Vec<ReferentialIntegrityResult>,
    pub findings: Vec<IntegrityFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub row_count: usize,
    pub column_count: usize,
    pub dataset_size_bytes: u64,
    pub size_estimated: bool,
    pub profiled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiling_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuality {
    pub overall_completeness: f64,
    pub overall_validity: f64,
    pub overall_consistency: f64,
    pub overall_conformity: f64,
    pub overall_quality_score: f64,
    pub overall_quality_grade: QualityGrade,
    pub total_null_count: usize,
    pub overall_null_percentage: f64,
    pub pii_risk_score: f64,
    pub pii_risk_level: RiskLevel,
    pub graded_column_count: usize,
    pub failed_column_count: usize,
}

/// The terminal artifact of a profiling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub dataset_name: String,
    pub columns: Vec<ColumnProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_statistics: Option<DatasetStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_quality: Option<DatasetQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_keys: Option<CandidateKeyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referential_integrity: Option<ReferentialIntegrityReport>,
    /// One status per rule group
    pub rule_status: BTreeMap<RuleKind, RuleStatus>,
}

impl DatasetProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn status(&self, kind: RuleKind) -> Option<&RuleStatus> {
        self.rule_status.get(&kind)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
