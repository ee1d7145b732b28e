//! Rule configuration.
//!
//! [`RuleConfig`] is the single explicit value that carries every threshold,
//! catalog and toggle the engine uses. It is plain data: deserializable from
//! JSON, buildable through [`RuleConfigBuilder`], and validated once, before
//! any column work starts, by [`RuleConfig::compile`].
//!
//! # Example
//!
//! ```rust
//! use term_profiler::config::{RuleConfig, SamplingStrategy};
//! use term_profiler::profiling::RuleKind;
//!
//! let config = RuleConfig::builder()
//!     .sample_size(500)
//!     .sampling(SamplingStrategy::Uniform)
//!     .histogram_bins(10)
//!     .disable(RuleKind::PiiDetection)
//!     .foreign_key("orders.customer_id", "customers.id")
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, Result};
use crate::profiling::RuleKind;

/// Complete configuration for one profiling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Which rule groups are enabled
    pub rules: Rulesets,
    pub inference: InferenceConfig,
    pub numeric: NumericConfig,
    pub string: StringConfig,
    pub datetime: DateTimeConfig,
    pub distribution: DistributionConfig,
    pub pii: PiiConfig,
    pub grading: GradingConfig,
    pub keys: KeyConfig,
    pub integrity: IntegrityConfig,
    pub execution: ExecutionConfig,
    /// Pins "now" for future/past date checks and the profile timestamp.
    /// When unset the wall clock at the start of the run is used.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rules: Rulesets::default(),
            inference: InferenceConfig::default(),
            numeric: NumericConfig::default(),
            string: StringConfig::default(),
            datetime: DateTimeConfig::default(),
            distribution: DistributionConfig::default(),
            pii: PiiConfig::default(),
            grading: GradingConfig::default(),
            keys: KeyConfig::default(),
            integrity: IntegrityConfig::default(),
            execution: ExecutionConfig::default(),
            reference_time: None,
        }
    }
}

/// Per-rule enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rulesets {
    pub column_statistics: bool,
    pub data_type_analysis: bool,
    pub numeric_analysis: bool,
    pub string_analysis: bool,
    pub date_time_analysis: bool,
    pub value_distribution: bool,
    pub pii_detection: bool,
    pub column_quality: bool,
    pub dataset_statistics: bool,
    pub candidate_keys: bool,
    pub referential_integrity: bool,
    pub dataset_quality: bool,
}

impl Default for Rulesets {
    fn default() -> Self {
        Self::all()
    }
}

impl Rulesets {
    /// Every rule enabled.
    pub fn all() -> Self {
        Self {
            column_statistics: true,
            data_type_analysis: true,
            numeric_analysis: true,
            string_analysis: true,
            date_time_analysis: true,
            value_distribution: true,
            pii_detection: true,
            column_quality: true,
            dataset_statistics: true,
            candidate_keys: true,
            referential_integrity: true,
            dataset_quality: true,
        }
    }

    /// Every rule disabled.
    pub fn none() -> Self {
        let mut rulesets = Self::all();
        for kind in RuleKind::ALL {
            rulesets.set(kind, false);
        }
        rulesets
    }

    pub fn is_enabled(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::ColumnStatistics => self.column_statistics,
            RuleKind::DataTypeAnalysis => self.data_type_analysis,
            RuleKind::NumericAnalysis => self.numeric_analysis,
            RuleKind::StringAnalysis => self.string_analysis,
            RuleKind::DateTimeAnalysis => self.date_time_analysis,
            RuleKind::ValueDistribution => self.value_distribution,
            RuleKind::PiiDetection => self.pii_detection,
            RuleKind::ColumnQuality => self.column_quality,
            RuleKind::DatasetStatistics => self.dataset_statistics,
            RuleKind::CandidateKeys => self.candidate_keys,
            RuleKind::ReferentialIntegrity => self.referential_integrity,
            RuleKind::DatasetQuality => self.dataset_quality,
        }
    }

    pub fn set(&mut self, kind: RuleKind, enabled: bool) {
        let flag = match kind {
            RuleKind::ColumnStatistics => &mut self.column_statistics,
            RuleKind::DataTypeAnalysis => &mut self.data_type_analysis,
            RuleKind::NumericAnalysis => &mut self.numeric_analysis,
            RuleKind::StringAnalysis => &mut self.string_analysis,
            RuleKind::DateTimeAnalysis => &mut self.date_time_analysis,
            RuleKind::ValueDistribution => &mut self.value_distribution,
            RuleKind::PiiDetection => &mut self.pii_detection,
            RuleKind::ColumnQuality => &mut self.column_quality,
            RuleKind::DatasetStatistics => &mut self.dataset_statistics,
            RuleKind::CandidateKeys => &mut self.candidate_keys,
            RuleKind::ReferentialIntegrity => &mut self.referential_integrity,
            RuleKind::DatasetQuality => &mut self.dataset_quality,
        };
        *flag = enabled;
    }

    pub fn with(mut self, kind: RuleKind, enabled: bool) -> Self {
        self.set(kind, enabled);
        self
    }
}

/// How the type inference sample is drawn from the non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// The first N non-null values
    Head,
    /// N values at an even stride across the column
    Uniform,
}

/// Type inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Maximum number of non-null values sampled (default: 1000)
    pub sample_size: usize,
    pub sampling: SamplingStrategy,
    /// Fraction of the sample that must coerce for a type to win (default: 0.5)
    pub majority_threshold: f64,
    /// Text tokens accepted as boolean true, compared case-insensitively
    pub true_tokens: Vec<String>,
    /// Text tokens accepted as boolean false, compared case-insensitively
    pub false_tokens: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            sampling: SamplingStrategy::Head,
            majority_threshold: 0.5,
            true_tokens: ["true", "yes", "t", "y"].map(String::from).to_vec(),
            false_tokens: ["false", "no", "f", "n"].map(String::from).to_vec(),
        }
    }
}

/// Numeric analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericConfig {
    /// Percentiles to report, on a 0-100 scale
    pub percentiles: Vec<f64>,
    /// Multiplier applied to the IQR for the outlier fences
    pub iqr_multiplier: f64,
    /// |z| above which a value is an outlier when the IQR is zero
    pub z_score_threshold: f64,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            percentiles: vec![5.0, 25.0, 75.0, 95.0],
            iqr_multiplier: 1.5,
            z_score_threshold: 3.0,
        }
    }
}

/// A named regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPattern {
    pub name: String,
    pub regex: String,
}

impl NamedPattern {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
        }
    }
}

/// String analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringConfig {
    /// Ordered pattern catalog; earlier entries win ties
    pub patterns: Vec<NamedPattern>,
    /// Number of matching patterns reported
    pub top_patterns: usize,
}

impl Default for StringConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                NamedPattern::new("numeric_only", r"^\d+$"),
                NamedPattern::new("alphanumeric", r"^[a-zA-Z0-9]+$"),
                NamedPattern::new("uppercase", r"^[A-Z]+$"),
                NamedPattern::new("lowercase", r"^[a-z]+$"),
                NamedPattern::new(
                    "email",
                    r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$",
                ),
                NamedPattern::new("url", r"^https?://"),
                NamedPattern::new("date_iso", r"^\d{4}-\d{2}-\d{2}"),
            ],
            top_patterns: 5,
        }
    }
}

/// Date/time parsing settings, shared by inference and the datetime analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateTimeConfig {
    /// chrono format strings tried in order after RFC 3339
    pub formats: Vec<String>,
    /// format_consistency below this is flagged (default: 0.95)
    pub format_consistency_threshold: f64,
}

impl Default for DateTimeConfig {
    fn default() -> Self {
        Self {
            formats: [
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%d",
                "%Y/%m/%d",
                "%m/%d/%Y",
                "%d.%m.%Y",
                "%d-%b-%Y",
            ]
            .map(String::from)
            .to_vec(),
            format_consistency_threshold: 0.95,
        }
    }
}

/// Value distribution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub top_n: usize,
    pub bottom_n: usize,
    pub histogram_bins: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            bottom_n: 10,
            histogram_bins: 20,
        }
    }
}

/// Extra validation applied to a PII regex match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiValidator {
    /// The digits of the match must pass the Luhn checksum
    Luhn,
}

/// One entry of the PII catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiPattern {
    pub category: String,
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<PiiValidator>,
    /// Match only text cells; native numbers never count for this pattern
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub text_only: bool,
}

impl PiiPattern {
    pub fn new(category: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            regex: regex.into(),
            validator: None,
            text_only: false,
        }
    }

    pub fn text_only(mut self) -> Self {
        self.text_only = true;
        self
    }

    pub fn with_validator(mut self, validator: PiiValidator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// PII detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiConfig {
    /// Ordered catalog, compiled case-insensitive and searched as substrings
    pub patterns: Vec<PiiPattern>,
    /// Lower-case substrings of a column name that suggest PII
    pub name_keywords: Vec<String>,
    pub name_hint_bonus: f64,
    pub match_weight: f64,
    /// Scores at or above this are at least Medium risk
    pub medium_threshold: f64,
    /// Scores above this are High risk
    pub high_threshold: f64,
    pub max_samples: usize,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                PiiPattern::new("email", r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}"),
                PiiPattern::new(
                    "phone",
                    r"(?:\+\d{1,3}[\s.-]?)?\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b",
                ),
                PiiPattern::new("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
                PiiPattern::new("credit_card", r"\b(?:\d[ -]?){12,18}\d\b")
                    .with_validator(PiiValidator::Luhn),
                PiiPattern::new(
                    "ip_address",
                    r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
                ),
                PiiPattern::new("postal_code", r"^\s*\d{5}(?:-\d{4})?\s*$").text_only(),
            ],
            name_keywords: [
                "email",
                "phone",
                "mobile",
                "ssn",
                "social_security",
                "dob",
                "birth",
                "name",
                "address",
                "street",
                "zip",
                "postal",
                "ip_address",
                "card",
                "passport",
            ]
            .map(String::from)
            .to_vec(),
            name_hint_bonus: 0.3,
            match_weight: 0.7,
            medium_threshold: 0.2,
            high_threshold: 0.5,
            max_samples: 5,
        }
    }
}

/// Weights of the four quality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub completeness: f64,
    pub validity: f64,
    pub consistency: f64,
    pub conformity: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            validity: 0.3,
            consistency: 0.2,
            conformity: 0.1,
        }
    }
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.completeness + self.validity + self.consistency + self.conformity
    }
}

/// Null-rate and distinctness band a column must satisfy for a grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    /// Maximum null rate, 0-1
    pub max_null_rate: f64,
    /// Inclusive distinctness bounds, 0-1
    pub min_distinctness: f64,
    pub max_distinctness: f64,
}

impl GradeBand {
    pub fn admits(&self, null_rate: f64, distinctness: f64) -> bool {
        null_rate <= self.max_null_rate
            && distinctness >= self.min_distinctness
            && distinctness <= self.max_distinctness
    }
}

/// Quality grading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub weights: QualityWeights,
    pub gold: GradeBand,
    pub silver: GradeBand,
    /// Dataset score at or above which the dataset is Gold (default: 90)
    pub dataset_gold_score: f64,
    /// Dataset score at or above which the dataset is Silver (default: 70)
    pub dataset_silver_score: f64,
    /// Null percentage above which a column gets a completeness warning
    pub null_warning_percentage: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            gold: GradeBand {
                max_null_rate: 0.01,
                min_distinctness: 0.05,
                max_distinctness: 0.95,
            },
            silver: GradeBand {
                max_null_rate: 0.05,
                min_distinctness: 0.02,
                max_distinctness: 0.98,
            },
            dataset_gold_score: 90.0,
            dataset_silver_score: 70.0,
            null_warning_percentage: 10.0,
        }
    }
}

/// Candidate key discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Uniqueness percentage at which a non-key is reported as near-unique
    pub near_unique_threshold: f64,
    /// Only the first N columns take part in pair discovery
    pub max_composite_columns: usize,
    pub max_primary_key_suggestions: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            near_unique_threshold: 95.0,
            max_composite_columns: 32,
            max_primary_key_suggestions: 3,
        }
    }
}

/// A declared foreign-key pair. Each side is a column name in the profiled
/// batch or `entity.column` naming a related batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDeclaration {
    pub child_column: String,
    pub parent_column: String,
}

impl ForeignKeyDeclaration {
    pub fn new(child_column: impl Into<String>, parent_column: impl Into<String>) -> Self {
        Self {
            child_column: child_column.into(),
            parent_column: parent_column.into(),
        }
    }
}

/// Referential integrity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    pub foreign_keys: Vec<ForeignKeyDeclaration>,
    pub max_orphan_samples: usize,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            foreign_keys: Vec::new(),
            max_orphan_samples: 5,
        }
    }
}

/// Execution and resource limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Concurrent column tasks (default: number of CPUs)
    pub max_workers: usize,
    /// Rows above which dataset-level rules are skipped
    pub max_dataset_rule_rows: usize,
    /// Batch size above which dataset-level rules are skipped
    pub max_dataset_rule_bytes: u64,
    /// Whether durations are written into the profile. Disable for
    /// byte-reproducible output.
    pub record_timing: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            max_dataset_rule_rows: 10_000_000,
            max_dataset_rule_bytes: 2 * 1024 * 1024 * 1024, // 2GB
            record_timing: true,
        }
    }
}

impl RuleConfig {
    /// Create a new builder for RuleConfig
    pub fn builder() -> RuleConfigBuilder {
        RuleConfigBuilder {
            config: RuleConfig::default(),
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks every threshold and catalog without compiling regexes.
    pub fn validate(&self) -> Result<()> {
        let inference = &self.inference;
        ensure(inference.sample_size > 0, "inference.sample_size must be > 0")?;
        ensure_unit(inference.majority_threshold, "inference.majority_threshold")?;
        ensure(
            inference.majority_threshold > 0.0,
            "inference.majority_threshold must be > 0",
        )?;

        ensure(
            self.numeric
                .percentiles
                .iter()
                .all(|p| (0.0..=100.0).contains(p)),
            "numeric.percentiles must be within [0, 100]",
        )?;
        ensure(
            self.numeric.iqr_multiplier > 0.0,
            "numeric.iqr_multiplier must be > 0",
        )?;
        ensure(
            self.numeric.z_score_threshold > 0.0,
            "numeric.z_score_threshold must be > 0",
        )?;

        ensure(
            !self.string.patterns.is_empty(),
            "string.patterns must not be empty",
        )?;
        ensure_unique_names(
            self.string.patterns.iter().map(|p| p.name.as_str()),
            "string.patterns",
        )?;

        ensure(
            !self.datetime.formats.is_empty(),
            "datetime.formats must not be empty",
        )?;
        ensure_unit(
            self.datetime.format_consistency_threshold,
            "datetime.format_consistency_threshold",
        )?;

        ensure(
            self.distribution.histogram_bins > 0,
            "distribution.histogram_bins must be > 0",
        )?;

        let pii = &self.pii;
        ensure(!pii.patterns.is_empty(), "pii.patterns must not be empty")?;
        ensure(
            pii.patterns.iter().all(|p| !p.category.trim().is_empty()),
            "pii.patterns categories must not be empty",
        )?;
        ensure_unit(pii.match_weight, "pii.match_weight")?;
        ensure_unit(pii.name_hint_bonus, "pii.name_hint_bonus")?;
        ensure_unit(pii.medium_threshold, "pii.medium_threshold")?;
        ensure_unit(pii.high_threshold, "pii.high_threshold")?;
        ensure(
            pii.medium_threshold < pii.high_threshold,
            "pii.medium_threshold must be below pii.high_threshold",
        )?;

        let grading = &self.grading;
        let weights = grading.weights;
        ensure(
            [
                weights.completeness,
                weights.validity,
                weights.consistency,
                weights.conformity,
            ]
            .iter()
            .all(|w| *w >= 0.0 && w.is_finite()),
            "grading.weights must be non-negative",
        )?;
        ensure(weights.sum() > 0.0, "grading.weights must not all be zero")?;
        for (band, label) in [(grading.gold, "gold"), (grading.silver, "silver")] {
            ensure_unit(band.max_null_rate, &format!("grading.{label}.max_null_rate"))?;
            ensure_unit(
                band.min_distinctness,
                &format!("grading.{label}.min_distinctness"),
            )?;
            ensure_unit(
                band.max_distinctness,
                &format!("grading.{label}.max_distinctness"),
            )?;
            ensure(
                band.min_distinctness <= band.max_distinctness,
                format!("grading.{label} distinctness bounds are inverted"),
            )?;
        }
        ensure(
            grading.dataset_silver_score < grading.dataset_gold_score,
            "grading.dataset_silver_score must be below grading.dataset_gold_score",
        )?;

        ensure(
            (0.0..=100.0).contains(&self.keys.near_unique_threshold),
            "keys.near_unique_threshold must be within [0, 100]",
        )?;

        for fk in &self.integrity.foreign_keys {
            ensure(
                !fk.child_column.trim().is_empty() && !fk.parent_column.trim().is_empty(),
                "integrity.foreign_keys entries need both child_column and parent_column",
            )?;
        }

        ensure(
            self.execution.max_workers > 0,
            "execution.max_workers must be > 0",
        )?;

        Ok(())
    }

    /// Validates the configuration and compiles its regex catalogs.
    pub fn compile(&self) -> Result<CompiledConfig> {
        self.validate()?;

        let string_patterns = self
            .string
            .patterns
            .iter()
            .map(|p| -> Result<CompiledPattern> {
                let regex = Regex::new(&p.regex).map_err(|e| {
                    ProfilerError::configuration(format!(
                        "string pattern '{}' is not a valid regex: {e}",
                        p.name
                    ))
                })?;
                Ok(CompiledPattern {
                    name: p.name.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let pii_patterns = self
            .pii
            .patterns
            .iter()
            .map(|p| -> Result<CompiledPiiPattern> {
                let regex = RegexBuilder::new(&p.regex)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        ProfilerError::configuration(format!(
                            "PII pattern '{}' is not a valid regex: {e}",
                            p.category
                        ))
                    })?;
                Ok(CompiledPiiPattern {
                    category: p.category.clone(),
                    regex,
                    validator: p.validator,
                    text_only: p.text_only,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledConfig {
            config: self.clone(),
            string_patterns,
            pii_patterns,
        })
    }
}

fn ensure(condition: bool, msg: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ProfilerError::configuration(msg))
    }
}

fn ensure_unit(value: f64, field: &str) -> Result<()> {
    ensure(
        (0.0..=1.0).contains(&value),
        format!("{field} must be within [0, 1], got {value}"),
    )
}

fn ensure_unique_names<'a>(names: impl Iterator<Item = &'a str>, field: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        ensure(!name.trim().is_empty(), format!("{field} names must not be empty"))?;
        ensure(
            seen.insert(name),
            format!("{field} contains duplicate name '{name}'"),
        )?;
    }
    Ok(())
}

/// A compiled string pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
}

/// A compiled PII catalog entry.
#[derive(Debug, Clone)]
pub struct CompiledPiiPattern {
    pub category: String,
    pub regex: Regex,
    pub validator: Option<PiiValidator>,
    pub text_only: bool,
}

/// A validated configuration with its regexes compiled, shared by every
/// column task of a run.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub config: RuleConfig,
    pub string_patterns: Vec<CompiledPattern>,
    pub pii_patterns: Vec<CompiledPiiPattern>,
}

/// Builder for RuleConfig
#[derive(Debug, Clone)]
pub struct RuleConfigBuilder {
    config: RuleConfig,
}

impl RuleConfigBuilder {
    /// Replace all rule toggles
    pub fn rules(mut self, rules: Rulesets) -> Self {
        self.config.rules = rules;
        self
    }

    /// Enable a single rule group
    pub fn enable(mut self, kind: RuleKind) -> Self {
        self.config.rules.set(kind, true);
        self
    }

    /// Disable a single rule group
    pub fn disable(mut self, kind: RuleKind) -> Self {
        self.config.rules.set(kind, false);
        self
    }

    /// Set the type inference sample cap
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.inference.sample_size = size;
        self
    }

    /// Set how the inference sample is drawn
    pub fn sampling(mut self, strategy: SamplingStrategy) -> Self {
        self.config.inference.sampling = strategy;
        self
    }

    /// Set the fraction of the sample a type needs to win
    pub fn majority_threshold(mut self, threshold: f64) -> Self {
        self.config.inference.majority_threshold = threshold;
        self
    }

    /// Replace the accepted date/time formats
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.datetime.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the reported percentiles (0-100 scale)
    pub fn percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.config.numeric.percentiles = percentiles;
        self
    }

    /// Replace the string pattern catalog
    pub fn string_patterns(mut self, patterns: Vec<NamedPattern>) -> Self {
        self.config.string.patterns = patterns;
        self
    }

    /// Set the number of histogram bins
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.config.distribution.histogram_bins = bins;
        self
    }

    /// Set the sizes of the top and bottom value lists
    pub fn top_bottom_n(mut self, top_n: usize, bottom_n: usize) -> Self {
        self.config.distribution.top_n = top_n;
        self.config.distribution.bottom_n = bottom_n;
        self
    }

    /// Replace the PII catalog
    pub fn pii_patterns(mut self, patterns: Vec<PiiPattern>) -> Self {
        self.config.pii.patterns = patterns;
        self
    }

    /// Replace the PII column-name keywords
    pub fn pii_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.pii.name_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the grading policy
    pub fn grading(mut self, grading: GradingConfig) -> Self {
        self.config.grading = grading;
        self
    }

    /// Declare a foreign-key pair
    pub fn foreign_key(
        mut self,
        child_column: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        self.config
            .integrity
            .foreign_keys
            .push(ForeignKeyDeclaration::new(child_column, parent_column));
        self
    }

    /// Set the number of concurrent column tasks
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.execution.max_workers = workers;
        self
    }

    /// Set the row limit for dataset-level rules
    pub fn max_dataset_rule_rows(mut self, rows: usize) -> Self {
        self.config.execution.max_dataset_rule_rows = rows;
        self
    }

    /// Set the byte limit for dataset-level rules
    pub fn max_dataset_rule_bytes(mut self, bytes: u64) -> Self {
        self.config.execution.max_dataset_rule_bytes = bytes;
        self
    }

    /// Enable or disable duration recording
    pub fn record_timing(mut self, enabled: bool) -> Self {
        self.config.execution.record_timing = enabled;
        self
    }

    /// Pin the run's reference time
    pub fn reference_time(mut self, time: DateTime<Utc>) -> Self {
        self.config.reference_time = Some(time);
        self
    }

    /// Build the RuleConfig. Validation happens when an engine is created.
    pub fn build(self) -> RuleConfig {
        self.config
    }
}
