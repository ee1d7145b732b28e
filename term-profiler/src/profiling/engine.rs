//! The profiling engine.
//!
//! A run has two stages separated by a barrier. Every column goes through
//! the attribute-level rules on the blocking pool, bounded by
//! `execution.max_workers`. Once all columns are back, the dataset-level
//! rules run in order: candidate keys, referential integrity, dataset
//! quality and dataset statistics.
//!
//! A column whose analysis panics is reported as failed and the run goes
//! on; cancellation is the only thing that aborts a run once it started.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::batch::{Column, TabularBatch};
use crate::config::{CompiledConfig, RuleConfig};
use crate::error::{ProfilerError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::profiling::aggregate::{dataset_quality, dataset_statistics};
use crate::profiling::datetime::datetime_stats;
use crate::profiling::distribution::value_distribution;
use crate::profiling::inference::infer_type;
use crate::profiling::integrity::check_integrity;
use crate::profiling::keys::discover_keys;
use crate::profiling::numeric::numeric_stats;
use crate::profiling::pii::detect_pii;
use crate::profiling::plan::{RuleKind, RuleLevel, RulePlan};
use crate::profiling::quality::{grade_column, QualityInputs};
use crate::profiling::statistics::{column_statistics, FrequencyTable};
use crate::profiling::string::string_stats;
use crate::profiling::types::{
    ColumnProfile, ColumnStatus, DatasetProfile, InferredType, RuleStatus, SkipReason,
};

/// Callback invoked as columns and dataset rules finish.
pub type ProgressCallback = Arc<dyn Fn(ProfilingProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Column,
    DatasetRule,
}

/// Progress information for a profiling run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingProgress {
    pub stage: ProgressStage,
    /// Column name or rule name
    pub name: String,
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

/// Builder for ProfileEngine
pub struct ProfileEngineBuilder {
    config: RuleConfig,
    log_config: LogConfig,
    progress_callback: Option<ProgressCallback>,
}

impl ProfileEngineBuilder {
    pub fn config(mut self, config: RuleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Set progress callback
    pub fn progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProfilingProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Validates and compiles the configuration.
    pub fn build(self) -> Result<ProfileEngine> {
        let compiled = self.config.compile()?;
        let plan = RulePlan::resolve(&compiled.config.rules);
        Ok(ProfileEngine {
            compiled: Arc::new(compiled),
            plan: Arc::new(plan),
            log_config: self.log_config,
            progress_callback: self.progress_callback,
        })
    }
}

/// Runs the configured rules over tabular batches.
///
/// The engine holds no per-run state and can be shared across tasks.
#[derive(Clone)]
pub struct ProfileEngine {
    compiled: Arc<CompiledConfig>,
    plan: Arc<RulePlan>,
    log_config: LogConfig,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProfileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileEngine")
            .field("config", &self.compiled.config)
            .field("plan", &self.plan)
            .field("log_config", &self.log_config)
            .field("has_progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ProfileEngine {
    pub fn builder() -> ProfileEngineBuilder {
        ProfileEngineBuilder {
            config: RuleConfig::default(),
            log_config: LogConfig::default(),
            progress_callback: None,
        }
    }

    /// Creates an engine, failing fast on an invalid configuration.
    pub fn new(config: RuleConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &RuleConfig {
        &self.compiled.config
    }

    pub fn plan(&self) -> &RulePlan {
        &self.plan
    }

    /// Profiles a batch on its own.
    pub async fn profile(&self, batch: impl Into<Arc<TabularBatch>>) -> Result<DatasetProfile> {
        self.profile_with_cancellation(batch.into(), Vec::new(), CancellationToken::new())
            .await
    }

    /// Profiles a batch, resolving `entity.column` references in foreign-key
    /// declarations against `related`.
    pub async fn profile_with_related(
        &self,
        batch: impl Into<Arc<TabularBatch>>,
        related: Vec<TabularBatch>,
    ) -> Result<DatasetProfile> {
        self.profile_with_cancellation(batch.into(), related, CancellationToken::new())
            .await
    }

    /// Profiles a batch until done or until `cancel` fires.
    #[instrument(
        skip_all,
        fields(dataset = %batch.name(), rows = batch.row_count(), columns = batch.column_count())
    )]
    pub async fn profile_with_cancellation(
        &self,
        batch: Arc<TabularBatch>,
        related: Vec<TabularBatch>,
        cancel: CancellationToken,
    ) -> Result<DatasetProfile> {
        let started = Instant::now();
        let config = &self.compiled.config;
        let profiled_at = config.reference_time.unwrap_or_else(Utc::now);

        info!(
            dataset = batch.name(),
            rows = batch.row_count(),
            columns = batch.column_count(),
            rules = ?self.plan.enabled().collect::<Vec<_>>(),
            "Starting dataset profiling"
        );

        let columns = self
            .profile_columns(&batch, profiled_at.naive_utc(), &cancel)
            .await?;
        let failed_columns = columns.iter().filter(|c| c.is_failed()).count();

        let mut rule_status = BTreeMap::new();
        for kind in RuleKind::ALL {
            if kind.level() != RuleLevel::Attribute {
                continue;
            }
            let status = if !self.plan.emits(kind) {
                RuleStatus::skipped(SkipReason::Disabled)
            } else if failed_columns > 0 {
                RuleStatus::failed(format!("{failed_columns} column(s) failed"))
            } else {
                RuleStatus::Completed
            };
            rule_status.insert(kind, status);
        }

        let mut profile = DatasetProfile {
            dataset_name: batch.name().to_string(),
            columns,
            dataset_statistics: None,
            dataset_quality: None,
            candidate_keys: None,
            referential_integrity: None,
            rule_status,
        };

        let related = Arc::new(related);
        let dataset_rules = [
            RuleKind::CandidateKeys,
            RuleKind::ReferentialIntegrity,
            RuleKind::DatasetQuality,
            RuleKind::DatasetStatistics,
        ];
        for (position, kind) in dataset_rules.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(dataset = batch.name(), rule = %kind, "Profiling cancelled");
                return Err(ProfilerError::Cancelled);
            }

            let status = if !self.plan.emits(kind) {
                RuleStatus::skipped(SkipReason::Disabled)
            } else {
                match kind {
                    RuleKind::CandidateKeys => {
                        self.run_candidate_keys(&batch, &cancel, &mut profile)
                            .await?
                    }
                    RuleKind::ReferentialIntegrity => {
                        self.run_integrity(&batch, &related, &cancel, &mut profile)
                            .await?
                    }
                    RuleKind::DatasetQuality => {
                        profile.dataset_quality =
                            Some(dataset_quality(&profile.columns, &batch, config));
                        RuleStatus::Completed
                    }
                    _ => {
                        let duration = config
                            .execution
                            .record_timing
                            .then(|| elapsed_ms(started));
                        profile.dataset_statistics =
                            Some(dataset_statistics(&batch, profiled_at, duration));
                        RuleStatus::Completed
                    }
                }
            };

            crate::perf_debug!(
                self.log_config,
                dataset = batch.name(),
                rule = %kind,
                status = ?status,
                "Dataset rule finished"
            );
            profile.rule_status.insert(kind, status);
            self.report_progress(
                ProgressStage::DatasetRule,
                kind.name(),
                position + 1,
                dataset_rules.len(),
                "Dataset rule finished",
            );
        }

        for column in &mut profile.columns {
            retain_emitted(column, &self.plan);
        }

        info!(
            dataset = batch.name(),
            failed_columns,
            time_ms = elapsed_ms(started),
            "Completed dataset profiling"
        );

        Ok(profile)
    }

    /// Runs the attribute-level rules for every column, in parallel.
    async fn profile_columns(
        &self,
        batch: &Arc<TabularBatch>,
        now: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<Vec<ColumnProfile>> {
        let total = batch.column_count();
        let max_field_length = self.log_config.max_field_length;

        if !self.plan.has_column_stage() {
            let mut profiles = Vec::with_capacity(total);
            for (index, column) in batch.columns().iter().enumerate() {
                if cancel.is_cancelled() {
                    return Err(ProfilerError::Cancelled);
                }
                let result = profile_column(column, index, &self.compiled, &self.plan, now);
                profiles.push(settle_column(result, index, max_field_length)?);
            }
            return Ok(profiles);
        }

        let semaphore = Arc::new(Semaphore::new(self.compiled.config.execution.max_workers));
        let mut tasks = JoinSet::new();

        for index in 0..total {
            let permit = tokio::select! {
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                tasks.shutdown().await;
                info!(dataset = batch.name(), "Profiling cancelled before all columns started");
                return Err(ProfilerError::Cancelled);
            };
            if cancel.is_cancelled() {
                tasks.shutdown().await;
                return Err(ProfilerError::Cancelled);
            }

            let batch = Arc::clone(batch);
            let compiled = Arc::clone(&self.compiled);
            let plan = Arc::clone(&self.plan);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let column = &batch.columns()[index];
                let result = profile_column(column, index, &compiled, &plan, now);
                settle_column(result, index, max_field_length)
            });
        }

        let mut profiles = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            let profile = joined
                .map_err(|e| ProfilerError::internal(format!("Task join error: {e}")))??;
            crate::log_column!(
                self.log_config,
                column = %profile.name,
                inferred_type = ?profile.inferred_type,
                status = ?profile.status,
                rules = ?profile.rule_status,
                "Column profiled"
            );
            self.report_progress(
                ProgressStage::Column,
                &profile.name,
                profiles.len() + 1,
                total,
                "Column profiled",
            );
            profiles.push(profile);
        }

        if cancel.is_cancelled() {
            return Err(ProfilerError::Cancelled);
        }

        profiles.sort_by_key(|p| p.index);
        Ok(profiles)
    }

    async fn run_candidate_keys(
        &self,
        batch: &Arc<TabularBatch>,
        cancel: &CancellationToken,
        profile: &mut DatasetProfile,
    ) -> Result<RuleStatus> {
        if self.exceeds_limits(batch, RuleKind::CandidateKeys) {
            return Ok(RuleStatus::skipped(SkipReason::BatchTooLarge));
        }

        let task_batch = Arc::clone(batch);
        let keys = self.compiled.config.keys.clone();
        let task_cancel = cancel.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            discover_keys(&task_batch, &keys, &task_cancel)
        })
        .await;

        Ok(match outcome {
            Ok(Ok(report)) => {
                profile.candidate_keys = Some(report);
                RuleStatus::Completed
            }
            Ok(Err(ProfilerError::Cancelled)) => return Err(ProfilerError::Cancelled),
            Ok(Err(e)) => {
                error!(dataset = batch.name(), error = %e, "Candidate key discovery failed");
                RuleStatus::failed(e.to_string())
            }
            Err(e) => {
                error!(dataset = batch.name(), error = %e, "Candidate key discovery failed");
                RuleStatus::failed(format!("Task join error: {e}"))
            }
        })
    }

    async fn run_integrity(
        &self,
        batch: &Arc<TabularBatch>,
        related: &Arc<Vec<TabularBatch>>,
        cancel: &CancellationToken,
        profile: &mut DatasetProfile,
    ) -> Result<RuleStatus> {
        let integrity = &self.compiled.config.integrity;
        if integrity.foreign_keys.is_empty() {
            return Ok(RuleStatus::skipped(SkipReason::NoDeclarations));
        }
        if self.exceeds_limits(batch, RuleKind::ReferentialIntegrity) {
            return Ok(RuleStatus::skipped(SkipReason::BatchTooLarge));
        }

        let task_batch = Arc::clone(batch);
        let task_related = Arc::clone(related);
        let declarations = integrity.foreign_keys.clone();
        let max_samples = integrity.max_orphan_samples;
        let task_cancel = cancel.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            check_integrity(
                &task_batch,
                &task_related,
                &declarations,
                max_samples,
                &task_cancel,
            )
        })
        .await;

        Ok(match outcome {
            Ok(Ok(report)) => {
                profile.referential_integrity = Some(report);
                RuleStatus::Completed
            }
            Ok(Err(ProfilerError::Cancelled)) => return Err(ProfilerError::Cancelled),
            Ok(Err(e)) => {
                error!(dataset = batch.name(), error = %e, "Referential integrity check failed");
                RuleStatus::failed(e.to_string())
            }
            Err(e) => {
                error!(dataset = batch.name(), error = %e, "Referential integrity check failed");
                RuleStatus::failed(format!("Task join error: {e}"))
            }
        })
    }

    fn exceeds_limits(&self, batch: &TabularBatch, kind: RuleKind) -> bool {
        let execution = &self.compiled.config.execution;
        let (size_bytes, _) = batch.effective_size_bytes();
        let too_large = batch.row_count() > execution.max_dataset_rule_rows
            || size_bytes > execution.max_dataset_rule_bytes;
        if too_large {
            warn!(
                dataset = batch.name(),
                rule = %kind,
                rows = batch.row_count(),
                size_bytes,
                max_rows = execution.max_dataset_rule_rows,
                max_bytes = execution.max_dataset_rule_bytes,
                "Batch exceeds dataset rule limits, skipping"
            );
        }
        too_large
    }

    fn report_progress(
        &self,
        stage: ProgressStage,
        name: &str,
        completed: usize,
        total: usize,
        message: &str,
    ) {
        if let Some(callback) = &self.progress_callback {
            callback(ProfilingProgress {
                stage,
                name: name.to_string(),
                completed,
                total,
                message: message.to_string(),
            });
        }
    }
}

/// Runs the attribute-level rules for one column.
///
/// The returned profile still carries blocks of rules that were computed only
/// as dependencies; see [`retain_emitted`]. Type-specific analyzers that do
/// not apply to the inferred type are marked not applicable. A panic inside
/// any analyzer comes back as [`ProfilerError::ColumnAnalysis`].
pub fn profile_column(
    column: &Column,
    index: usize,
    compiled: &CompiledConfig,
    plan: &RulePlan,
    now: NaiveDateTime,
) -> Result<ColumnProfile> {
    guard_column(&column.name, || analyze_column(column, index, compiled, plan, now))
}

fn guard_column<F>(name: &str, analyze: F) -> Result<ColumnProfile>
where
    F: FnOnce() -> ColumnProfile,
{
    catch_unwind(AssertUnwindSafe(analyze))
        .map_err(|panic| ProfilerError::column_analysis(name, panic_message(panic.as_ref())))
}

/// Turns a column analysis error into a failed column profile. Any other
/// error stops the run.
fn settle_column(
    result: Result<ColumnProfile>,
    index: usize,
    max_field_length: usize,
) -> Result<ColumnProfile> {
    match result {
        Err(ProfilerError::ColumnAnalysis { column, message }) => {
            error!(
                column = %column,
                error = %truncate_field(&message, max_field_length),
                "Column analysis failed"
            );
            Ok(ColumnProfile::failed(column, index, message))
        }
        other => other,
    }
}

fn analyze_column(
    column: &Column,
    index: usize,
    compiled: &CompiledConfig,
    plan: &RulePlan,
    now: NaiveDateTime,
) -> ColumnProfile {
    let config = &compiled.config;
    let mut rule_status = BTreeMap::new();

    let frequencies = (plan.computes(RuleKind::ColumnStatistics)
        || plan.computes(RuleKind::ValueDistribution))
    .then(|| FrequencyTable::build(column));

    let statistics = match (&frequencies, plan.computes(RuleKind::ColumnStatistics)) {
        (Some(frequencies), true) => Some(column_statistics(column, frequencies)),
        _ => None,
    };
    let type_analysis = plan
        .computes(RuleKind::DataTypeAnalysis)
        .then(|| infer_type(column, config));
    let inferred = type_analysis
        .as_ref()
        .map(|t| t.inferred_type)
        .unwrap_or(InferredType::Unknown);

    let mut numeric = None;
    if plan.computes(RuleKind::NumericAnalysis) && inferred == InferredType::Numeric {
        numeric = numeric_stats(column, &config.numeric);
    }
    let mut string = None;
    if plan.computes(RuleKind::StringAnalysis) && inferred == InferredType::String {
        string = Some(string_stats(
            column,
            &compiled.string_patterns,
            config.string.top_patterns,
        ));
    }
    let mut datetime = None;
    if plan.computes(RuleKind::DateTimeAnalysis) && inferred == InferredType::Date {
        datetime = Some(datetime_stats(column, &config.datetime, now));
    }

    let distribution = match (&frequencies, plan.computes(RuleKind::ValueDistribution)) {
        (Some(frequencies), true) => {
            Some(value_distribution(column, frequencies, inferred, config))
        }
        _ => None,
    };
    let pii = plan
        .computes(RuleKind::PiiDetection)
        .then(|| detect_pii(column, &compiled.pii_patterns, &config.pii));

    let mut quality = None;
    if plan.computes(RuleKind::ColumnQuality) {
        if let (Some(statistics), Some(type_analysis)) = (&statistics, &type_analysis) {
            quality = Some(grade_column(
                QualityInputs {
                    statistics,
                    type_analysis,
                    numeric: numeric.as_ref(),
                    string: string.as_ref(),
                    datetime: datetime.as_ref(),
                },
                &config.grading,
            ));
        }
    }

    let applicable = |kind: RuleKind, produced: bool| {
        if !plan.emits(kind) {
            RuleStatus::skipped(SkipReason::Disabled)
        } else if produced {
            RuleStatus::Completed
        } else {
            RuleStatus::skipped(SkipReason::NotApplicable)
        }
    };
    let produced = [
        (RuleKind::ColumnStatistics, statistics.is_some()),
        (RuleKind::DataTypeAnalysis, type_analysis.is_some()),
        (RuleKind::NumericAnalysis, numeric.is_some()),
        (RuleKind::StringAnalysis, string.is_some()),
        (RuleKind::DateTimeAnalysis, datetime.is_some()),
        (RuleKind::ValueDistribution, distribution.is_some()),
        (RuleKind::PiiDetection, pii.is_some()),
        (RuleKind::ColumnQuality, quality.is_some()),
    ];
    for (kind, produced) in produced {
        rule_status.insert(kind, applicable(kind, produced));
    }

    ColumnProfile {
        name: column.name.clone(),
        index,
        status: ColumnStatus::Completed,
        failure: None,
        inferred_type: inferred,
        type_analysis,
        statistics,
        numeric,
        string,
        datetime,
        distribution,
        pii,
        quality,
        rule_status,
    }
}

/// Drops the blocks of rules that ran only because another rule needed them.
pub fn retain_emitted(profile: &mut ColumnProfile, plan: &RulePlan) {
    if !plan.emits(RuleKind::ColumnStatistics) {
        profile.statistics = None;
    }
    if !plan.emits(RuleKind::DataTypeAnalysis) {
        profile.type_analysis = None;
    }
    if !plan.emits(RuleKind::NumericAnalysis) {
        profile.numeric = None;
    }
    if !plan.emits(RuleKind::StringAnalysis) {
        profile.string = None;
    }
    if !plan.emits(RuleKind::DateTimeAnalysis) {
        profile.datetime = None;
    }
    if !plan.emits(RuleKind::ValueDistribution) {
        profile.distribution = None;
    }
    if !plan.emits(RuleKind::PiiDetection) {
        profile.pii = None;
    }
    if !plan.emits(RuleKind::ColumnQuality) {
        profile.quality = None;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
