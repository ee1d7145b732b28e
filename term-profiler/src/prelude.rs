//! Prelude for commonly used types and traits in term-profiler.

pub use crate::batch::{CellValue, Column, TabularBatch};
pub use crate::config::{ForeignKeyDeclaration, RuleConfig, Rulesets};
pub use crate::error::{ProfilerError, Result};
pub use crate::logging::LogConfig;
pub use crate::profiling::{
    ColumnProfile, DatasetProfile, InferredType, ProfileEngine, QualityGrade, RiskLevel, RuleKind,
    RuleStatus,
};
pub use crate::sink::ProfileSink;
pub use crate::sources::BatchSource;
