//! The data profiling rules engine.
//!
//! Attribute-level rules run once per column; dataset-level rules aggregate
//! their output and look across columns. [`ProfileEngine`] orders and runs
//! them according to the [`RulePlan`] resolved from a
//! [`RuleConfig`](crate::config::RuleConfig).
//!
//! ## Example
//!
//! ```rust,no_run
//! use term_profiler::batch::{Column, TabularBatch};
//! use term_profiler::config::RuleConfig;
//! use term_profiler::profiling::ProfileEngine;
//!
//! # async fn example() -> term_profiler::error::Result<()> {
//! let batch = TabularBatch::new(
//!     "customers",
//!     vec![
//!         Column::from_values("id", [1i64, 2, 3]),
//!         Column::from_values("email", ["a@example.com", "b@example.com", "c@example.com"]),
//!     ],
//! )?;
//!
//! let engine = ProfileEngine::new(RuleConfig::default())?;
//! let profile = engine.profile(batch).await?;
//! println!("{}", profile.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod datetime;
pub mod distribution;
pub mod engine;
pub mod inference;
pub mod integrity;
pub mod keys;
pub mod numeric;
pub mod pii;
pub mod plan;
pub mod quality;
pub mod statistics;
pub mod string;
pub mod types;

pub use engine::{
    profile_column, retain_emitted, ProfileEngine, ProfileEngineBuilder, ProfilingProgress,
    ProgressCallback, ProgressStage,
};
pub use plan::{RuleKind, RuleLevel, RulePlan};
pub use types::*;
