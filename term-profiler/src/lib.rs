//! # term-profiler - Data Profiling Rules Engine
//!
//! Given a tabular batch (rows x named columns), term-profiler computes
//! per-column statistics, infers types, grades data quality, discovers
//! candidate keys, checks declared referential integrity, detects likely
//! PII and rolls everything up into a dataset-level report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use term_profiler::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let customers = TabularBatch::new(
//!     "customers",
//!     vec![
//!         Column::from_values("id", [1i64, 2, 3, 4]),
//!         Column::from_values("email", ["a@x.io", "b@x.io", "c@x.io", "d@x.io"]),
//!     ],
//! )?;
//!
//! let config = RuleConfig::builder()
//!     .disable(RuleKind::ReferentialIntegrity)
//!     .histogram_bins(10)
//!     .build();
//!
//! let engine = ProfileEngine::new(config)?;
//! let profile = engine.profile(customers).await?;
//!
//! for column in &profile.columns {
//!     println!("{}: {:?}", column.name, column.inferred_type);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`batch`**: the in-memory tabular model (`TabularBatch`, `Column`, `CellValue`)
//! - **`config`**: `RuleConfig`, rule toggles and every threshold the rules use
//! - **`profiling`**: the rules and the `ProfileEngine` that runs them
//! - **`sources`**: adapters that hand over batches (memory, Arrow, DataFusion)
//! - **`sink`**: profile persistence (memory, JSON files)
//! - **`logging`**: log configuration and subscriber setup
//!
//! Attribute-level rules run per column in parallel; dataset-level rules
//! (candidate keys, referential integrity, dataset quality and statistics)
//! run after every column is done. The same batch and configuration always
//! produce the same profile, apart from timestamps and durations.

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod profiling;
pub mod sink;
pub mod sources;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
