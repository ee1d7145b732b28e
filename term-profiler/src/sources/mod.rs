//! Batch sources.
//!
//! Extraction logic (SQL generation, API pagination, file parsing) lives
//! outside the profiler. A source only hands over a materialized
//! [`TabularBatch`]: one already in memory, Arrow record batches, or a table
//! registered with a DataFusion session.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::batch::TabularBatch;
use crate::error::Result;

mod memory;
mod record_batch;
mod table;

pub use memory::MemorySource;
pub use record_batch::{tabular_from_record_batch, tabular_from_record_batches, RecordBatchSource};
pub use table::DataFusionSource;

/// Something that can produce a batch to profile.
///
/// # Examples
///
/// ```rust,no_run
/// use term_profiler::batch::{Column, TabularBatch};
/// use term_profiler::sources::{BatchSource, MemorySource};
///
/// # async fn example() -> term_profiler::error::Result<()> {
/// let batch = TabularBatch::new("t", vec![Column::from_values("id", [1i64, 2])])?;
/// let source = MemorySource::new(batch);
/// let loaded = source.load().await?;
/// assert_eq!(loaded.row_count(), 2);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait BatchSource: Debug + Send + Sync {
    /// Materializes the batch.
    async fn load(&self) -> Result<TabularBatch>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}
