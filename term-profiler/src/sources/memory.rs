use async_trait::async_trait;

use super::BatchSource;
use crate::batch::TabularBatch;
use crate::error::Result;

/// A batch that is already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    batch: TabularBatch,
}

impl MemorySource {
    pub fn new(batch: TabularBatch) -> Self {
        Self { batch }
    }
}

#[async_trait]
impl BatchSource for MemorySource {
    async fn load(&self) -> Result<TabularBatch> {
        Ok(self.batch.clone())
    }

    fn description(&self) -> String {
        format!(
            "in-memory batch '{}' ({} rows x {} columns)",
            self.batch.name(),
            self.batch.row_count(),
            self.batch.column_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Column;

    #[tokio::test]
    async fn test_memory_source() {
        let batch =
            TabularBatch::new("t", vec![Column::from_values("id", [1i64, 2, 3])]).unwrap();
        let source = MemorySource::new(batch.clone());
        assert_eq!(source.load().await.unwrap(), batch);
        assert!(source.description().contains("3 rows x 1 columns"));
    }
}
