use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use tracing::{info, instrument};

use super::record_batch::tabular_from_record_batches;
use super::BatchSource;
use crate::batch::TabularBatch;
use crate::error::Result;

/// A table registered with a DataFusion session, collected into memory.
#[derive(Clone)]
pub struct DataFusionSource {
    ctx: SessionContext,
    table: String,
    limit: Option<usize>,
}

impl std::fmt::Debug for DataFusionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionSource")
            .field("table", &self.table)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl DataFusionSource {
    pub fn new(ctx: SessionContext, table: impl Into<String>) -> Self {
        Self {
            ctx,
            table: table.into(),
            limit: None,
        }
    }

    /// Caps the number of rows collected.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
impl BatchSource for DataFusionSource {
    #[instrument(skip(self), fields(table = %self.table, limit = ?self.limit))]
    async fn load(&self) -> Result<TabularBatch> {
        let mut df = self.ctx.table(self.table.as_str()).await?;
        if let Some(limit) = self.limit {
            df = df.limit(0, Some(limit))?;
        }
        let schema = df.schema().inner().clone();
        let batches = df.collect().await?;

        let batch = tabular_from_record_batches(&self.table, &schema, &batches)?;
        info!(
            table = %self.table,
            rows = batch.row_count(),
            columns = batch.column_count(),
            "Collected table for profiling"
        );
        Ok(batch)
    }

    fn description(&self) -> String {
        match self.limit {
            Some(limit) => format!("DataFusion table '{}' (limit {limit})", self.table),
            None => format!("DataFusion table '{}'", self.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CellValue;
    use crate::error::ProfilerError;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn context() -> SessionContext {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("city", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
                Arc::new(StringArray::from(vec![Some("Oslo"), None, Some("Lima"), Some("Oslo")])),
            ],
        )
        .unwrap();
        let ctx = SessionContext::new();
        ctx.register_batch("cities", batch).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_loads_registered_table() {
        let source = DataFusionSource::new(context(), "cities");
        let batch = source.load().await.unwrap();
        assert_eq!(batch.name(), "cities");
        assert_eq!(batch.row_count(), 4);
        assert_eq!(batch.column("city").unwrap().values[1], CellValue::Null);
    }

    #[tokio::test]
    async fn test_limit() {
        let source = DataFusionSource::new(context(), "cities").with_limit(2);
        assert_eq!(source.load().await.unwrap().row_count(), 2);
        assert!(source.description().contains("limit 2"));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let source = DataFusionSource::new(SessionContext::new(), "missing");
        assert!(matches!(
            source.load().await,
            Err(ProfilerError::DataFusion(_))
        ));
    }
}
