//! Profiles batches that arrive through the Arrow and DataFusion sources.

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use term_profiler::config::RuleConfig;
use term_profiler::profiling::{InferredType, ProfileEngine};
use term_profiler::sources::{BatchSource, DataFusionSource, RecordBatchSource};

fn orders_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, false),
        Field::new("status", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
        Field::new("ordered_on", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from((1..=12).collect::<Vec<i64>>())),
            Arc::new(StringArray::from(vec![
                Some("shipped"),
                Some("pending"),
                Some("shipped"),
                None,
                Some("cancelled"),
                Some("shipped"),
                Some("pending"),
                Some("shipped"),
                Some("shipped"),
                Some("pending"),
                Some("shipped"),
                Some("cancelled"),
            ])),
            Arc::new(Float64Array::from(vec![
                Some(10.0),
                Some(12.5),
                Some(9.75),
                Some(11.0),
                None,
                Some(10.5),
                Some(13.0),
                Some(12.0),
                Some(950.0),
                Some(11.25),
                Some(10.0),
                Some(12.0),
            ])),
            Arc::new(StringArray::from(
                (1..=12)
                    .map(|d| Some(format!("2024-03-{d:02}")))
                    .collect::<Vec<_>>(),
            )),
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn test_profile_record_batches() {
    let batch = orders_batch();
    let source = RecordBatchSource::new("orders", batch.schema(), vec![batch.clone(), batch]);
    let tabular = source.load().await.unwrap();
    assert_eq!(tabular.row_count(), 24);

    let profile = ProfileEngine::new(RuleConfig::default())
        .unwrap()
        .profile(tabular)
        .await
        .unwrap();

    assert_eq!(profile.column("order_id").unwrap().inferred_type, InferredType::Numeric);
    assert_eq!(profile.column("ordered_on").unwrap().inferred_type, InferredType::Date);
    let amount = profile.column("amount").unwrap().numeric.as_ref().unwrap();
    assert_eq!(amount.outlier_count, 2);

    // order_id repeats once the batch is duplicated.
    let keys = profile.candidate_keys.unwrap();
    assert!(keys
        .candidate_keys
        .iter()
        .all(|k| k.columns != vec!["order_id".to_string()]));

    let stats = profile.dataset_statistics.unwrap();
    assert!(!stats.size_estimated);
}

#[tokio::test]
async fn test_profile_datafusion_table() {
    let batch = orders_batch();
    let table = MemTable::try_new(batch.schema(), vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new();
    ctx.register_table("orders", Arc::new(table)).unwrap();

    let source = DataFusionSource::new(ctx, "orders").with_limit(8);
    let tabular = source.load().await.unwrap();
    assert_eq!(tabular.row_count(), 8);

    let profile = ProfileEngine::new(RuleConfig::default())
        .unwrap()
        .profile(tabular)
        .await
        .unwrap();
    let status = profile.column("status").unwrap();
    assert_eq!(status.inferred_type, InferredType::String);
    assert_eq!(status.statistics.as_ref().unwrap().null_count, 1);

    let keys = profile.candidate_keys.unwrap();
    assert_eq!(keys.primary_key_suggestions[0].columns, vec!["order_id"]);
}
