//! Persists profiles and reads them back.

use term_profiler::batch::{Column, TabularBatch};
use term_profiler::config::RuleConfig;
use term_profiler::logging::LogConfig;
use term_profiler::profiling::ProfileEngine;
use term_profiler::sink::{InMemorySink, JsonFileSink, ProfileSink};

async fn profile(name: &str) -> term_profiler::profiling::DatasetProfile {
    let batch = TabularBatch::new(
        name,
        vec![
            Column::from_values("id", 1i64..=4),
            Column::from_values("label", ["a", "b", "b", "c"]),
        ],
    )
    .unwrap();
    let config = RuleConfig::builder().record_timing(false).build();
    ProfileEngine::new(config)
        .unwrap()
        .profile(batch)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_json_file_sink_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonFileSink::new(dir.path()).with_log_config(LogConfig::quiet());
    let profile = profile("orders").await;

    sink.write("job-42", &profile).await.unwrap();

    let path = dir.path().join("job-42").join("orders.json");
    assert!(path.exists());
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"dataset_name\": \"orders\""));

    let read_back = sink.read("job-42", "orders").await.unwrap().unwrap();
    assert_eq!(read_back.to_json().unwrap(), profile.to_json().unwrap());
    assert!(sink.read("job-42", "customers").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sinks_behind_trait_object() {
    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn ProfileSink>> = vec![
        Box::new(InMemorySink::new()),
        Box::new(JsonFileSink::new(dir.path())),
    ];
    let profile = profile("customers").await;

    for sink in &sinks {
        sink.write("job-1", &profile).await.unwrap();
        let stored = sink.read("job-1", "customers").await.unwrap().unwrap();
        assert_eq!(stored.columns.len(), 2);
    }
}
