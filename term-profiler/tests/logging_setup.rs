//! Installs the global subscriber once and profiles under it. Kept in its
//! own test binary since a process can only install one subscriber.

use term_profiler::batch::{Column, TabularBatch};
use term_profiler::config::RuleConfig;
use term_profiler::error::ProfilerError;
use term_profiler::logging::setup::{init_logging, SubscriberConfig};
use term_profiler::logging::LogConfig;
use term_profiler::profiling::ProfileEngine;

#[tokio::test]
async fn test_diagnostic_run_under_installed_subscriber() {
    let log_config = LogConfig::diagnostic();
    let subscriber = SubscriberConfig::for_log_config(&log_config)
        .json(true)
        .run_timings(true);
    init_logging(&subscriber).unwrap();

    let engine = ProfileEngine::builder()
        .config(RuleConfig::builder().record_timing(false).build())
        .log_config(log_config)
        .build()
        .unwrap();
    let batch = TabularBatch::new(
        "events",
        vec![
            Column::from_values("id", 1i64..=6),
            Column::from_values("kind", ["a", "b", "a", "c", "a", "b"]),
        ],
    )
    .unwrap();
    let profile = engine.profile(batch).await.unwrap();
    assert_eq!(profile.columns.len(), 2);
    assert!(profile.columns.iter().all(|c| !c.is_failed()));

    let second = init_logging(&SubscriberConfig::default());
    assert!(matches!(second, Err(ProfilerError::Configuration(_))));
}
