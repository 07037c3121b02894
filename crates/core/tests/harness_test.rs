// Integration tests for the benchmark engine with the simulated endpoint
//
// These tests drive full runs through the public API on a paused clock, so
// latency scenarios are deterministic and finish instantly.
//
// Run with: cargo test -p partbench-core --test harness_test

use std::sync::Arc;
use std::time::Duration;

use partbench_core::{
    Assistant, CompareOptions, Configuration, ConfigurationTable, Conversation, EndpointClient,
    Harness, ProbeErrorKind, SimProfile, SimulatedEndpoint, DEFAULT_ESTIMATE_PROMPT,
};

/// Three partitions of one accelerator: 4 × small, 2 × medium, 1 × large
fn partition_table() -> ConfigurationTable {
    ConfigurationTable::from_yaml_str(
        r#"
configurations:
  - id: small
    model: model-a
    replication_factor: 4
    capacity: 6GB
    profile: 1g.6gb
  - id: medium
    model: model-b
    replication_factor: 2
    capacity: 12GB
    profile: 2g.12gb
  - id: large
    model: model-c
    replication_factor: 1
    capacity: 24GB
"#,
    )
    .expect("valid table")
}

fn partition_sim() -> SimulatedEndpoint {
    SimulatedEndpoint::new()
        .with_model("model-a", SimProfile::new(Duration::from_millis(500)).with_tokens(40))
        .with_model("model-b", SimProfile::new(Duration::from_secs(1)).with_tokens(80))
        .with_model("model-c", SimProfile::new(Duration::from_secs(2)).with_tokens(160))
}

fn harness(sim: SimulatedEndpoint) -> Harness {
    Harness::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(60))
}

#[tokio::test(start_paused = true)]
async fn test_full_comparison_projects_partition_capacity() {
    let options = CompareOptions::new("Explain pod scheduling")
        .with_load(6, 4)
        .with_estimate(DEFAULT_ESTIMATE_PROMPT, 3);

    let report = harness(partition_sim())
        .compare(&partition_table(), &options)
        .await
        .expect("comparison runs");

    assert_eq!(report.ids(), vec!["small", "medium", "large"]);
    assert!(report.skipped.is_empty());

    let expected = [("small", 480.0), ("medium", 120.0), ("large", 30.0)];
    for (id, total_rpm) in expected {
        let entry = report.get(id).expect("entry present");
        let estimate = entry.estimate.as_ref().expect("estimate present");
        assert!(
            (estimate.total_rpm - total_rpm).abs() <= total_rpm * 0.01,
            "{id}: expected ≈{total_rpm}, got {}",
            estimate.total_rpm
        );

        let load = entry.load.as_ref().expect("load summary present");
        assert_eq!(load.issued, 6);
        assert_eq!(load.succeeded + load.failed, load.issued);
    }

    // Smaller partitions answer faster but with fewer tokens per reply
    let small = report.get("small").and_then(|e| e.probe.as_ref()).unwrap();
    let large = report.get("large").and_then(|e| e.probe.as_ref()).unwrap();
    assert!(small.duration < large.duration);
    assert_eq!(small.metrics().unwrap().token_count, 40);
    assert_eq!(large.metrics().unwrap().token_count, 160);

    assert!((report.projected_capacity_rpm() - 630.0).abs() < 7.0);
}

#[tokio::test(start_paused = true)]
async fn test_load_scenario_six_requests_four_workers() {
    let sim = SimulatedEndpoint::new().with_model("model-a", SimProfile::new(Duration::from_secs(1)));
    let config = Configuration::new("small", "model-a", 4, "6GB");

    let run = harness(sim)
        .load()
        .run_concurrent(&config, "prompt", 6, 4)
        .await
        .unwrap();

    let (results, summary) = run.into_parts();
    assert_eq!(results.len(), 6);
    assert!((summary.wall_clock.as_secs_f64() - 2.0).abs() < 0.05);
    assert!((summary.requests_per_minute - 180.0).abs() < 5.0);
}

#[tokio::test(start_paused = true)]
async fn test_unprovisioned_partition_is_skipped_everywhere() {
    let sim = partition_sim().with_model("model-b", SimProfile::new(Duration::ZERO).unavailable());
    let options = CompareOptions::new("prompt").with_load(2, 2).with_estimate("ping", 2);

    let report = harness(sim)
        .compare(&partition_table(), &options)
        .await
        .unwrap();

    assert_eq!(report.ids(), vec!["small", "large"]);
    assert_eq!(report.skipped, vec!["medium".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_are_recorded_not_raised() {
    let sim = partition_sim().with_model("model-c", SimProfile::new(Duration::from_secs(600)));

    let report = harness(sim)
        .compare(&partition_table(), &CompareOptions::new("prompt"))
        .await
        .unwrap();

    let large = report.get("large").and_then(|e| e.probe.as_ref()).unwrap();
    assert_eq!(large.error_kind(), Some(ProbeErrorKind::Timeout));
    assert!(report.get("small").unwrap().probe.as_ref().unwrap().is_success());
}

#[tokio::test(start_paused = true)]
async fn test_report_renders_as_json() {
    let report = harness(partition_sim())
        .compare(&partition_table(), &CompareOptions::new("prompt"))
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entries"][0]["configuration"]["profile"], "1g.6gb");
    assert_eq!(json["entries"][0]["probe"]["status"], "success");
    assert_eq!(json["entries"][0]["probe"]["token_count"], 40);
}

#[tokio::test(start_paused = true)]
async fn test_assistant_keeps_last_three_exchanges() {
    let table = partition_table();
    let medium = table.get("medium").unwrap().clone();
    let assistant = Assistant::new(
        EndpointClient::new(Arc::new(partition_sim())),
        medium,
        Duration::from_secs(60),
    );
    let mut conversation = Conversation::new();

    for question in ["one", "two", "three", "four"] {
        let result = assistant.ask(&mut conversation, question).await.unwrap();
        assert!(result.is_success());
    }

    let questions: Vec<&str> = conversation.exchanges().map(|e| e.question.as_str()).collect();
    assert_eq!(questions, vec!["two", "three", "four"]);
    assert_eq!(conversation.history().len(), 6);
}
