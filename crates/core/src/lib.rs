// Partitioned Inference Benchmark Engine
//
// Measures how differently-sized serving configurations on shared accelerator
// hardware trade latency against aggregate throughput.
//
// Key design decisions:
// - Endpoints are reached through the ModelEndpoint trait; protocol crates
//   (e.g. partbench-ollama) implement it, the engine never speaks HTTP
// - Every invocation outcome is a ProbeResult; per-request faults are data
// - Concurrency exists only inside the load runner (Semaphore + JoinSet)
// - Aggregation is a pure structural merge; rendering lives with the caller
// - Conversation memory is caller-owned and bounded

pub mod cluster;
pub mod concurrent;
pub mod config;
pub mod conversation;
pub mod endpoint;
pub mod error;
pub mod estimator;
pub mod harness;
pub mod metrics;
pub mod probe;
pub mod report;
pub mod sequential;
pub mod settings;
pub mod summary;

// Simulated endpoint for tests and offline runs
pub mod sim;

// Re-exports for convenience
pub use cluster::{ClusterFacts, ClusterIntrospector, KubectlIntrospector};
pub use concurrent::{LoadRun, LoadRunner};
pub use config::{ConfigError, Configuration, ConfigurationTable};
pub use conversation::{Assistant, Conversation, Scenario, SCENARIOS};
pub use endpoint::{
    ChatMessage, ChatRole, EndpointClient, EndpointError, GenerateRequest, ModelEndpoint,
};
pub use error::{HarnessError, Result};
pub use estimator::{ThroughputEstimate, ThroughputEstimator, DEFAULT_ESTIMATE_PROMPT};
pub use harness::{CompareOptions, Harness, DEFAULT_BENCHMARK_PROMPT};
pub use metrics::{extract, ResponseMetrics};
pub use probe::{ProbeErrorKind, ProbeOutcome, ProbeResult};
pub use report::{aggregate, ComparisonReport, ReportEntry, ReportRenderer, RunResults};
pub use sequential::{SequentialResults, SequentialRunner};
pub use settings::HarnessSettings;
pub use sim::{SimProfile, SimulatedEndpoint};
pub use summary::BatchSummary;
