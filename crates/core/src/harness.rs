//! Full comparison run
//!
//! Drives the sequential baseline, then optional load batches and
//! throughput estimates for every configuration that answered, and
//! aggregates everything into one report.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::concurrent::LoadRunner;
use crate::config::ConfigurationTable;
use crate::endpoint::EndpointClient;
use crate::error::{ensure_positive, ensure_prompt, Result};
use crate::estimator::ThroughputEstimator;
use crate::report::{aggregate, ComparisonReport, RunResults};
use crate::sequential::SequentialRunner;

/// Prompt long enough to separate partition sizes
pub const DEFAULT_BENCHMARK_PROMPT: &str = "Explain how to troubleshoot a Kubernetes pod that is stuck in CrashLoopBackOff state. \
Be specific and provide kubectl commands.";

/// Concurrent batch parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub request_count: usize,
    pub max_workers: usize,
}

/// Throughput estimation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateOptions {
    /// Short prompt for low-variance trials
    pub prompt: String,
    pub trial_count: usize,
}

/// What a comparison run should include
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Prompt for the sequential baseline and load batches
    pub prompt: String,
    pub load: Option<LoadOptions>,
    pub estimate: Option<EstimateOptions>,
}

impl CompareOptions {
    /// Sequential baseline only
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            load: None,
            estimate: None,
        }
    }

    /// Add a load batch per configuration
    pub fn with_load(mut self, request_count: usize, max_workers: usize) -> Self {
        self.load = Some(LoadOptions {
            request_count,
            max_workers,
        });
        self
    }

    /// Add a throughput estimate per configuration
    pub fn with_estimate(mut self, prompt: impl Into<String>, trial_count: usize) -> Self {
        self.estimate = Some(EstimateOptions {
            prompt: prompt.into(),
            trial_count,
        });
        self
    }

    fn validate(&self) -> Result<()> {
        ensure_prompt(&self.prompt)?;
        if let Some(load) = &self.load {
            ensure_positive("request_count", load.request_count)?;
            ensure_positive("max_workers", load.max_workers)?;
        }
        if let Some(estimate) = &self.estimate {
            ensure_prompt(&estimate.prompt)?;
            ensure_positive("trial_count", estimate.trial_count)?;
        }
        Ok(())
    }
}

/// Composes the runners over one endpoint client
pub struct Harness {
    sequential: SequentialRunner,
    load: LoadRunner,
    estimator: ThroughputEstimator,
}

impl Harness {
    /// All runners share the client and per-request timeout
    pub fn new(client: EndpointClient, timeout: Duration) -> Self {
        Self {
            sequential: SequentialRunner::new(client.clone(), timeout),
            load: LoadRunner::new(client.clone(), timeout),
            estimator: ThroughputEstimator::new(client, timeout),
        }
    }

    pub fn sequential(&self) -> &SequentialRunner {
        &self.sequential
    }

    pub fn load(&self) -> &LoadRunner {
        &self.load
    }

    pub fn estimator(&self) -> &ThroughputEstimator {
        &self.estimator
    }

    /// Run the comparison and aggregate the results.
    ///
    /// All options are validated before the first request is sent.
    #[instrument(skip_all, fields(configurations = table.len()))]
    pub async fn compare(
        &self,
        table: &ConfigurationTable,
        options: &CompareOptions,
    ) -> Result<ComparisonReport> {
        options.validate()?;

        let sequential = self.sequential.run(table, &options.prompt).await?;
        let mut results = RunResults::default();

        for config in table.iter().filter(|c| sequential.contains(&c.id)) {
            if let Some(load) = options.load {
                let run = self
                    .load
                    .run_concurrent(config, &options.prompt, load.request_count, load.max_workers)
                    .await?;
                results.load.push((run.config_id, run.summary));
            }

            if let Some(estimate) = &options.estimate {
                let estimate = self
                    .estimator
                    .estimate(config, &estimate.prompt, estimate.trial_count)
                    .await?;
                results.estimates.push(estimate);
            }
        }

        results.sequential = Some(sequential);
        let report = aggregate(table, results);
        info!(
            run_id = %report.run_id,
            entries = report.entries.len(),
            skipped = report.skipped.len(),
            "comparison complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::error::HarnessError;
    use crate::sim::{SimProfile, SimulatedEndpoint};
    use std::sync::Arc;

    fn table() -> ConfigurationTable {
        ConfigurationTable::new(vec![
            Configuration::new("small", "m1", 4, "6GB"),
            Configuration::new("medium", "m2", 2, "12GB"),
            Configuration::new("large", "m3", 1, "24GB"),
        ])
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_compare_with_load_and_estimates() {
        let sim = SimulatedEndpoint::new()
            .with_model("m1", SimProfile::new(Duration::from_millis(500)))
            .with_model("m2", SimProfile::new(Duration::from_secs(1)).unavailable())
            .with_model("m3", SimProfile::new(Duration::from_secs(2)));
        let harness = Harness::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(60));

        let options = CompareOptions::new("benchmark prompt")
            .with_load(6, 4)
            .with_estimate("short prompt", 3);
        let report = harness.compare(&table(), &options).await.unwrap();

        assert_eq!(report.ids(), vec!["small", "large"]);
        assert_eq!(report.skipped, vec!["medium".to_string()]);

        let small = report.get("small").unwrap();
        assert!(small.probe.as_ref().unwrap().is_success());
        assert_eq!(small.load.as_ref().unwrap().issued, 6);
        let estimate = small.estimate.as_ref().unwrap();
        assert!((estimate.total_rpm - 480.0).abs() < 5.0);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_dispatch() {
        let sim = SimulatedEndpoint::new().with_model("m1", SimProfile::new(Duration::ZERO));
        let calls = sim.call_counter();
        let harness = Harness::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(1));

        let options = CompareOptions::new("prompt").with_load(6, 0);
        let result = harness.compare(&table(), &options).await;

        assert!(matches!(result, Err(HarnessError::InvalidArgument(_))));
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_unavailable_still_produces_report() {
        let sim = SimulatedEndpoint::new();
        let harness = Harness::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(1));

        let report = harness
            .compare(&table(), &CompareOptions::new("prompt"))
            .await
            .unwrap();

        assert!(report.entries.is_empty());
        assert_eq!(report.skipped.len(), 3);
    }
}
