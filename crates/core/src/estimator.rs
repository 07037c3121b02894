//! Throughput estimation
//!
//! Measures steady single-instance latency with a few short sequential
//! trials, then projects capacity for the configuration's replication
//! factor. The projection assumes replicas do not contend with each other;
//! it is a model, not a measurement.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::{Configuration, ConfigurationTable};
use crate::endpoint::EndpointClient;
use crate::error::{ensure_positive, ensure_prompt, HarnessError, Result};
use crate::probe::duration_secs;

/// Short prompt used when the caller has none: keeps trial variance low
pub const DEFAULT_ESTIMATE_PROMPT: &str = "What is Kubernetes? Answer in one sentence.";

/// Projected sustained throughput for one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputEstimate {
    pub config_id: String,
    /// Trials attempted
    pub trials: usize,
    /// Trials that succeeded
    pub succeeded: usize,
    /// Trials that failed (excluded from the average)
    pub failed: usize,
    /// Mean duration of successful trials
    #[serde(rename = "average_duration_secs", with = "duration_secs")]
    pub average_duration: Duration,
    /// Requests per minute for one running instance
    pub single_instance_rpm: f64,
    /// Instances assumed to run in parallel
    pub replication_factor: u32,
    /// single_instance_rpm × replication_factor
    pub total_rpm: f64,
}

impl ThroughputEstimate {
    /// Build an estimate from successful trial durations
    pub fn from_trials(
        configuration: &Configuration,
        trials: usize,
        successful_durations: &[Duration],
    ) -> Self {
        let succeeded = successful_durations.len();
        let average_duration = if succeeded == 0 {
            Duration::ZERO
        } else {
            successful_durations.iter().sum::<Duration>() / succeeded as u32
        };

        let avg_secs = average_duration.as_secs_f64();
        let single_instance_rpm = if avg_secs > 0.0 { 60.0 / avg_secs } else { 0.0 };

        Self {
            config_id: configuration.id.clone(),
            trials,
            succeeded,
            failed: trials.saturating_sub(succeeded),
            average_duration,
            single_instance_rpm,
            replication_factor: configuration.replication_factor,
            total_rpm: single_instance_rpm * f64::from(configuration.replication_factor),
        }
    }
}

/// Runs sequential trials and projects throughput
pub struct ThroughputEstimator {
    client: EndpointClient,
    timeout: Duration,
}

impl ThroughputEstimator {
    pub fn new(client: EndpointClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Estimate throughput for one configuration from `trial_count` sequential probes
    #[instrument(skip(self, configuration, prompt), fields(config_id = %configuration.id))]
    pub async fn estimate(
        &self,
        configuration: &Configuration,
        prompt: &str,
        trial_count: usize,
    ) -> Result<ThroughputEstimate> {
        ensure_prompt(prompt)?;
        ensure_positive("trial_count", trial_count)?;
        if self.timeout.is_zero() {
            return Err(HarnessError::invalid("timeout must be positive"));
        }

        let mut durations = Vec::with_capacity(trial_count);
        for trial in 0..trial_count {
            let result = self
                .client
                .invoke_indexed(trial, configuration, prompt, self.timeout)
                .await;
            if result.is_success() {
                durations.push(result.duration);
            } else {
                warn!(
                    trial,
                    kind = ?result.error_kind(),
                    error = result.error_message().unwrap_or_default(),
                    "trial failed"
                );
            }
        }

        let estimate = ThroughputEstimate::from_trials(configuration, trial_count, &durations);
        info!(
            average_ms = estimate.average_duration.as_millis() as u64,
            single_instance_rpm = estimate.single_instance_rpm,
            total_rpm = estimate.total_rpm,
            failed = estimate.failed,
            "throughput estimated"
        );
        Ok(estimate)
    }

    /// Estimate every available configuration in table order
    pub async fn estimate_all(
        &self,
        table: &ConfigurationTable,
        prompt: &str,
        trial_count: usize,
    ) -> Result<Vec<ThroughputEstimate>> {
        ensure_prompt(prompt)?;
        ensure_positive("trial_count", trial_count)?;

        let mut estimates = Vec::with_capacity(table.len());
        for config in table {
            if !self.client.is_available(config).await {
                warn!(config_id = %config.id, "configuration unavailable, skipping estimate");
                continue;
            }
            estimates.push(self.estimate(config, prompt, trial_count).await?);
        }
        Ok(estimates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimProfile, SimulatedEndpoint};
    use std::sync::Arc;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= expected * 0.01 + 1e-9,
            "expected ≈{expected}, got {actual}"
        );
    }

    #[test]
    fn test_projection_from_trials() {
        let config = Configuration::new("a", "m", 4, "6GB");
        let estimate = ThroughputEstimate::from_trials(
            &config,
            3,
            &[Duration::from_millis(400), Duration::from_millis(600)],
        );

        assert_eq!(estimate.succeeded, 2);
        assert_eq!(estimate.failed, 1);
        assert_eq!(estimate.average_duration, Duration::from_millis(500));
        assert_eq!(estimate.single_instance_rpm, 120.0);
        assert_eq!(estimate.total_rpm, 480.0);
    }

    #[test]
    fn test_all_trials_failed_reports_zero() {
        let config = Configuration::new("a", "m", 4, "6GB");
        let estimate = ThroughputEstimate::from_trials(&config, 3, &[]);

        assert_eq!(estimate.failed, 3);
        assert_eq!(estimate.average_duration, Duration::ZERO);
        assert_eq!(estimate.single_instance_rpm, 0.0);
        assert_eq!(estimate.total_rpm, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partition_scenario() {
        let table = ConfigurationTable::new(vec![
            Configuration::new("A", "model-a", 4, "6GB"),
            Configuration::new("B", "model-b", 2, "12GB"),
            Configuration::new("C", "model-c", 1, "24GB"),
        ])
        .unwrap();
        let sim = SimulatedEndpoint::new()
            .with_model("model-a", SimProfile::new(Duration::from_millis(500)))
            .with_model("model-b", SimProfile::new(Duration::from_secs(1)))
            .with_model("model-c", SimProfile::new(Duration::from_secs(2)));
        let estimator =
            ThroughputEstimator::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(60));

        let estimates = estimator
            .estimate_all(&table, DEFAULT_ESTIMATE_PROMPT, 3)
            .await
            .unwrap();

        let ids: Vec<&str> = estimates.iter().map(|e| e.config_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);

        let expected = [(120.0, 480.0), (60.0, 120.0), (30.0, 30.0)];
        for (estimate, (single, total)) in estimates.iter().zip(expected) {
            assert_eq!(estimate.trials, 3);
            assert_eq!(estimate.succeeded, 3);
            assert_close(estimate.single_instance_rpm, single);
            assert_close(estimate.total_rpm, total);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trials_excluded_from_average() {
        let sim = SimulatedEndpoint::new()
            .with_model("m", SimProfile::new(Duration::from_secs(1)))
            .with_latency_script(
                "m",
                vec![Duration::from_secs(1), Duration::from_secs(30), Duration::from_secs(1)],
            );
        let estimator =
            ThroughputEstimator::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(10));
        let config = Configuration::new("a", "m", 2, "12GB");

        let estimate = estimator.estimate(&config, "ping", 3).await.unwrap();

        assert_eq!(estimate.succeeded, 2);
        assert_eq!(estimate.failed, 1);
        assert_close(estimate.average_duration.as_secs_f64(), 1.0);
        assert_close(estimate.total_rpm, 120.0);
    }

    #[tokio::test]
    async fn test_unavailable_configuration_skipped() {
        let table = ConfigurationTable::new(vec![
            Configuration::new("A", "model-a", 1, "6GB"),
            Configuration::new("B", "model-b", 1, "6GB"),
        ])
        .unwrap();
        let sim = SimulatedEndpoint::new()
            .with_model("model-a", SimProfile::new(Duration::ZERO).unavailable())
            .with_model("model-b", SimProfile::new(Duration::ZERO));
        let estimator =
            ThroughputEstimator::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(1));

        let estimates = estimator.estimate_all(&table, "ping", 2).await.unwrap();

        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].config_id, "B");
    }
}
