//! Sequential benchmark runner
//!
//! Probes each configuration once, strictly one at a time and in table
//! order. This is the baseline the concurrent load runner is compared with.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::ConfigurationTable;
use crate::endpoint::EndpointClient;
use crate::error::{ensure_prompt, HarnessError, Result};
use crate::probe::{ProbeErrorKind, ProbeOutcome, ProbeResult};

/// Ordered per-configuration results of a sequential run
///
/// Unavailable configurations are listed in `skipped` and have no entry in
/// `results`: "not provisioned" is distinct from "invoked and failed". A call
/// that reports the model unavailable counts the same as a failed check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SequentialResults {
    results: Vec<ProbeResult>,
    skipped: Vec<String>,
}

impl SequentialResults {
    /// Result for a configuration, if it was invoked
    pub fn get(&self, config_id: &str) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.config_id == config_id)
    }

    pub fn contains(&self, config_id: &str) -> bool {
        self.get(config_id).is_some()
    }

    /// Results in configuration order
    pub fn iter(&self) -> std::slice::Iter<'_, ProbeResult> {
        self.results.iter()
    }

    /// Ids of configurations that were invoked, in configuration order
    pub fn ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.config_id.as_str()).collect()
    }

    /// Ids of configurations skipped as unavailable
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Probes every configuration once, in order
pub struct SequentialRunner {
    client: EndpointClient,
    timeout: Duration,
}

impl SequentialRunner {
    pub fn new(client: EndpointClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Run one probe per available configuration.
    ///
    /// Fails only on invalid arguments, before anything is dispatched.
    #[instrument(skip_all, fields(configurations = table.len()))]
    pub async fn run(&self, table: &ConfigurationTable, prompt: &str) -> Result<SequentialResults> {
        ensure_prompt(prompt)?;
        if self.timeout.is_zero() {
            return Err(HarnessError::invalid("timeout must be positive"));
        }

        let mut output = SequentialResults::default();

        for config in table {
            if !self.client.is_available(config).await {
                warn!(config_id = %config.id, model = %config.model, "configuration unavailable, skipping");
                output.skipped.push(config.id.clone());
                continue;
            }

            let result = self.client.invoke(config, prompt, self.timeout).await;
            if result.error_kind() == Some(ProbeErrorKind::EndpointUnavailable) {
                warn!(config_id = %config.id, model = %config.model, "model unavailable on invoke, skipping");
                output.skipped.push(config.id.clone());
                continue;
            }
            match &result.outcome {
                ProbeOutcome::Success { metrics, .. } => info!(
                    config_id = %config.id,
                    duration_ms = result.duration.as_millis() as u64,
                    tokens = metrics.token_count,
                    tokens_per_second = metrics.tokens_per_second,
                    "probe succeeded"
                ),
                ProbeOutcome::Failure { kind, message } => warn!(
                    config_id = %config.id,
                    kind = %kind,
                    error = %message,
                    "probe failed"
                ),
            }
            output.results.push(result);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::endpoint::{EndpointError, GenerateRequest, ModelEndpoint};
    use crate::sim::{SimProfile, SimulatedEndpoint};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Lists every model but cannot serve `missing`
    struct StaleListing {
        missing: &'static str,
    }

    #[async_trait]
    impl ModelEndpoint for StaleListing {
        async fn generate(
            &self,
            request: &GenerateRequest,
        ) -> std::result::Result<String, EndpointError> {
            if request.model == self.missing {
                return Err(EndpointError::unavailable("model not found"));
            }
            Ok("fine answer".to_string())
        }

        async fn is_available(&self, _model: &str) -> std::result::Result<bool, EndpointError> {
            Ok(true)
        }
    }

    fn table() -> ConfigurationTable {
        ConfigurationTable::new(vec![
            Configuration::new("a", "model-a", 4, "6GB"),
            Configuration::new("b", "model-b", 2, "12GB"),
            Configuration::new("c", "model-c", 1, "24GB"),
        ])
        .unwrap()
    }

    fn runner(sim: SimulatedEndpoint) -> SequentialRunner {
        SequentialRunner::new(EndpointClient::new(Arc::new(sim)), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_configuration_is_absent_not_failed() {
        let sim = SimulatedEndpoint::new()
            .with_model("model-a", SimProfile::new(Duration::from_millis(500)))
            .with_model("model-b", SimProfile::new(Duration::from_secs(1)).unavailable())
            .with_model("model-c", SimProfile::new(Duration::from_secs(2)));

        let results = runner(sim).run(&table(), "test prompt").await.unwrap();

        assert_eq!(results.ids(), vec!["a", "c"]);
        assert!(!results.contains("b"));
        assert_eq!(results.skipped(), &["b".to_string()]);
        assert!(results.iter().all(|r| r.is_success()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_on_invoke_is_skipped() {
        let endpoint = StaleListing { missing: "model-b" };
        let runner = SequentialRunner::new(
            EndpointClient::new(Arc::new(endpoint)),
            Duration::from_secs(60),
        );

        let results = runner.run(&table(), "test prompt").await.unwrap();

        assert_eq!(results.ids(), vec!["a", "c"]);
        assert!(!results.contains("b"));
        assert_eq!(results.skipped(), &["b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort_batch() {
        let sim = SimulatedEndpoint::new()
            .with_model("model-a", SimProfile::new(Duration::from_secs(120)))
            .with_model("model-b", SimProfile::new(Duration::ZERO).failing("model crashed"))
            .with_model("model-c", SimProfile::new(Duration::from_secs(1)));

        let results = runner(sim).run(&table(), "test prompt").await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results.get("a").unwrap().error_kind(), Some(ProbeErrorKind::Timeout));
        assert_eq!(
            results.get("b").unwrap().error_kind(),
            Some(ProbeErrorKind::InvocationError)
        );
        assert!(results.get("c").unwrap().is_success());
        assert!(results.skipped().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_strictly_sequentially() {
        let sim = SimulatedEndpoint::new()
            .with_model("model-a", SimProfile::new(Duration::from_secs(1)))
            .with_model("model-b", SimProfile::new(Duration::from_secs(1)))
            .with_model("model-c", SimProfile::new(Duration::from_secs(1)));

        let start = tokio::time::Instant::now();
        let results = runner(sim).run(&table(), "test prompt").await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_blank_prompt_fails_fast() {
        let sim = SimulatedEndpoint::new().with_model("model-a", SimProfile::new(Duration::ZERO));
        let calls = sim.call_counter();

        let result = runner(sim).run(&table(), "").await;

        assert!(matches!(result, Err(HarnessError::InvalidArgument(_))));
        assert_eq!(calls.get(), 0);
    }
}
