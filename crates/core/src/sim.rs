// Simulated model endpoint
//
// A fake endpoint for tests and offline demo runs. Each model gets a profile:
// - fixed latency (optionally overridden per call by a latency script)
// - generated response length in tokens
// - availability and failure modes
//
// Latency is simulated with tokio::time::sleep, so paused-clock tests run
// instantly and measure exact durations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::ConfigurationTable;
use crate::endpoint::{EndpointError, GenerateRequest, ModelEndpoint};

const LOREM: &[&str] = &[
    "check", "the", "pod", "events", "with", "kubectl", "describe", "and", "inspect",
    "previous", "container", "logs", "for", "the", "failing", "init", "step",
];

/// Behavior of one simulated model
#[derive(Debug, Clone)]
pub struct SimProfile {
    /// Latency of every call unless the script overrides it
    pub latency: Duration,
    /// Number of whitespace-delimited tokens in each response
    pub tokens: usize,
    /// Whether the availability check reports the model as loaded
    pub available: bool,
    /// Whether the availability check itself fails
    pub unreachable: bool,
    /// Error message returned by every generate call
    pub failure: Option<String>,
}

impl SimProfile {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            tokens: 32,
            available: true,
            unreachable: false,
            failure: None,
        }
    }

    /// Set the response length
    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = tokens;
        self
    }

    /// Report the model as not provisioned
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Fail availability checks as if the endpoint could not be reached
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Make every generate call fail with an invocation error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

/// Shared count of generate calls made against a SimulatedEndpoint
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct ModelState {
    profile: Option<SimProfile>,
    script: Vec<Duration>,
    calls: usize,
}

/// In-process endpoint with configurable latency and failures
#[derive(Debug, Default)]
pub struct SimulatedEndpoint {
    models: Mutex<HashMap<String, ModelState>>,
    calls: CallCounter,
}

impl SimulatedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model profile
    pub fn with_model(self, model: impl Into<String>, profile: SimProfile) -> Self {
        self.models.lock().entry(model.into()).or_default().profile = Some(profile);
        self
    }

    /// Override latency per call: the n-th call to `model` sleeps `script[n]`.
    /// Calls past the end of the script use the profile latency.
    pub fn with_latency_script(self, model: impl Into<String>, script: Vec<Duration>) -> Self {
        self.models.lock().entry(model.into()).or_default().script = script;
        self
    }

    /// Demo profiles for a configuration table: larger partitions answer
    /// faster and with longer responses.
    pub fn for_table(table: &ConfigurationTable) -> Self {
        table.iter().fold(Self::new(), |sim, config| {
            let factor = u64::from(config.replication_factor.max(1));
            let latency = Duration::from_millis(500 * factor);
            let tokens = 48 + 64 / factor as usize;
            sim.with_model(&config.model, SimProfile::new(latency).with_tokens(tokens))
        })
    }

    /// Handle for observing how many generate calls were made
    pub fn call_counter(&self) -> CallCounter {
        self.calls.clone()
    }

    fn next_call(&self, model: &str) -> Option<(SimProfile, Duration)> {
        let mut models = self.models.lock();
        let state = models.get_mut(model)?;
        let profile = state.profile.clone()?;
        let latency = state
            .script
            .get(state.calls)
            .copied()
            .unwrap_or(profile.latency);
        state.calls += 1;
        Some((profile, latency))
    }
}

fn lorem(tokens: usize) -> String {
    LOREM
        .iter()
        .cycle()
        .take(tokens)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl ModelEndpoint for SimulatedEndpoint {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, EndpointError> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);

        let Some((profile, latency)) = self.next_call(&request.model) else {
            return Err(EndpointError::unavailable(format!(
                "model '{}' not found",
                request.model
            )));
        };

        if !profile.available {
            return Err(EndpointError::unavailable(format!(
                "model '{}' is not loaded",
                request.model
            )));
        }

        tokio::time::sleep(latency).await;

        match profile.failure {
            Some(message) => Err(EndpointError::Invocation(message)),
            None => Ok(lorem(profile.tokens)),
        }
    }

    async fn is_available(&self, model: &str) -> Result<bool, EndpointError> {
        let models = self.models.lock();
        match models.get(model).and_then(|s| s.profile.as_ref()) {
            Some(profile) if profile.unreachable => {
                Err(EndpointError::unavailable("connection refused"))
            }
            Some(profile) => Ok(profile.available),
            None => Ok(false),
        }
    }
}
