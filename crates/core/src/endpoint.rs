// Model endpoint contract and the timed Endpoint Client
//
// A ModelEndpoint is an opaque collaborator reachable by model name. The
// EndpointClient wraps one with timing and a timeout, and converts every
// fault into a failed ProbeResult so callers never handle endpoint errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Configuration;
use crate::probe::{ProbeErrorKind, ProbeResult};

/// Default bound on availability checks
pub const DEFAULT_AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors returned by endpoint implementations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The endpoint rejected the call or could not be reached
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    /// The endpoint was reached but reported an error
    #[error("invocation failed: {0}")]
    Invocation(String),
}

impl EndpointError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        EndpointError::Unavailable(msg.into())
    }

    pub fn invocation(msg: impl Into<String>) -> Self {
        EndpointError::Invocation(msg.into())
    }

    fn kind(&self) -> ProbeErrorKind {
        match self {
            EndpointError::Unavailable(_) => ProbeErrorKind::EndpointUnavailable,
            EndpointError::Invocation(_) => ProbeErrorKind::InvocationError,
        }
    }
}

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of prior conversation passed along with a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// A single generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Model name the endpoint serves
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// Prior messages, oldest first (empty for plain benchmark prompts)
    pub history: Vec<ChatMessage>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// A model-serving endpoint reachable by model name
///
/// Implementations handle protocol details; the harness only relies on this
/// call/response contract plus the availability check.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Generate a completion for the request, returning the raw response text
    async fn generate(&self, request: &GenerateRequest) -> Result<String, EndpointError>;

    /// Whether the model is currently provisioned and loadable
    async fn is_available(&self, model: &str) -> Result<bool, EndpointError>;
}

/// Timed, fault-absorbing wrapper around a ModelEndpoint
#[derive(Clone)]
pub struct EndpointClient {
    endpoint: Arc<dyn ModelEndpoint>,
    availability_timeout: Duration,
}

impl EndpointClient {
    pub fn new(endpoint: Arc<dyn ModelEndpoint>) -> Self {
        Self {
            endpoint,
            availability_timeout: DEFAULT_AVAILABILITY_TIMEOUT,
        }
    }

    /// Set the bound on availability checks
    pub fn with_availability_timeout(mut self, timeout: Duration) -> Self {
        self.availability_timeout = timeout;
        self
    }

    /// Invoke the configuration's endpoint once
    pub async fn invoke(
        &self,
        configuration: &Configuration,
        prompt: &str,
        timeout: Duration,
    ) -> ProbeResult {
        self.invoke_indexed(0, configuration, prompt, timeout).await
    }

    /// Invoke with a request index used to tag the result
    pub async fn invoke_indexed(
        &self,
        request_index: usize,
        configuration: &Configuration,
        prompt: &str,
        timeout: Duration,
    ) -> ProbeResult {
        let request = GenerateRequest::new(&configuration.model, prompt);
        self.dispatch(request_index, &configuration.id, request, timeout)
            .await
    }

    /// Invoke with caller-owned conversation history
    pub async fn invoke_with_history(
        &self,
        configuration: &Configuration,
        prompt: &str,
        history: Vec<ChatMessage>,
        timeout: Duration,
    ) -> ProbeResult {
        let request = GenerateRequest::new(&configuration.model, prompt).with_history(history);
        self.dispatch(0, &configuration.id, request, timeout).await
    }

    /// Check availability; a failing or slow check counts as unavailable
    pub async fn is_available(&self, configuration: &Configuration) -> bool {
        let check = self.endpoint.is_available(&configuration.model);
        match tokio::time::timeout(self.availability_timeout, check).await {
            Ok(Ok(available)) => available,
            Ok(Err(e)) => {
                warn!(config_id = %configuration.id, error = %e, "availability check failed");
                false
            }
            Err(_) => {
                warn!(
                    config_id = %configuration.id,
                    timeout_ms = self.availability_timeout.as_millis() as u64,
                    "availability check timed out"
                );
                false
            }
        }
    }

    async fn dispatch(
        &self,
        request_index: usize,
        config_id: &str,
        request: GenerateRequest,
        timeout: Duration,
    ) -> ProbeResult {
        if request.prompt.trim().is_empty() {
            return ProbeResult::failure(
                request_index,
                config_id,
                ProbeErrorKind::InvocationError,
                "prompt must not be empty",
                Duration::ZERO,
            );
        }

        let start = Instant::now();
        let outcome = tokio::time::timeout(timeout, self.endpoint.generate(&request)).await;
        let duration = start.elapsed();

        let result = match outcome {
            Ok(Ok(text)) => ProbeResult::success(request_index, config_id, text.trim(), duration),
            Ok(Err(e)) => {
                let kind = e.kind();
                let message = match e {
                    EndpointError::Unavailable(msg) | EndpointError::Invocation(msg) => msg,
                };
                ProbeResult::failure(request_index, config_id, kind, message, duration)
            }
            Err(_) => ProbeResult::failure(
                request_index,
                config_id,
                ProbeErrorKind::Timeout,
                format!("no response within {:.1}s", timeout.as_secs_f64()),
                duration,
            ),
        };

        debug!(
            config_id,
            request_index,
            model = %request.model,
            success = result.is_success(),
            duration_ms = duration.as_millis() as u64,
            "invocation finished"
        );

        result
    }
}
