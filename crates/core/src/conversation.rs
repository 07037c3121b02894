//! Bounded conversation memory and the infrastructure assistant
//!
//! The caller owns the [`Conversation`]; the assistant only reads it to build
//! the request and appends to it after a successful answer.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Configuration;
use crate::endpoint::{ChatMessage, EndpointClient};
use crate::error::{ensure_positive, ensure_prompt, HarnessError, Result};
use crate::probe::ProbeResult;

/// Exchanges retained when no limit is given
pub const DEFAULT_MAX_EXCHANGES: usize = 3;

const FRAMING_PREFIX: &str =
    "As an expert in Nutanix infrastructure and Kubernetes, answer this question:\n\n";
const FRAMING_SUFFIX: &str =
    "\n\nProvide practical, actionable advice suitable for enterprise infrastructure teams.";

/// One question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// Prior exchanges, oldest first, capped at `max_exchanges`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    exchanges: VecDeque<Exchange>,
    max_exchanges: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            exchanges: VecDeque::with_capacity(DEFAULT_MAX_EXCHANGES),
            max_exchanges: DEFAULT_MAX_EXCHANGES,
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain at most `max_exchanges` exchanges
    pub fn with_max_exchanges(max_exchanges: usize) -> Result<Self> {
        ensure_positive("max_exchanges", max_exchanges)?;
        Ok(Self {
            exchanges: VecDeque::with_capacity(max_exchanges),
            max_exchanges,
        })
    }

    /// Append an exchange, evicting the oldest when full
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        if self.exchanges.len() == self.max_exchanges {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Flattened user/assistant messages, oldest first
    pub fn history(&self) -> Vec<ChatMessage> {
        self.exchanges
            .iter()
            .flat_map(|e| {
                [
                    ChatMessage::user(e.question.as_str()),
                    ChatMessage::assistant(e.answer.as_str()),
                ]
            })
            .collect()
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    pub fn max_exchanges(&self) -> usize {
        self.max_exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

/// Wrap a question in the infrastructure-expert framing
pub fn frame_question(question: &str) -> String {
    format!("{FRAMING_PREFIX}{}{FRAMING_SUFFIX}", question.trim())
}

/// Answers infrastructure questions with one configuration's model
pub struct Assistant {
    client: EndpointClient,
    configuration: Configuration,
    timeout: Duration,
}

impl Assistant {
    pub fn new(client: EndpointClient, configuration: Configuration, timeout: Duration) -> Self {
        Self {
            client,
            configuration,
            timeout,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Ask a question in the context of `conversation`.
    ///
    /// The exchange is recorded only if the endpoint answered. The stored
    /// question is the one asked, without the framing.
    #[instrument(skip_all, fields(config_id = %self.configuration.id, history = conversation.len()))]
    pub async fn ask(&self, conversation: &mut Conversation, question: &str) -> Result<ProbeResult> {
        ensure_prompt(question)?;
        if self.timeout.is_zero() {
            return Err(HarnessError::invalid("timeout must be positive"));
        }

        let result = self
            .client
            .invoke_with_history(
                &self.configuration,
                &frame_question(question),
                conversation.history(),
                self.timeout,
            )
            .await;

        if let Some(answer) = result.response() {
            conversation.record(question.trim(), answer);
            debug!(retained = conversation.len(), "exchange recorded");
        }
        Ok(result)
    }
}

/// A canned question for demos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub key: &'static str,
    pub title: &'static str,
    pub prompt: &'static str,
}

/// Built-in demo questions
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        key: "1",
        title: "Kubernetes Troubleshooting",
        prompt: "I have a pod that's in CrashLoopBackOff state. What are the most common causes and how do I troubleshoot it step by step?",
    },
    Scenario {
        key: "2",
        title: "Nutanix Storage Best Practices",
        prompt: "What are the best practices for configuring storage classes in Kubernetes on Nutanix infrastructure?",
    },
    Scenario {
        key: "3",
        title: "Scaling Strategy",
        prompt: "Explain the difference between horizontal pod autoscaling and vertical pod autoscaling in Kubernetes. When should I use each?",
    },
    Scenario {
        key: "4",
        title: "Nutanix Cluster Optimization",
        prompt: "What are the key metrics I should monitor in a Nutanix cluster running Kubernetes workloads?",
    },
    Scenario {
        key: "5",
        title: "Disaster Recovery",
        prompt: "How do I implement a disaster recovery strategy for Kubernetes workloads on Nutanix? Include backup and restore procedures.",
    },
    Scenario {
        key: "6",
        title: "Network Policies",
        prompt: "Create a Kubernetes network policy that allows traffic only from specific namespaces to my database pods.",
    },
];

/// Look up a scenario by key
pub fn scenario(key: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key == key.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{ChatRole, EndpointError, GenerateRequest, ModelEndpoint};
    use crate::sim::{SimProfile, SimulatedEndpoint};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Echoes the history length and captures requests
    #[derive(Default)]
    struct RecordingEndpoint {
        requests: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl ModelEndpoint for RecordingEndpoint {
        async fn generate(&self, request: &GenerateRequest) -> std::result::Result<String, EndpointError> {
            self.requests.lock().push(request.clone());
            Ok(format!("answer with {} prior messages", request.history.len()))
        }

        async fn is_available(&self, _model: &str) -> std::result::Result<bool, EndpointError> {
            Ok(true)
        }
    }

    fn config() -> Configuration {
        Configuration::new("medium", "llama3.2:3b", 2, "12GB")
    }

    #[test]
    fn test_oldest_exchanges_evicted() {
        let mut conversation = Conversation::new();
        for i in 0..5 {
            conversation.record(format!("q{i}"), format!("a{i}"));
        }

        assert_eq!(conversation.len(), 3);
        let history = conversation.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0], ChatMessage::user("q2"));
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[5], ChatMessage::assistant("a4"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(Conversation::with_max_exchanges(0).is_err());
        assert_eq!(Conversation::with_max_exchanges(1).unwrap().max_exchanges(), 1);
    }

    #[test]
    fn test_framing_wraps_question() {
        let framed = frame_question("  How do I drain a node?  ");
        assert!(framed.starts_with("As an expert in Nutanix infrastructure and Kubernetes"));
        assert!(framed.contains("\n\nHow do I drain a node?\n\n"));
        assert!(framed.ends_with("enterprise infrastructure teams."));
    }

    #[tokio::test]
    async fn test_ask_passes_history_and_records() {
        let endpoint = Arc::new(RecordingEndpoint::default());
        let assistant = Assistant::new(
            EndpointClient::new(endpoint.clone()),
            config(),
            Duration::from_secs(5),
        );
        let mut conversation = Conversation::new();

        let first = assistant.ask(&mut conversation, "first?").await.unwrap();
        let second = assistant.ask(&mut conversation, "second?").await.unwrap();

        assert_eq!(first.response(), Some("answer with 0 prior messages"));
        assert_eq!(second.response(), Some("answer with 2 prior messages"));
        assert_eq!(conversation.len(), 2);

        let requests = endpoint.requests.lock();
        assert_eq!(requests[1].history[0], ChatMessage::user("first?"));
        assert!(requests[1].prompt.contains("second?"));
        assert_eq!(requests[1].model, "llama3.2:3b");
    }

    #[tokio::test]
    async fn test_failed_answer_not_recorded() {
        let sim = SimulatedEndpoint::new()
            .with_model("llama3.2:3b", SimProfile::new(Duration::ZERO).failing("model crashed"));
        let assistant = Assistant::new(EndpointClient::new(Arc::new(sim)), config(), Duration::from_secs(5));
        let mut conversation = Conversation::new();

        let result = assistant.ask(&mut conversation, "anything").await.unwrap();

        assert!(!result.is_success());
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let assistant = Assistant::new(
            EndpointClient::new(Arc::new(RecordingEndpoint::default())),
            config(),
            Duration::from_secs(5),
        );
        let mut conversation = Conversation::new();

        assert!(assistant.ask(&mut conversation, "   ").await.is_err());
    }

    #[test]
    fn test_scenario_catalogue() {
        assert_eq!(SCENARIOS.len(), 6);
        assert_eq!(scenario("6").unwrap().title, "Network Policies");
        assert!(scenario("7").is_none());
    }
}
