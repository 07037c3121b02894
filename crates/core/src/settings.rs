// Harness settings
// Decision: Environment provides defaults, CLI flags override them

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::probe::duration_secs;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TRIALS: usize = 3;
pub const DEFAULT_REQUESTS: usize = 6;
pub const DEFAULT_WORKERS: usize = 4;

/// Run parameters shared by every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessSettings {
    /// Base URL of the model-serving endpoint
    pub ollama_url: String,
    /// Per-request timeout
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,
    /// Trials per throughput estimate
    pub trials: usize,
    /// Requests per load batch
    pub requests: usize,
    /// Concurrency bound for load batches
    pub workers: usize,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            trials: DEFAULT_TRIALS,
            requests: DEFAULT_REQUESTS,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl HarnessSettings {
    /// Create settings from PARTBENCH_* environment variables.
    ///
    /// Missing or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create settings from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let count = |key: &str, default: usize| {
            parsed(key)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        Self {
            ollama_url: lookup("PARTBENCH_OLLAMA_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.ollama_url),
            timeout: parsed("PARTBENCH_TIMEOUT_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            trials: count("PARTBENCH_TRIALS", defaults.trials),
            requests: count("PARTBENCH_REQUESTS", defaults.requests),
            workers: count("PARTBENCH_WORKERS", defaults.workers),
        }
    }

    pub fn with_ollama_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_requests(mut self, requests: usize) -> Self {
        self.requests = requests;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}
