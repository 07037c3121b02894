// Probe results
//
// A ProbeResult is the outcome of one endpoint invocation. The outcome is a
// tagged type: a success always carries its response and metrics, a failure
// always carries an error kind and message.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::{self, ResponseMetrics};

/// Why an invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// No response within the timeout window
    Timeout,
    /// Endpoint rejected the call or could not be reached
    EndpointUnavailable,
    /// Endpoint was reached but returned an error
    InvocationError,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeErrorKind::Timeout => "timeout",
            ProbeErrorKind::EndpointUnavailable => "endpoint_unavailable",
            ProbeErrorKind::InvocationError => "invocation_error",
        };
        f.write_str(s)
    }
}

/// Outcome of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success {
        response: String,
        #[serde(flatten)]
        metrics: ResponseMetrics,
    },
    Failure {
        kind: ProbeErrorKind,
        message: String,
    },
}

/// Outcome of one endpoint invocation plus its timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Index of the originating request within its batch
    pub request_index: usize,
    /// Configuration the request was sent to
    pub config_id: String,
    /// Wall-clock time from dispatch to completion (or timeout)
    #[serde(rename = "duration_secs", with = "duration_secs")]
    pub duration: Duration,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    /// Build a successful result; metrics are derived from the response
    pub fn success(
        request_index: usize,
        config_id: impl Into<String>,
        response: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let response = response.into();
        let metrics = metrics::extract(&response, duration);
        Self {
            request_index,
            config_id: config_id.into(),
            duration,
            outcome: ProbeOutcome::Success { response, metrics },
        }
    }

    /// Build a failed result
    pub fn failure(
        request_index: usize,
        config_id: impl Into<String>,
        kind: ProbeErrorKind,
        message: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            request_index,
            config_id: config_id.into(),
            duration,
            outcome: ProbeOutcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success { .. })
    }

    /// Metrics, present only on success
    pub fn metrics(&self) -> Option<&ResponseMetrics> {
        match &self.outcome {
            ProbeOutcome::Success { metrics, .. } => Some(metrics),
            ProbeOutcome::Failure { .. } => None,
        }
    }

    /// Response text, present only on success
    pub fn response(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Success { response, .. } => Some(response),
            ProbeOutcome::Failure { .. } => None,
        }
    }

    /// Error kind, present only on failure
    pub fn error_kind(&self) -> Option<ProbeErrorKind> {
        match &self.outcome {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Error message, present only on failure
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure { message, .. } => Some(message),
        }
    }
}

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_carries_metrics() {
        let result = ProbeResult::success(0, "small", "four tokens right here", Duration::from_secs(2));

        assert!(result.is_success());
        assert_eq!(result.metrics().unwrap().token_count, 4);
        assert_eq!(result.metrics().unwrap().tokens_per_second, 2.0);
        assert_eq!(result.error_kind(), None);
    }

    #[test]
    fn test_failure_has_no_metrics() {
        let result = ProbeResult::failure(
            3,
            "large",
            ProbeErrorKind::Timeout,
            "no response within 60s",
            Duration::from_secs(60),
        );

        assert!(!result.is_success());
        assert!(result.metrics().is_none());
        assert!(result.response().is_none());
        assert_eq!(result.error_kind(), Some(ProbeErrorKind::Timeout));
        assert_eq!(result.error_message(), Some("no response within 60s"));
    }

    #[test]
    fn test_serialized_shape() {
        let ok = ProbeResult::success(1, "small", "a b", Duration::from_millis(500));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["duration_secs"], json!(0.5));
        assert_eq!(value["token_count"], 2);
        assert_eq!(value["tokens_per_second"], json!(4.0));

        let failed = ProbeResult::failure(
            2,
            "small",
            ProbeErrorKind::EndpointUnavailable,
            "connection refused",
            Duration::ZERO,
        );
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["kind"], "endpoint_unavailable");

        let back: ProbeResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, failed);
    }
}
