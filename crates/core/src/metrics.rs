//! Metric extraction
//!
//! Turns a raw response and its wall-clock duration into a normalized
//! metric record. Tokens are approximated by whitespace-delimited words.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Normalized metrics for one response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    /// Whitespace-delimited tokens in the response
    pub token_count: usize,
    /// token_count / duration, zero when the duration is zero
    pub tokens_per_second: f64,
}

/// Extract metrics from a response.
///
/// Pure: identical inputs always give identical output.
pub fn extract(response_text: &str, duration: Duration) -> ResponseMetrics {
    let token_count = response_text.split_whitespace().count();
    let secs = duration.as_secs_f64();
    let tokens_per_second = if secs > 0.0 {
        token_count as f64 / secs
    } else {
        0.0
    };

    ResponseMetrics {
        token_count,
        tokens_per_second,
    }
}
