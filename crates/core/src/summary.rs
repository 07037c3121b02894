//! Batch aggregation
//!
//! A BatchSummary is derived once from a set of probe results and never
//! mutated. `succeeded + failed == issued` holds by construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::probe::{duration_secs, ProbeResult};

/// Aggregate statistics over a set of probe results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Requests issued
    pub issued: usize,
    /// Requests that returned a response
    pub succeeded: usize,
    /// Requests that timed out or failed
    pub failed: usize,
    /// Mean duration over successful requests, zero when none succeeded
    #[serde(rename = "mean_duration_secs", with = "duration_secs")]
    pub mean_duration: Duration,
    /// Time from dispatch start to last completion
    #[serde(rename = "wall_clock_secs", with = "duration_secs")]
    pub wall_clock: Duration,
    /// Successful requests per minute of wall-clock time
    pub requests_per_minute: f64,
    /// Output tokens of successful requests per second of wall-clock time
    pub tokens_per_second: f64,
}

impl BatchSummary {
    /// Summarize results collected over `wall_clock`.
    ///
    /// Degenerate batches (nothing succeeded, zero wall clock) report zero
    /// rates instead of failing.
    pub fn from_results(results: &[ProbeResult], wall_clock: Duration) -> Self {
        let issued = results.len();
        let successes: Vec<&ProbeResult> = results.iter().filter(|r| r.is_success()).collect();
        let succeeded = successes.len();

        let mean_duration = if succeeded == 0 {
            Duration::ZERO
        } else {
            successes.iter().map(|r| r.duration).sum::<Duration>() / succeeded as u32
        };

        let total_tokens: usize = successes
            .iter()
            .filter_map(|r| r.metrics())
            .map(|m| m.token_count)
            .sum();

        let wall_secs = wall_clock.as_secs_f64();
        let (requests_per_minute, tokens_per_second) = if wall_secs > 0.0 {
            (
                succeeded as f64 / wall_secs * 60.0,
                total_tokens as f64 / wall_secs,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            issued,
            succeeded,
            failed: issued - succeeded,
            mean_duration,
            wall_clock,
            requests_per_minute,
            tokens_per_second,
        }
    }

    /// Fraction of issued requests that succeeded (zero for an empty batch)
    pub fn success_rate(&self) -> f64 {
        if self.issued == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.issued as f64
        }
    }

    /// Whether nothing in the batch succeeded
    pub fn is_degenerate(&self) -> bool {
        self.succeeded == 0
    }
}
