//! Concurrent load runner
//!
//! Dispatches N independent requests against one configuration through a
//! bounded worker pool. All requests are submitted at once; a semaphore
//! bounds how many are in flight and results are consumed as they complete.
//!
//! Each request's duration is measured from the moment it acquires a worker,
//! so queueing behind siblings never inflates it. The batch wall clock runs
//! from dispatch start to the last completion.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, instrument};

use crate::config::Configuration;
use crate::endpoint::EndpointClient;
use crate::error::{ensure_positive, ensure_prompt, HarnessError, Result};
use crate::probe::{ProbeErrorKind, ProbeResult};
use crate::summary::BatchSummary;

/// Results of one concurrent batch
#[derive(Debug, Clone, Serialize)]
pub struct LoadRun {
    /// Configuration the batch ran against
    pub config_id: String,
    /// Concurrency bound used
    pub max_workers: usize,
    /// Per-request results in completion order, tagged with request index
    pub results: Vec<ProbeResult>,
    /// Batch aggregate
    pub summary: BatchSummary,
}

impl LoadRun {
    /// Split into results and summary
    pub fn into_parts(self) -> (Vec<ProbeResult>, BatchSummary) {
        (self.results, self.summary)
    }

    /// Result of a specific request
    pub fn result_for(&self, request_index: usize) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.request_index == request_index)
    }
}

/// Runs concurrent batches against single configurations
#[derive(Clone)]
pub struct LoadRunner {
    client: EndpointClient,
    timeout: Duration,
}

impl LoadRunner {
    pub fn new(client: EndpointClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Dispatch `request_count` requests with at most `max_workers` in flight.
    ///
    /// Always returns exactly `request_count` results. Fails only on invalid
    /// arguments, before anything is dispatched.
    #[instrument(skip(self, configuration, prompt), fields(config_id = %configuration.id))]
    pub async fn run_concurrent(
        &self,
        configuration: &Configuration,
        prompt: &str,
        request_count: usize,
        max_workers: usize,
    ) -> Result<LoadRun> {
        ensure_prompt(prompt)?;
        ensure_positive("request_count", request_count)?;
        ensure_positive("max_workers", max_workers)?;
        if self.timeout.is_zero() {
            return Err(HarnessError::invalid("timeout must be positive"));
        }

        let semaphore = Arc::new(Semaphore::new(max_workers));
        let config = Arc::new(configuration.clone());
        let prompt: Arc<str> = Arc::from(prompt);
        let mut tasks = JoinSet::new();

        let start = Instant::now();

        for request_index in 0..request_count {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let config = config.clone();
            let prompt = prompt.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let request = async {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return ProbeResult::failure(
                            request_index,
                            &config.id,
                            ProbeErrorKind::InvocationError,
                            "worker pool closed",
                            Duration::ZERO,
                        );
                    };
                    client
                        .invoke_indexed(request_index, &config, &prompt, timeout)
                        .await
                };

                AssertUnwindSafe(request)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        ProbeResult::failure(
                            request_index,
                            &config.id,
                            ProbeErrorKind::InvocationError,
                            "request task panicked",
                            Duration::ZERO,
                        )
                    })
            });
        }

        // Single aggregation point: results arrive in completion order
        let mut results = Vec::with_capacity(request_count);
        let mut seen = vec![false; request_count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    seen[result.request_index] = true;
                    results.push(result);
                }
                Err(e) => error!(error = %e, "request task did not complete"),
            }
        }
        let wall_clock = start.elapsed();

        for (request_index, _) in seen.iter().enumerate().filter(|(_, done)| !**done) {
            results.push(ProbeResult::failure(
                request_index,
                &configuration.id,
                ProbeErrorKind::InvocationError,
                "request task was cancelled",
                Duration::ZERO,
            ));
        }

        let summary = BatchSummary::from_results(&results, wall_clock);

        info!(
            issued = summary.issued,
            succeeded = summary.succeeded,
            failed = summary.failed,
            wall_clock_ms = wall_clock.as_millis() as u64,
            requests_per_minute = summary.requests_per_minute,
            "load batch complete"
        );

        Ok(LoadRun {
            config_id: configuration.id.clone(),
            max_workers,
            results,
            summary,
        })
    }
}
