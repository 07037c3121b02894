// Result aggregation
//
// Merges sequential probes, load batches and throughput estimates into one
// Comparison Report keyed by configuration id. Nothing is recomputed here;
// the aggregator only assembles structure, in configuration table order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::{Configuration, ConfigurationTable};
use crate::estimator::ThroughputEstimate;
use crate::probe::ProbeResult;
use crate::sequential::SequentialResults;
use crate::summary::BatchSummary;

/// Everything one run produced, before aggregation
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    pub sequential: Option<SequentialResults>,
    /// Load batch summaries keyed by configuration id
    pub load: Vec<(String, BatchSummary)>,
    pub estimates: Vec<ThroughputEstimate>,
}

/// Per-configuration section of a report
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub configuration: Configuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<BatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<ThroughputEstimate>,
}

impl ReportEntry {
    pub fn config_id(&self) -> &str {
        &self.configuration.id
    }
}

/// Final comparison handed to a renderer
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Entries in configuration table order
    pub entries: Vec<ReportEntry>,
    /// Configurations skipped as unavailable
    pub skipped: Vec<String>,
}

impl ComparisonReport {
    /// Entry for a configuration id
    pub fn get(&self, config_id: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.config_id() == config_id)
    }

    /// Configuration ids in report order
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.config_id()).collect()
    }

    /// Sum of projected total throughput across configurations
    pub fn projected_capacity_rpm(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|e| e.estimate.as_ref())
            .map(|e| e.total_rpm)
            .sum()
    }
}

/// Turns a report into a human-facing artifact
pub trait ReportRenderer {
    type Error;

    fn render(&self, report: &ComparisonReport) -> Result<String, Self::Error>;
}

/// Merge run outputs into a report ordered like `table`.
///
/// Configurations with no data of any kind are left out of `entries`.
pub fn aggregate(table: &ConfigurationTable, results: RunResults) -> ComparisonReport {
    let RunResults {
        sequential,
        mut load,
        mut estimates,
    } = results;

    let skipped = sequential
        .as_ref()
        .map(|s| s.skipped().to_vec())
        .unwrap_or_default();

    let entries = table
        .iter()
        .filter_map(|config| {
            let probe = sequential.as_ref().and_then(|s| s.get(&config.id)).cloned();
            let batch = load
                .iter()
                .position(|(id, _)| *id == config.id)
                .map(|i| load.swap_remove(i).1);
            let estimate = estimates
                .iter()
                .position(|e| e.config_id == config.id)
                .map(|i| estimates.swap_remove(i));

            if probe.is_none() && batch.is_none() && estimate.is_none() {
                return None;
            }

            Some(ReportEntry {
                configuration: config.clone(),
                probe,
                load: batch,
                estimate,
            })
        })
        .collect();

    ComparisonReport {
        run_id: Uuid::now_v7(),
        generated_at: Utc::now(),
        entries,
        skipped,
    }
}
