// Output formatting for CLI

use anyhow::Result;
use partbench_core::{
    BatchSummary, ComparisonReport, ProbeOutcome, ProbeResult, ReportRenderer,
    ThroughputEstimate,
};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    /// Serialize for json/yaml output; text output is handled by each command
    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(rendered) = self.serialize(value)? {
            println!("{}", rendered);
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Option<String>> {
        Ok(match self {
            OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
            OutputFormat::Text => None,
        })
    }
}

impl ReportRenderer for OutputFormat {
    type Error = anyhow::Error;

    fn render(&self, report: &ComparisonReport) -> Result<String> {
        match self.serialize(report)? {
            Some(rendered) => Ok(rendered),
            None => Ok(render_text(report)),
        }
    }
}

/// Human-readable comparison report
pub fn render_text(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {} ({})", report.run_id, report.generated_at.to_rfc3339());

    for entry in &report.entries {
        let config = &entry.configuration;
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({})", config.id.to_uppercase(), config.model);
        if let Some(profile) = &config.profile {
            let _ = writeln!(out, "  {:<16} {}", "Profile:", profile);
        }
        let _ = writeln!(out, "  {:<16} {}", "Capacity:", config.capacity);
        if let Some(namespace) = &config.namespace {
            let _ = writeln!(out, "  {:<16} {}", "Namespace:", namespace);
        }
        let _ = writeln!(out, "  {:<16} {}", "Instances:", config.replication_factor);

        if let Some(probe) = &entry.probe {
            let _ = writeln!(out, "  {:<16} {}", "Probe:", describe_probe(probe));
            if let Some(response) = probe.response() {
                let _ = writeln!(out, "  {:<16} {}", "Response:", preview(response, 200));
            }
        }
        if let Some(load) = &entry.load {
            let _ = writeln!(out, "  {:<16} {}", "Load:", describe_summary(load));
        }
        if let Some(estimate) = &entry.estimate {
            let _ = writeln!(out, "  {:<16} {}", "Throughput:", describe_estimate(estimate));
        }
    }

    for id in &report.skipped {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}: skipped (model not available)", id.to_uppercase());
    }

    let capacity = report.projected_capacity_rpm();
    if capacity > 0.0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Projected capacity: {:.1} req/min", capacity);
    }
    out
}

pub fn describe_probe(probe: &ProbeResult) -> String {
    match &probe.outcome {
        ProbeOutcome::Success { metrics, .. } => format!(
            "{:.2}s, {} tokens, {:.1} tokens/sec",
            probe.duration.as_secs_f64(),
            metrics.token_count,
            metrics.tokens_per_second
        ),
        ProbeOutcome::Failure { kind, message } => {
            format!("failed ({}) after {:.2}s: {}", kind, probe.duration.as_secs_f64(), message)
        }
    }
}

pub fn describe_summary(summary: &BatchSummary) -> String {
    let mut text = format!(
        "{}/{} succeeded in {:.2}s, {:.1} req/min, mean {:.2}s",
        summary.succeeded,
        summary.issued,
        summary.wall_clock.as_secs_f64(),
        summary.requests_per_minute,
        summary.mean_duration.as_secs_f64()
    );
    if summary.is_degenerate() {
        text.push_str(" (no successful requests)");
    }
    text
}

pub fn describe_estimate(estimate: &ThroughputEstimate) -> String {
    format!(
        "{:.1} req/min per instance × {} = {:.1} req/min (avg {:.2}s over {}/{} trials)",
        estimate.single_instance_rpm,
        estimate.replication_factor,
        estimate.total_rpm,
        estimate.average_duration.as_secs_f64(),
        estimate.succeeded,
        estimate.trials
    )
}

/// First `max_chars` characters of a response, on one line
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    let header: String = columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header);
}

/// Print a table row, truncating values wider than their column
pub fn print_table_row(values: &[(&str, usize)]) {
    let row: String = values
        .iter()
        .map(|(val, width)| {
            let s = if val.chars().count() > *width && *width > 3 {
                let cut: String = val.chars().take(width - 3).collect();
                format!("{}...", cut)
            } else {
                val.to_string()
            };
            format!("{:<width$}", s, width = width)
        })
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", row);
}
