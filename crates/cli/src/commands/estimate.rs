// Estimate command - project sustained throughput per configuration

use crate::client::Client;
use crate::output::{print_table_header, print_table_row, OutputFormat};
use anyhow::Result;
use clap::Args;
use partbench_core::DEFAULT_ESTIMATE_PROMPT;

#[derive(Args)]
pub struct EstimateArgs {
    /// Only these configuration ids (repeatable)
    #[arg(long = "config", short = 'c')]
    pub configs: Vec<String>,

    /// Short prompt for low-variance trials
    #[arg(long, short, default_value = DEFAULT_ESTIMATE_PROMPT)]
    pub prompt: String,

    /// Sequential trials per configuration [default: PARTBENCH_TRIALS or 3]
    #[arg(long, short)]
    pub trials: Option<usize>,
}

pub async fn run(client: &Client, output: OutputFormat, args: EstimateArgs) -> Result<()> {
    let table = client.select(&args.configs)?;
    let trials = args.trials.unwrap_or(client.settings().trials);

    let estimates = client
        .harness()
        .estimator()
        .estimate_all(&table, &args.prompt, trials)
        .await?;

    if !output.is_text() {
        return output.print_value(&serde_json::json!({
            "data": estimates,
            "total_rpm": estimates.iter().map(|e| e.total_rpm).sum::<f64>(),
        }));
    }

    if estimates.is_empty() {
        println!("No configurations available");
        return Ok(());
    }

    print_table_header(&[
        ("CONFIG", 10),
        ("AVG", 8),
        ("TRIALS", 7),
        ("REQ/MIN", 9),
        ("INSTANCES", 9),
        ("TOTAL", 9),
    ]);
    for estimate in &estimates {
        print_table_row(&[
            (&estimate.config_id, 10),
            (&format!("{:.2}s", estimate.average_duration.as_secs_f64()), 8),
            (&format!("{}/{}", estimate.succeeded, estimate.trials), 7),
            (&format!("{:.1}", estimate.single_instance_rpm), 9),
            (&estimate.replication_factor.to_string(), 9),
            (&format!("{:.1}", estimate.total_rpm), 9),
        ]);
    }

    Ok(())
}
