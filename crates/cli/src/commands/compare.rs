// Compare command - probe every configuration and render a report

use crate::client::Client;
use crate::output::OutputFormat;
use anyhow::Result;
use clap::Args;
use partbench_core::{CompareOptions, ReportRenderer, DEFAULT_BENCHMARK_PROMPT, DEFAULT_ESTIMATE_PROMPT};

#[derive(Args)]
pub struct CompareArgs {
    /// Prompt sent to every configuration
    #[arg(long, short, default_value = DEFAULT_BENCHMARK_PROMPT)]
    pub prompt: String,

    /// Only these configuration ids (repeatable)
    #[arg(long = "config", short = 'c')]
    pub configs: Vec<String>,

    /// Also run a concurrent load batch per configuration
    #[arg(long)]
    pub load: bool,

    /// Requests per load batch [default: PARTBENCH_REQUESTS or 6]
    #[arg(long)]
    pub requests: Option<usize>,

    /// Concurrency bound per load batch [default: PARTBENCH_WORKERS or 4]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Also estimate sustained throughput per configuration
    #[arg(long)]
    pub estimate: bool,

    /// Trials per estimate [default: PARTBENCH_TRIALS or 3]
    #[arg(long)]
    pub trials: Option<usize>,

    /// Short prompt used for estimate trials
    #[arg(long, default_value = DEFAULT_ESTIMATE_PROMPT)]
    pub estimate_prompt: String,
}

pub async fn run(client: &Client, output: OutputFormat, args: CompareArgs) -> Result<()> {
    let table = client.select(&args.configs)?;
    let settings = client.settings();

    let mut options = CompareOptions::new(args.prompt);
    if args.load {
        options = options.with_load(
            args.requests.unwrap_or(settings.requests),
            args.workers.unwrap_or(settings.workers),
        );
    }
    if args.estimate {
        options = options.with_estimate(args.estimate_prompt, args.trials.unwrap_or(settings.trials));
    }

    let report = client.harness().compare(&table, &options).await?;
    print!("{}", output.render(&report)?);
    if !output.is_text() {
        println!();
    }

    Ok(())
}
