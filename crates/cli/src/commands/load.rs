// Load command - one concurrent batch against a configuration

use crate::client::Client;
use crate::output::{
    describe_probe, describe_summary, print_field, print_table_header, print_table_row,
    OutputFormat,
};
use anyhow::Result;
use clap::Args;
use partbench_core::DEFAULT_BENCHMARK_PROMPT;

#[derive(Args)]
pub struct LoadArgs {
    /// Configuration id to load
    pub config: String,

    /// Prompt sent with every request
    #[arg(long, short, default_value = DEFAULT_BENCHMARK_PROMPT)]
    pub prompt: String,

    /// Number of requests [default: PARTBENCH_REQUESTS or 6]
    #[arg(long, short)]
    pub requests: Option<usize>,

    /// Maximum requests in flight [default: PARTBENCH_WORKERS or 4]
    #[arg(long, short)]
    pub workers: Option<usize>,
}

pub async fn run(client: &Client, output: OutputFormat, args: LoadArgs) -> Result<()> {
    let configuration = client.configuration(&args.config)?;
    let settings = client.settings();
    let requests = args.requests.unwrap_or(settings.requests);
    let workers = args.workers.unwrap_or(settings.workers);

    let mut run = client
        .harness()
        .load()
        .run_concurrent(configuration, &args.prompt, requests, workers)
        .await?;
    run.results.sort_by_key(|r| r.request_index);

    if !output.is_text() {
        return output.print_value(&run);
    }

    print_field("Config", &format!("{} ({})", configuration.id, configuration.model));
    print_field("Workers", &workers.to_string());
    print_field("Summary", &describe_summary(&run.summary));
    println!();
    print_table_header(&[("#", 4), ("RESULT", 70)]);
    for result in &run.results {
        print_table_row(&[
            (&result.request_index.to_string(), 4),
            (&describe_probe(result), 70),
        ]);
    }

    Ok(())
}
