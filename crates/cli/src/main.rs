// partbench CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr so json/yaml on stdout stays parseable.

mod client;
mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use partbench_core::HarnessSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "partbench")]
#[command(about = "Benchmark inference configurations partitioned across shared accelerators")]
#[command(version)]
pub struct Cli {
    /// Model endpoint base URL [default: PARTBENCH_OLLAMA_URL or http://localhost:11434]
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// YAML configuration table (defaults to the built-in A30 table)
    #[arg(long, env = "PARTBENCH_CONFIGS")]
    pub configs: Option<PathBuf>,

    /// Per-request timeout in seconds [default: PARTBENCH_TIMEOUT_SECS or 60]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Use the simulated endpoint instead of a live server
    #[arg(long)]
    pub simulate: bool,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every configuration, optionally with load batches and estimates
    Compare(commands::compare::CompareArgs),

    /// Run one concurrent batch against a configuration
    Load(commands::load::LoadArgs),

    /// Project sustained throughput per configuration
    Estimate(commands::estimate::EstimateArgs),

    /// List models the endpoint serves and which configurations they cover
    Models,

    /// Show the current Kubernetes context and node count
    Cluster,

    /// Ask the infrastructure assistant a question
    Ask(commands::ask::AskArgs),

    /// List the built-in assistant scenarios
    Scenarios,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "partbench=warn,partbench_core=warn"
    } else {
        "partbench=info,partbench_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = HarnessSettings::from_env();
    if let Some(url) = &cli.ollama_url {
        settings = settings.with_ollama_url(url.trim_end_matches('/'));
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            anyhow::bail!("--timeout must be at least 1 second");
        }
        settings = settings.with_timeout(std::time::Duration::from_secs(secs));
    }

    let client = client::Client::new(settings, cli.configs.as_deref(), cli.simulate)?;
    let output_format = output::OutputFormat::parse(&cli.output);

    match cli.command {
        Commands::Compare(args) => commands::compare::run(&client, output_format, args).await,
        Commands::Load(args) => commands::load::run(&client, output_format, args).await,
        Commands::Estimate(args) => commands::estimate::run(&client, output_format, args).await,
        Commands::Models => commands::models::run(&client, output_format).await,
        Commands::Cluster => commands::cluster::run(output_format).await,
        Commands::Ask(args) => commands::ask::run(&client, output_format, cli.quiet, args).await,
        Commands::Scenarios => commands::scenarios::run(output_format),
    }
}
