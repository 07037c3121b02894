// Ask command - infrastructure assistant with bounded conversation memory

use crate::client::Client;
use crate::output::{describe_probe, print_field, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use partbench_core::{
    conversation::scenario, Assistant, ClusterIntrospector, Conversation, KubectlIntrospector,
    ProbeResult, SCENARIOS,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Args)]
pub struct AskArgs {
    /// Question to ask (starts an interactive session when omitted)
    pub question: Option<String>,

    /// Ask a built-in scenario by key (see `partbench scenarios`)
    #[arg(long, short, conflicts_with = "question")]
    pub scenario: Option<String>,

    /// Configuration whose model answers
    #[arg(long, short, default_value = "medium")]
    pub config: String,
}

pub async fn run(client: &Client, output: OutputFormat, quiet: bool, args: AskArgs) -> Result<()> {
    let configuration = client.configuration(&args.config)?.clone();
    let assistant = Assistant::new(
        client.endpoint_client(),
        configuration,
        client.settings().timeout,
    );
    let mut conversation = Conversation::new();

    let question = match (&args.scenario, args.question) {
        (Some(key), _) => {
            let scenario = scenario(key)
                .with_context(|| format!("unknown scenario '{}' (known: 1-{})", key, SCENARIOS.len()))?;
            if output.is_text() && !quiet {
                print_field("Scenario", scenario.title);
            }
            Some(scenario.prompt.to_string())
        }
        (None, question) => question,
    };

    match question {
        Some(question) => {
            let result = assistant.ask(&mut conversation, &question).await?;
            print_answer(output, quiet, &result)
        }
        None => interactive(&assistant, &mut conversation, output, quiet).await,
    }
}

async fn interactive(
    assistant: &Assistant,
    conversation: &mut Conversation,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    if output.is_text() && !quiet {
        let facts = KubectlIntrospector::new().facts().await;
        print_field("Model", &assistant.configuration().model);
        print_field("Cluster", &facts.to_string());
        println!();
        println!("Ask a question, pick a scenario by key (1-{}), or 'q' to quit.", SCENARIOS.len());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if output.is_text() {
            stdout.write_all(b"\n> ").await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "q" | "quit" | "exit") {
            break;
        }

        let question = match scenario(line) {
            Some(scenario) => {
                if output.is_text() && !quiet {
                    print_field("Scenario", scenario.title);
                }
                scenario.prompt
            }
            None => line,
        };

        let result = assistant.ask(conversation, question).await?;
        print_answer(output, quiet, &result)?;
    }

    Ok(())
}

fn print_answer(output: OutputFormat, quiet: bool, result: &ProbeResult) -> Result<()> {
    if !output.is_text() {
        return output.print_value(result);
    }

    match result.response() {
        Some(answer) => {
            println!();
            println!("{}", answer);
            if !quiet {
                println!();
                print_field("Stats", &describe_probe(result));
            }
        }
        None => print_field("Error", &describe_probe(result)),
    }
    Ok(())
}
