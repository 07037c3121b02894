// Models command - which configurations the endpoint can serve

use crate::client::Client;
use crate::output::{print_table_header, print_table_row, OutputFormat};
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigurationStatus<'a> {
    id: &'a str,
    model: &'a str,
    available: bool,
}

pub async fn run(client: &Client, output: OutputFormat) -> Result<()> {
    let served = match client.ollama() {
        Some(ollama) => ollama.list_models().await?,
        None => Vec::new(),
    };
    let simulated = client.ollama().is_none();

    let statuses: Vec<ConfigurationStatus> = client
        .table()
        .iter()
        .map(|config| ConfigurationStatus {
            id: &config.id,
            model: &config.model,
            available: simulated || served.iter().any(|m| m.matches(&config.model)),
        })
        .collect();

    if !output.is_text() {
        return output.print_value(&serde_json::json!({
            "simulated": simulated,
            "models": served,
            "configurations": statuses,
        }));
    }

    if !served.is_empty() {
        print_table_header(&[("MODEL", 28), ("SIZE", 10), ("MODIFIED", 26)]);
        for model in &served {
            let size = model
                .size
                .map(|bytes| format!("{:.1} GB", bytes as f64 / 1e9))
                .unwrap_or_else(|| "-".to_string());
            print_table_row(&[
                (&model.name, 28),
                (&size, 10),
                (model.modified_at.as_deref().unwrap_or("-"), 26),
            ]);
        }
        println!();
    }

    print_table_header(&[("CONFIG", 10), ("MODEL", 20), ("STATUS", 40)]);
    for status in &statuses {
        let text = if simulated {
            "simulated".to_string()
        } else if status.available {
            "available".to_string()
        } else {
            format!("missing (ollama pull {})", status.model)
        };
        print_table_row(&[(status.id, 10), (status.model, 20), (&text, 40)]);
    }

    Ok(())
}
