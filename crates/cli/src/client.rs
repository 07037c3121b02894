// Endpoint and configuration wiring shared by all commands

use std::path::Path;
use std::sync::Arc;

use partbench_core::{
    ConfigError, Configuration, ConfigurationTable, EndpointClient, Harness, HarnessSettings,
    ModelEndpoint, SimulatedEndpoint,
};
use partbench_ollama::OllamaEndpoint;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("configuration table: {0}")]
    Table(#[from] ConfigError),

    #[error("unknown configuration '{id}' (known: {known})")]
    UnknownConfiguration { id: String, known: String },
}

pub struct Client {
    settings: HarnessSettings,
    table: ConfigurationTable,
    endpoint: Arc<dyn ModelEndpoint>,
    ollama: Option<OllamaEndpoint>,
}

impl Client {
    pub fn new(
        settings: HarnessSettings,
        configs: Option<&Path>,
        simulate: bool,
    ) -> Result<Self, ClientError> {
        let table = match configs {
            Some(path) => ConfigurationTable::from_file(path)?,
            None => ConfigurationTable::builtin(),
        };

        let (endpoint, ollama) = if simulate {
            debug!("using simulated endpoint");
            let sim: Arc<dyn ModelEndpoint> = Arc::new(SimulatedEndpoint::for_table(&table));
            (sim, None)
        } else {
            debug!(url = %settings.ollama_url, "using ollama endpoint");
            let ollama = OllamaEndpoint::new(&settings.ollama_url);
            let live: Arc<dyn ModelEndpoint> = Arc::new(ollama.clone());
            (live, Some(ollama))
        };

        Ok(Self {
            settings,
            table,
            endpoint,
            ollama,
        })
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn table(&self) -> &ConfigurationTable {
        &self.table
    }

    /// Live server, if not simulating
    pub fn ollama(&self) -> Option<&OllamaEndpoint> {
        self.ollama.as_ref()
    }

    pub fn endpoint_client(&self) -> EndpointClient {
        EndpointClient::new(self.endpoint.clone())
    }

    pub fn harness(&self) -> Harness {
        Harness::new(self.endpoint_client(), self.settings.timeout)
    }

    pub fn configuration(&self, id: &str) -> Result<&Configuration, ClientError> {
        self.table
            .get(id)
            .ok_or_else(|| ClientError::UnknownConfiguration {
                id: id.to_string(),
                known: self.table.ids().join(", "),
            })
    }

    /// Table restricted to `ids` (the whole table when empty), in table order
    pub fn select(&self, ids: &[String]) -> Result<ConfigurationTable, ClientError> {
        if ids.is_empty() {
            return Ok(self.table.clone());
        }
        for id in ids {
            self.configuration(id)?;
        }
        let selected = self
            .table
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect();
        Ok(ConfigurationTable::new(selected)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(HarnessSettings::default(), None, true).unwrap()
    }

    #[test]
    fn test_select_keeps_table_order() {
        let selected = client()
            .select(&["large".to_string(), "small".to_string()])
            .unwrap();
        assert_eq!(selected.ids(), vec!["small", "large"]);
    }

    #[test]
    fn test_select_rejects_unknown_ids() {
        let err = client().select(&["huge".to_string()]).err().unwrap();
        assert!(err.to_string().contains("unknown configuration 'huge'"));
    }

    #[test]
    fn test_simulation_has_no_live_server() {
        let client = client();
        assert!(client.ollama().is_none());
        assert_eq!(client.table().len(), 3);
    }
}
