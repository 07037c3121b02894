// Ollama Endpoint
//
// Implementation of ModelEndpoint for an Ollama server.
// Plain prompts go to /api/generate, prompts with history to /api/chat, and
// availability is answered from the model list at /api/tags.

use async_trait::async_trait;
use partbench_core::{ChatMessage, EndpointError, GenerateRequest, ModelEndpoint};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama model-serving endpoint
///
/// # Example
///
/// ```ignore
/// use partbench_ollama::OllamaEndpoint;
///
/// let endpoint = OllamaEndpoint::new("http://gpu-node:11434");
/// let models = endpoint.list_models().await?;
/// ```
#[derive(Clone)]
pub struct OllamaEndpoint {
    client: Client,
    base_url: String,
}

impl Default for OllamaEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl OllamaEndpoint {
    /// Create an endpoint for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create an endpoint with a preconfigured HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Models the server has pulled
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, EndpointError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(send_error)?;

        let tags: TagsResponse = read_json(response).await?;
        Ok(tags.models)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, EndpointError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(send_error)?;

        read_json(response).await
    }
}

impl std::fmt::Debug for OllamaEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEndpoint")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl ModelEndpoint for OllamaEndpoint {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, EndpointError> {
        if request.history.is_empty() {
            debug!(model = %request.model, "POST /api/generate");
            let body = GenerateBody {
                model: &request.model,
                prompt: &request.prompt,
                stream: false,
            };
            let response: GenerateResponse = self.post("/api/generate", &body).await?;
            return Ok(response.response);
        }

        debug!(model = %request.model, history = request.history.len(), "POST /api/chat");
        let messages = request
            .history
            .iter()
            .cloned()
            .chain(std::iter::once(ChatMessage::user(request.prompt.as_str())))
            .collect();
        let body = ChatBody {
            model: &request.model,
            messages,
            stream: false,
        };
        let response: ChatResponse = self.post("/api/chat", &body).await?;
        Ok(response.message.content)
    }

    async fn is_available(&self, model: &str) -> Result<bool, EndpointError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.matches(model)))
    }
}

fn send_error(e: reqwest::Error) -> EndpointError {
    if e.is_connect() {
        EndpointError::unavailable(format!("Failed to connect: {}", e))
    } else {
        EndpointError::invocation(format!("Failed to send request: {}", e))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, EndpointError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&error_text)
            .map(|e| e.error)
            .unwrap_or(error_text);
        return Err(if status == StatusCode::NOT_FOUND {
            EndpointError::unavailable(message)
        } else {
            EndpointError::invocation(format!("Ollama API error ({}): {}", status, message))
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| EndpointError::invocation(format!("Failed to read response: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| EndpointError::invocation(format!("Malformed response: {}", e)))
}

// ============================================================================
// Ollama API Types
// ============================================================================

/// A model entry from /api/tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

impl OllamaModel {
    /// Whether this entry serves `model`; an untagged name means `:latest`
    pub fn matches(&self, model: &str) -> bool {
        if self.name == model {
            return true;
        }
        match self.name.strip_suffix(":latest") {
            Some(base) => base == model,
            None => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> OllamaModel {
        OllamaModel {
            name: name.to_string(),
            size: None,
            modified_at: None,
        }
    }

    #[test]
    fn test_model_name_matching() {
        assert!(model("llama3.2:1b").matches("llama3.2:1b"));
        assert!(model("mistral:latest").matches("mistral"));
        assert!(model("mistral:latest").matches("mistral:latest"));
        assert!(!model("llama3.2:1b").matches("llama3.2:3b"));
        assert!(!model("llama3.2:1b").matches("llama3.2"));
    }

    #[test]
    fn test_base_url_normalized() {
        let endpoint = OllamaEndpoint::new("http://gpu-node:11434/");
        assert_eq!(endpoint.base_url(), "http://gpu-node:11434");
        assert_eq!(endpoint.url("/api/tags"), "http://gpu-node:11434/api/tags");
    }

    #[test]
    fn test_chat_body_shape() {
        let body = ChatBody {
            model: "m",
            messages: vec![ChatMessage::user("hi")],
            stream: false,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["stream"], false);
    }
}
