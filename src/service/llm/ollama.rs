//! Ollama implementation of the LLM client.
//!
//! Prompts are sent to `POST {host}/api/generate` with streaming disabled, so
//! the whole generation comes back as a single JSON object.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::base::{config::Config, messages, types::Res};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the ollama implementation.

impl LlmClient {
    pub fn ollama(config: &Config) -> Res<Self> {
        let client = OllamaLlmClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Types.

/// Body of a generation request.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// Ways a generation request can fail.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The request never got a successful answer (refused, timed out, or an error status).
    #[error("ollama is unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    /// The server answered, but without a `response` field.
    #[error("ollama answered without a `response` field")]
    MissingResponse,
    /// The server answered with something that could not be used.
    #[error("ollama answered with an unusable body: {0}")]
    Unexpected(String),
}

impl GenerateError {
    /// The message shown to the user for this failure.
    pub fn user_message(&self, host: &str) -> String {
        match self {
            GenerateError::Unreachable(_) => messages::unreachable_host(host),
            GenerateError::MissingResponse => messages::NO_RESPONSE_APOLOGY.to_string(),
            GenerateError::Unexpected(_) => messages::UNEXPECTED_ERROR_APOLOGY.to_string(),
        }
    }
}

// Specific implementations.

/// Ollama LLM client implementation.
#[derive(Clone)]
pub struct OllamaLlmClient {
    client: reqwest::Client,
    config: Config,
}

impl OllamaLlmClient {
    /// Create a new Ollama LLM client.
    #[instrument(name = "OllamaLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.ollama_timeout_secs)).build()?;

        Ok(Self { client, config: config.clone() })
    }

    /// The full URL of the generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.ollama_base_url())
    }

    /// Send `prompt` to the model, surfacing every failure.
    #[instrument(name = "OllamaLlmClient::try_generate", skip_all)]
    pub async fn try_generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = GenerateRequest {
            model: &self.config.ollama_model,
            prompt,
            stream: false,
        };

        info!("Sending prompt to Ollama: `{}`", prompt);

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(GenerateError::Unreachable)?;

        let bytes = response.bytes().await.map_err(|e| if e.is_timeout() { GenerateError::Unreachable(e) } else { GenerateError::Unexpected(e.to_string()) })?;

        let text = parse_generate_body(&bytes)?;

        info!("Received response from Ollama.");

        Ok(text)
    }
}

/// Extract the `response` field from a generation response body.
///
/// The body must be a JSON object; a missing or `null` field is `MissingResponse`,
/// anything else that is not a string is `Unexpected`.
pub fn parse_generate_body(bytes: &[u8]) -> Result<String, GenerateError> {
    let body: Value = serde_json::from_slice(bytes).map_err(|e| GenerateError::Unexpected(e.to_string()))?;

    let object = body.as_object().ok_or_else(|| GenerateError::Unexpected(format!("expected a JSON object, got `{body}`")))?;

    match object.get("response") {
        None | Some(Value::Null) => Err(GenerateError::MissingResponse),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(GenerateError::Unexpected(format!("`response` is not a string: `{other}`"))),
    }
}

#[async_trait]
impl GenericLlmClient for OllamaLlmClient {
    #[instrument(name = "OllamaLlmClient::generate", skip_all)]
    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(err) => {
                error!("Generation failed: {}", err);
                err.user_message(&self.config.ollama_host)
            }
        }
    }
}

// Tests.
