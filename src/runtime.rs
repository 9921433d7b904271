//! Runtime services and shared state for the relay-bot.

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{chat::ChatClient, llm::LlmClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the LLM client, chat client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// This logs in to the chat platform, so it fails when the credentials are rejected.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the LLM client.
        let llm = LlmClient::ollama(&config)?;

        // Initialize the slack client.
        let chat = ChatClient::slack(&config, llm.clone()).await?;

        Ok(Self { config, llm, chat })
    }

    /// Run the chat listener until shutdown.
    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
