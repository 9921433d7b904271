//! Library root for `relay-bot`.
//!
//! Relay-bot answers Slack mentions with text generated by a locally hosted
//! Ollama model:
//! - Listens for mentions of the bot over Slack socket mode
//! - Sends the mention's text to Ollama's generate endpoint
//! - Posts the generated text (or a fixed apology) back to the channel
//! - Serves a liveness endpoint for process supervisors
//!
//! The architecture is built around small traits for the chat and LLM
//! services, so either side can be swapped out or mocked.

pub mod base;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::{error, info};

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the relay-bot runtime:
/// - Initializes the crypto provider
/// - Starts the liveness endpoint on its own task
/// - Logs in to the chat platform with the LLM client wired in
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting relay-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow::anyhow!("Failed to install the rustls crypto provider."))?;

    // Start the liveness endpoint; it runs until the process exits.
    let _health = service::health::spawn(&config).await?;

    // Initialize the runtime.
    let runtime = match runtime::Runtime::new(config).await {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to log in. Please check the Slack tokens: {}", err);
            return Err(err);
        }
    };

    // Start the runtime.
    runtime.start().await?;

    info!("Relay-bot stopped.");

    Ok(())
}
