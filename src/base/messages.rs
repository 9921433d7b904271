//! Fixed user-facing messages.
//!
//! None of these may ever be confused with model output, so they are constants
//! rather than anything echoed from the network layer.

/// Sent when the bot is mentioned without any prompt.
pub const GREETING: &str = "Hello! You mentioned me. What can I help you with?";

/// Sent when the model server answered, but without a `response` field.
pub const NO_RESPONSE_APOLOGY: &str = "Sorry, I couldn't get a response from the model.";

/// Sent when the model server answered with something unusable.
pub const UNEXPECTED_ERROR_APOLOGY: &str = "An unexpected error occurred while generating the response.";

/// Sent when the relay itself fails while producing or sending a reply.
pub const PROCESSING_APOLOGY: &str = "I'm sorry, I encountered an error while thinking.";

/// Body of the liveness endpoint.
pub const HEALTH_BODY: &str = "HTTP server is running. The chat bot is active in a separate task.";

/// Sent when the model server at `host` cannot be reached.
pub fn unreachable_host(host: &str) -> String {
    format!("Sorry, I'm having trouble connecting to the AI model at {host}. Please check if Ollama is running.")
}
