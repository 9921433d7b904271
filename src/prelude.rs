pub use crate::base::{
    config::Config,
    types::{Err, InboundMessage, RelayOutcome, Res, Void},
};
pub use crate::service::{chat::ChatClient, llm::LlmClient};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
