//! Relays bot mentions to the LLM and posts the reply.

use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        messages,
        types::{InboundMessage, RelayOutcome, Res},
    },
    service::{chat::ChatClient, llm::LlmClient},
};

/// Handles an inbound chat message.
///
/// The message is processed on a new task, so the event listener is free to
/// deliver other messages while the model is generating. Every failure is
/// logged here and never reaches the listener.
#[instrument(skip_all)]
pub fn handle_mention(message: InboundMessage, config: Config, llm: LlmClient, chat: ChatClient) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            // Process the event.
            let result = process_message(&message, &config, &llm, &chat).await;

            // Log the outcome.
            match result {
                Ok(outcome) => info!("Finished handling message `{}`: {:?}", message.ts, outcome),
                Err(err) => error!("Error while handling: {}", err),
            }
        }
        .in_current_span(),
    )
}

/// Decides whether to respond to `message` and, if so, responds exactly once.
#[instrument(skip_all, fields(channel_id = %message.channel_id, ts = %message.ts))]
pub async fn process_message(message: &InboundMessage, config: &Config, llm: &LlmClient, chat: &ChatClient) -> Res<RelayOutcome> {
    let bot_user_id = chat.bot_user_id();

    // Never reply to ourselves.

    if message.author_id == bot_user_id {
        return Ok(RelayOutcome::IgnoredOwnMessage);
    }

    if !message.mentions(bot_user_id) {
        return Ok(RelayOutcome::IgnoredNotMentioned);
    }

    info!("Bot was mentioned by `{}` in `{}`.", message.author_id, message.channel_id);

    // Show that a reply is on its way; this is only a courtesy.

    if let Err(err) = chat.react_to_message(&message.channel_id, &message.ts, &config.pending_reaction).await {
        warn!("Failed to add pending reaction: {}", err);
    }

    let result = reply(message, llm, chat).await;

    if let Err(err) = chat.unreact_to_message(&message.channel_id, &message.ts, &config.pending_reaction).await {
        warn!("Failed to remove pending reaction: {}", err);
    }

    result
}

/// Sends the greeting or the generated reply, falling back to an apology.
async fn reply(message: &InboundMessage, llm: &LlmClient, chat: &ChatClient) -> Res<RelayOutcome> {
    let prompt = message.prompt_for(chat.bot_user_id());
    let thread_ts = message.reply_thread_ts();

    if prompt.is_empty() {
        chat.send_message(&message.channel_id, thread_ts, messages::GREETING).await?;
        return Ok(RelayOutcome::Greeted);
    }

    let sent = match generate_on_task(llm, prompt).await {
        Ok(text) => chat.send_message(&message.channel_id, thread_ts, &text).await,
        Err(err) => Err(err),
    };

    match sent {
        Ok(()) => Ok(RelayOutcome::Replied),
        Err(err) => {
            error!("Error during response generation: {}", err);

            chat.send_message(&message.channel_id, thread_ts, messages::PROCESSING_APOLOGY).await?;
            Ok(RelayOutcome::Apologized)
        }
    }
}

/// Runs the generation on its own task, so a slow model never holds up the caller's task.
async fn generate_on_task(llm: &LlmClient, prompt: String) -> Res<String> {
    let llm = llm.clone();

    let text = tokio::spawn(async move { llm.generate(&prompt).await }.in_current_span()).await?;

    Ok(text)
}
