//! Chat service integration for relay-bot.
//!
//! This module provides the Slack implementation of `GenericChatClient`:
//! - Authenticating the bot token and learning the bot's user ID
//! - Receiving mentions over socket mode
//! - Sending messages and reactions
//!
//! Incoming events are converted to `InboundMessage`s and handed to the relay.

use crate::{
    base::{
        config::Config,
        types::{InboundMessage, Res, Void},
    },
    interaction,
    service::llm::LlmClient,
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    ///
    /// Fails if Slack rejects the bot token.
    pub async fn slack(config: &Config, llm: LlmClient) -> Res<Self> {
        let client = SlackChatClient::new(config, llm).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    config: Config,
    llm: LlmClient,
    chat: ChatClient,
}

/// Slack client implementation.
#[derive(Clone)]
pub struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub bot_user_id: String,
    pub client: Arc<FullClient>,
    pub config: Config,
    pub llm: LlmClient,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, llm: LlmClient) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID; this is also where a rejected token shows up.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await.map_err(|e| anyhow::anyhow!("Slack rejected the bot token: {}", e))?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
            config: config.clone(),
            llm,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            config: self.config.clone(),
            llm: self.llm.clone(),
            chat: ChatClient::from(self.clone()),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        info!("Listening for Slack events ...");

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let mut request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message).with_link_names(true);

        if !thread_ts.is_empty() {
            request = request.with_thread_ts(SlackTs(thread_ts.to_string()));
        }

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, channel_id: &str, ts: &str, emoji: &str) -> Void {
        let request = SlackApiReactionsAddRequest {
            channel: SlackChannelId(channel_id.to_string()),
            name: SlackReactionName(emoji.to_string()),
            timestamp: SlackTs(ts.to_string()),
        };

        let session = self.client.open_session(&self.bot_token);

        let _ = session.reactions_add(&request).await.map_err(|e| anyhow::anyhow!("Failed to react to message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn unreact_to_message(&self, channel_id: &str, ts: &str, emoji: &str) -> Void {
        let request = SlackApiReactionsRemoveRequest::new(SlackReactionName(emoji.to_string()))
            .with_channel(SlackChannelId(channel_id.to_string()))
            .with_timestamp(SlackTs(ts.to_string()));

        let session = self.client.open_session(&self.bot_token);

        let _ = session.reactions_remove(&request).await.map_err(|e| anyhow::anyhow!("Failed to remove reaction: {}", e))?;

        Ok(())
    }
}

// Event conversion.

/// Converts an `app_mention` event.
fn inbound_from_app_mention(event: SlackAppMentionEvent) -> InboundMessage {
    InboundMessage {
        author_id: event.user.0,
        channel_id: event.channel.0,
        ts: event.origin.ts.0,
        thread_ts: event.origin.thread_ts.map(|t| t.0),
        text: event.content.text.unwrap_or_default(),
    }
}

/// Converts a `message` event, if it is a plain direct message from a human.
///
/// Channel messages are skipped: mentions there arrive as `app_mention` events.
fn inbound_from_message(event: SlackMessageEvent) -> Option<InboundMessage> {
    let channel_type = event.origin.channel_type.as_ref().map(|t| t.0.as_str());

    if !is_relayable_message(channel_type, event.subtype.is_some(), event.sender.bot_id.is_some()) {
        return None;
    }

    Some(InboundMessage {
        author_id: event.sender.user?.0,
        channel_id: event.origin.channel?.0,
        ts: event.origin.ts.0,
        thread_ts: event.origin.thread_ts.map(|t| t.0),
        text: event.content.and_then(|c| c.text).unwrap_or_default(),
    })
}

/// Only plain, human-authored direct messages are relayed from `message` events.
fn is_relayable_message(channel_type: Option<&str>, has_subtype: bool, from_bot: bool) -> bool {
    channel_type == Some("im") && !has_subtype && !from_bot
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    let message = match event {
        SlackEventCallbackBody::AppMention(slack_app_mention_event) => {
            info!("Received app mention event ...");
            inbound_from_app_mention(slack_app_mention_event)
        }
        SlackEventCallbackBody::Message(slack_message_event) => match inbound_from_message(slack_message_event) {
            Some(message) => {
                info!("Received direct message event ...");
                message
            }
            None => {
                debug!("Skipping message event that is not a direct message.");
                return Ok(());
            }
        },
        _ => {
            warn!("Received unhandled push event.");
            return Ok(());
        }
    };

    interaction::mention::handle_mention(message, user_state.config.clone(), user_state.llm.clone(), user_state.chat.clone());

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_inbound_from_app_mention() {
        let event: SlackAppMentionEvent = serde_json::from_value(json!({
            "type": "app_mention",
            "user": "U54321",
            "text": "<@U12345> what is 2+2",
            "ts": "1234567890.123456",
            "thread_ts": "1234567890.000001",
            "channel": "C01TEST",
            "event_ts": "1234567890.123456",
        }))
        .unwrap();

        let message = inbound_from_app_mention(event);

        assert_eq!(message.author_id, "U54321");
        assert_eq!(message.channel_id, "C01TEST");
        assert_eq!(message.ts, "1234567890.123456");
        assert_eq!(message.thread_ts.as_deref(), Some("1234567890.000001"));
        assert_eq!(message.text, "<@U12345> what is 2+2");
    }

    #[test]
    fn test_inbound_from_direct_message() {
        let event: SlackMessageEvent = serde_json::from_value(json!({
            "type": "message",
            "user": "U54321",
            "text": "<@U12345> hello",
            "ts": "1234567890.222222",
            "channel": "D01DIRECT",
            "channel_type": "im",
            "event_ts": "1234567890.222222",
        }))
        .unwrap();

        let message = inbound_from_message(event).unwrap();

        assert_eq!(message.author_id, "U54321");
        assert_eq!(message.channel_id, "D01DIRECT");
        assert_eq!(message.ts, "1234567890.222222");
        assert_eq!(message.thread_ts, None);
        assert_eq!(message.text, "<@U12345> hello");
    }

    #[test]
    fn test_inbound_from_channel_message_is_skipped() {
        let event: SlackMessageEvent = serde_json::from_value(json!({
            "type": "message",
            "user": "U54321",
            "text": "<@U12345> hello",
            "ts": "1234567890.333333",
            "channel": "C01TEST",
            "channel_type": "channel",
            "event_ts": "1234567890.333333",
        }))
        .unwrap();

        assert_eq!(inbound_from_message(event), None);
    }

    #[test]
    fn test_is_relayable_message_only_plain_direct_messages() {
        assert!(is_relayable_message(Some("im"), false, false));

        assert!(!is_relayable_message(Some("channel"), false, false));
        assert!(!is_relayable_message(Some("group"), false, false));
        assert!(!is_relayable_message(None, false, false));
        assert!(!is_relayable_message(Some("im"), true, false));
        assert!(!is_relayable_message(Some("im"), false, true));
    }
}
