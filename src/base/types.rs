use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// A chat message as seen by the relay, independent of the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The user ID of the message author.
    pub author_id: String,
    /// The channel the message was posted in.
    pub channel_id: String,
    /// The platform's ID for this message (Slack calls it `ts`).
    pub ts: String,
    /// The thread root, if the message was posted in a thread.
    pub thread_ts: Option<String>,
    /// The raw message text, mention tokens included.
    pub text: String,
}

impl InboundMessage {
    /// The literal token the chat platform uses to mention `user_id`.
    pub fn mention_token(user_id: &str) -> String {
        format!("<@{user_id}>")
    }

    /// Whether this message mentions `user_id`.
    pub fn mentions(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.text.contains(&Self::mention_token(user_id))
    }

    /// The prompt for `user_id`: the text with every mention of `user_id` removed, trimmed.
    pub fn prompt_for(&self, user_id: &str) -> String {
        self.text.replace(&Self::mention_token(user_id), "").trim().to_string()
    }

    /// The thread a reply should go to (empty for a top-level reply).
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or_default()
    }
}

/// What the relay did with a single inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The bot authored the message itself.
    IgnoredOwnMessage,
    /// The message does not mention the bot.
    IgnoredNotMentioned,
    /// The prompt was empty, so the greeting was sent.
    Greeted,
    /// The generation result was sent.
    Replied,
    /// Something failed on the way and the processing apology was sent instead.
    Apologized,
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            author_id: "U54321".to_string(),
            channel_id: "C12345".to_string(),
            ts: "1234567890.123456".to_string(),
            thread_ts: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_mentions_detects_bot_token() {
        assert!(message("<@U12345> hello").mentions("U12345"));
        assert!(message("hey <@U12345>").mentions("U12345"));
        assert!(!message("hello U12345").mentions("U12345"));
        assert!(!message("<@U99999> hello").mentions("U12345"));
        assert!(!message("<@> hello").mentions(""));
    }

    #[test]
    fn test_prompt_for_strips_every_mention_and_trims() {
        assert_eq!(message("<@U12345> what is 2+2").prompt_for("U12345"), "what is 2+2");
        assert_eq!(message("  <@U12345>  ").prompt_for("U12345"), "");
        assert_eq!(message("<@U12345> ping <@U12345>").prompt_for("U12345"), "ping");
    }

    #[test]
    fn test_prompt_for_keeps_other_mentions() {
        assert_eq!(message("<@U12345> ask <@U777>").prompt_for("U12345"), "ask <@U777>");
    }

    #[test]
    fn test_prompt_for_keeps_labelled_mention_form() {
        // Only the bare `<@ID>` form is stripped.
        assert_eq!(message("<@U12345|relay> hi").prompt_for("U12345"), "<@U12345|relay> hi");
    }

    #[test]
    fn test_reply_thread_ts() {
        let mut m = message("<@U12345> hi");
        assert_eq!(m.reply_thread_ts(), "");

        m.thread_ts = Some("1111.2222".to_string());
        assert_eq!(m.reply_thread_ts(), "1111.2222");
    }
}
