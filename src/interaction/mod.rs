//! Event handling and user interactions for relay-bot.
//!
//! This module decides what to do with an incoming chat message:
//! - Ignoring the bot's own messages and messages that do not mention it
//! - Extracting the prompt from a mention
//! - Coordinating the reply between the LLM and chat services

pub mod mention;
