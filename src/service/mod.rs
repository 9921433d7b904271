//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the relay-bot:
//! - Chat services (e.g., Slack)
//! - LLM services (e.g., Ollama)
//! - The liveness endpoint for process supervisors
//!
//! The chat and LLM services define both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod health;
pub mod llm;
