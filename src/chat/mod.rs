//! Chat application module for interactive conversations with the RAG
//! backend.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! ragchat client library. It supports:
//!
//! - Streaming responses with paced, per-character display
//! - Running token-usage totals decoded from the in-band usage marker
//! - File upload into the conversation context
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`history`]: the append-only conversation store
//! - [`session`]: session management and streaming interaction
//! - [`commands`]: slash command parsing and handling

mod commands;
mod config;
mod history;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use history::Conversation;
pub use session::{ChatSession, RESPONSE_ERROR_TEXT, SessionStats};
