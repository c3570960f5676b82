//! Chat application module for the gold investment assistant.
//!
//! # Architecture
//!
//! - [`controller`]: conversation state and message dispatch
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod controller;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DATA_DIR_NAME};
pub use controller::{
    ChatController, ConversationState, DEFAULT_GREETING, FALLBACK_REPLY, PendingTurn, TurnOutcome,
};
