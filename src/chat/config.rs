//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary runs with.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::controller::DEFAULT_GREETING;

/// Name of the data directory created under the user's home directory.
pub const DATA_DIR_NAME: &str = ".aurum";

/// Command-line arguments for the aurum-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the backend API.
    #[arrrg(optional, "Backend base URL (default: $AURUM_API_URL or the hosted API)", "URL")]
    pub api_url: Option<String>,

    /// Directory holding the persisted session.
    #[arrrg(optional, "Directory for the persisted session (default: ~/.aurum)", "DIR")]
    pub data_dir: Option<String>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Per-request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Backend base URL; `None` defers to the environment and built-in default.
    pub api_url: Option<String>,

    /// Directory holding the persisted session.
    pub data_dir: PathBuf,

    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// The assistant message the conversation opens with.
    pub greeting: String,
}

impl ChatConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - API URL: resolved by the client
    /// - Data directory: `~/.aurum`
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: None,
            data_dir: default_data_dir(),
            timeout: None,
            use_color: true,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    /// Sets the backend base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the opening assistant message.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            api_url: args.api_url,
            data_dir: args
                .data_dir
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
            timeout: args.timeout_secs.map(Duration::from_secs),
            use_color: !args.no_color,
            ..ChatConfig::new()
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}
