//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat and upload behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

/// Default per-character display delay in milliseconds.
const DEFAULT_PACE_MS: u64 = 15;

/// Default text chunk size for document processing.
const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of best-matching segments requested.
const DEFAULT_RETURN_BEST: usize = 3;

/// Hard cap on upload size, matching the backend's limit.
const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default upload timeout in seconds.
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments for the ragchat-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: http://127.0.0.1:8000)", "URL")]
    pub base_url: Option<String>,

    /// Per-character display delay in milliseconds.
    #[arrrg(optional, "Per-character delay in ms, 0 disables pacing (default: 15)", "MS")]
    pub pace: Option<u64>,

    /// Upload timeout in seconds.
    #[arrrg(optional, "Upload timeout in seconds (default: 30)", "SECS")]
    pub upload_timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Backend base URL; None falls back to the environment or the
    /// client's localhost default.
    pub base_url: Option<String>,

    /// Per-character display delay in milliseconds. 0 disables pacing and
    /// applies whole chunks in one update.
    pub pace_ms: u64,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Text chunk size sent to the process endpoint.
    pub chunk_size: usize,

    /// Number of best-matching segments requested from the process
    /// endpoint.
    pub return_best: usize,

    /// Hard cap on upload size in bytes, enforced before any network call.
    pub max_file_size: u64,

    /// Client-side timeout that aborts a stuck upload.
    pub upload_timeout: Duration,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Pace: 15 ms per character
    /// - Chunk size: 1000, return_best: 3
    /// - Max upload size: 10 MB
    /// - Upload timeout: 30 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            pace_ms: DEFAULT_PACE_MS,
            use_color: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            return_best: DEFAULT_RETURN_BEST,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the per-character display delay.
    pub fn with_pace_ms(mut self, pace_ms: u64) -> Self {
        self.pace_ms = pace_ms;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the processing chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the number of best-matching segments requested.
    pub fn with_return_best(mut self, return_best: usize) -> Self {
        self.return_best = return_best;
        self
    }

    /// Sets the maximum upload size in bytes.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Sets the upload timeout.
    pub fn with_upload_timeout(mut self, upload_timeout: Duration) -> Self {
        self.upload_timeout = upload_timeout;
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
            base_url: args.base_url,
            pace_ms: args.pace.unwrap_or(DEFAULT_PACE_MS),
            use_color: !args.no_color,
            upload_timeout: Duration::from_secs(
                args.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
            ),
            ..ChatConfig::new()
        }
    }
}
