use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{Role, TokenUsage};

/// A single conversation turn.
///
/// Assistant messages are created empty and grown in place as stream chunks
/// arrive; the usage snapshot is attached once the stream's usage marker has
/// been decoded. Messages are never deleted individually, only bulk-cleared
/// with the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Monotonic identifier, derived from the unix-millisecond clock.
    pub id: u64,

    /// Who authored the message.
    pub role: Role,

    /// The visible message text.
    pub text: String,

    /// When the message was created.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,

    /// Token counts for the exchange that produced this message, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Message {
    /// Creates a new message with the given identity, role, and text.
    pub fn new(id: u64, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
            usage: None,
        }
    }
}
