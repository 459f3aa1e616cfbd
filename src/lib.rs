// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod stream;
pub mod types;
pub mod utils;

// Re-exports
pub use client::RagChat;
pub use error::{Error, Result};
pub use stream::{StreamEvent, USAGE_CLOSE, USAGE_OPEN};
pub use types::*;
