// Public modules
pub mod chat;
pub mod files;
pub mod message;
pub mod role;
pub mod token_usage;

// Re-exports
pub use chat::{ChatRequest, ChatResponse};
pub use files::{FileInfo, ProcessRequest, ProcessResponse, UploadResponse, UploadResult, UploadedFile};
pub use message::Message;
pub use role::Role;
pub use token_usage::TokenUsage;
