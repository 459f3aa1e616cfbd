//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the
//! conversation store and drives streaming backend interactions, including
//! the file upload-to-context flow.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::chat::config::ChatConfig;
use crate::chat::history::Conversation;
use crate::client::RagChat;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::stream::StreamEvent;
use crate::types::{Role, TokenUsage, UploadedFile};

/// Fixed text that replaces a pending assistant message when its stream
/// fails. The rest of the conversation is left intact.
pub const RESPONSE_ERROR_TEXT: &str = "[Failed to get a response from the server]";

/// File extensions accepted for upload, matching the backend's allow list.
const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "doc", "txt"];

/// A chat session that manages conversation state and backend interactions.
///
/// One stream is in flight at a time; all state mutation happens on the
/// task driving that stream.
pub struct ChatSession {
    client: RagChat,
    config: ChatConfig,
    conversation: Conversation,
    files: Vec<UploadedFile>,
    loading: bool,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Running token totals across all completed exchanges.
    pub totals: TokenUsage,
    /// The number of uploaded files recorded in the session.
    pub file_count: usize,
    /// The per-character display delay in milliseconds.
    pub pace_ms: u64,
    /// The backend base URL in use.
    pub base_url: String,
}

impl ChatSession {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: RagChat, config: ChatConfig) -> Self {
        Self {
            client,
            config,
            conversation: Conversation::new(),
            files: Vec::new(),
            loading: false,
        }
    }

    /// Returns the conversation store.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the uploaded file records, oldest first.
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Returns true while a response stream is being consumed.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Sets the per-character display delay. 0 disables pacing.
    pub fn set_pace_ms(&mut self, pace_ms: u64) {
        self.config.pace_ms = pace_ms;
    }

    /// Clears the conversation history and token totals.
    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Removes one uploaded file record by position.
    pub fn remove_file(&mut self, index: usize) -> Option<UploadedFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.conversation.len(),
            totals: self.conversation.totals(),
            file_count: self.files.len(),
            pace_ms: self.config.pace_ms,
            base_url: self.client.base_url().to_string(),
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Appends the user message and an empty assistant message
    /// 2. Opens the streaming request
    /// 3. Applies text and usage events as they arrive, pacing the display
    /// 4. On any failure, replaces the assistant text with a fixed error
    ///    string and leaves the conversation otherwise intact
    ///
    /// The loading flag is cleared on every path once the stream ends.
    pub async fn send_streaming(
        &mut self,
        prompt: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        self.conversation.push(Role::User, prompt);
        let target = self.conversation.push(Role::Assistant, "");
        self.loading = true;

        let outcome = match self.client.chat_stream(prompt).await {
            Ok(stream) => self.consume_stream(target, stream, renderer).await,
            Err(err) => Err(err),
        };
        self.loading = false;

        if let Err(err) = &outcome {
            self.conversation.replace_text(target, RESPONSE_ERROR_TEXT);
            renderer.print_error(&err.to_string());
        }
        renderer.finish_response();
        outcome
    }

    /// Applies demultiplexed stream events to the target message.
    async fn consume_stream<S>(
        &mut self,
        target: u64,
        mut stream: S,
        renderer: &mut dyn Renderer,
    ) -> Result<()>
    where
        S: Stream<Item = Result<StreamEvent>> + Unpin,
    {
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Text(text) => {
                    self.apply_text(target, &text, renderer).await;
                }
                StreamEvent::Usage(usage) => {
                    self.conversation.attach_usage(target, usage);
                }
            }
        }
        Ok(())
    }

    /// Appends streamed text to the target message.
    ///
    /// With pacing disabled the whole chunk lands in one update; otherwise
    /// characters are applied one at a time with the configured delay.
    async fn apply_text(&mut self, target: u64, text: &str, renderer: &mut dyn Renderer) {
        if self.config.pace_ms == 0 {
            self.conversation.append_text(target, text);
            renderer.print_text(text);
            return;
        }
        let delay = Duration::from_millis(self.config.pace_ms);
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let piece = ch.encode_utf8(&mut buf);
            self.conversation.append_text(target, piece);
            renderer.print_text(piece);
            tokio::time::sleep(delay).await;
        }
    }

    /// Uploads a file, processes it into extracted text, records it, and
    /// forwards the text as a summarization prompt.
    ///
    /// Validation of extension and size happens before any network call.
    pub async fn upload(&mut self, path: &Path, renderer: &mut dyn Renderer) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::validation(
                    format!("Not a usable file name: {}", path.display()),
                    Some("path".to_string()),
                )
            })?;
        let content_type = validate_extension(&file_name)?;
        let size = std::fs::metadata(path)
            .map_err(|err| Error::io(format!("Cannot stat {}", path.display()), err))?
            .len();
        validate_size(&file_name, size, self.config.max_file_size)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("Cannot read {}", path.display()), err))?;
        let info = self.client.upload_file(&file_name, bytes, content_type).await?;
        let content = self
            .client
            .process_file(&info.file_path, self.config.chunk_size, self.config.return_best)
            .await?;

        self.files.push(UploadedFile {
            name: file_name.clone(),
            size,
            content_type: content_type.to_string(),
            content: content.clone(),
            file_path: info.file_path,
        });
        renderer.print_info(&format!("Uploaded {file_name} ({size} bytes)"));

        let prompt = summarize_prompt(&file_name, &content);
        self.send_streaming(&prompt, renderer).await
    }

    /// Uploads a batch of files.
    ///
    /// Failures are reported per file and do not abort the rest of the
    /// batch.
    pub async fn upload_many(&mut self, paths: &[PathBuf], renderer: &mut dyn Renderer) {
        for path in paths {
            if let Err(err) = self.upload(path, renderer).await {
                renderer.print_error(&format!("{}: {}", path.display(), err));
            }
        }
    }
}

/// Builds the synthesized prompt that asks the model to summarize an
/// uploaded document.
fn summarize_prompt(file_name: &str, content: &str) -> String {
    format!(
        "Please read the following content extracted from {file_name} and summarize its key points:\n\n{content}"
    )
}

/// Checks the file extension against the allow list and returns the MIME
/// type to send with the upload.
fn validate_extension(file_name: &str) -> Result<&'static str> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => Ok("application/pdf"),
        "docx" => Ok(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        "doc" => Ok("application/msword"),
        "txt" => Ok("text/plain"),
        _ => Err(Error::validation(
            format!(
                "File type not allowed: {file_name}. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
            Some("path".to_string()),
        )),
    }
}

/// Enforces the upload size cap before any network call.
fn validate_size(file_name: &str, size: u64, max_file_size: u64) -> Result<()> {
    if size > max_file_size {
        Err(Error::validation(
            format!(
                "File {file_name} too large: {size} bytes (maximum {max_file_size})"
            ),
            Some("size".to_string()),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    /// Renderer that records every call for assertions.
    #[derive(Default)]
    struct RecordingRenderer {
        texts: Vec<String>,
        errors: Vec<String>,
        infos: Vec<String>,
        finishes: usize,
    }

    impl Renderer for RecordingRenderer {
        fn print_text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, info: &str) {
            self.infos.push(info.to_string());
        }

        fn finish_response(&mut self) {
            self.finishes += 1;
        }
    }

    fn session_with_pace(pace_ms: u64) -> ChatSession {
        // Nothing listens on the discard port; tests that reach the
        // network expect a connection failure.
        let client = RagChat::new(Some("http://127.0.0.1:9/".to_string())).unwrap();
        let config = ChatConfig::new().with_pace_ms(pace_ms);
        ChatSession::new(client, config)
    }

    #[tokio::test]
    async fn pace_zero_applies_chunks_whole() {
        let mut session = session_with_pace(0);
        let target = session.conversation.push(Role::Assistant, "");
        let mut renderer = RecordingRenderer::default();

        let events = vec![
            Ok(StreamEvent::Text("Hello".to_string())),
            Ok(StreamEvent::Text(" world".to_string())),
            Ok(StreamEvent::Usage(TokenUsage::new(3, 5, 8))),
        ];
        session
            .consume_stream(target, stream::iter(events), &mut renderer)
            .await
            .unwrap();

        // One state update per chunk, not per character.
        assert_eq!(renderer.texts, vec!["Hello", " world"]);
        assert_eq!(session.conversation.messages()[0].text, "Hello world");
        assert_eq!(session.conversation.totals(), TokenUsage::new(3, 5, 8));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_applies_characters_one_by_one() {
        let mut session = session_with_pace(10);
        let target = session.conversation.push(Role::Assistant, "");
        let mut renderer = RecordingRenderer::default();

        let events = vec![Ok(StreamEvent::Text("héllo".to_string()))];
        session
            .consume_stream(target, stream::iter(events), &mut renderer)
            .await
            .unwrap();

        assert_eq!(renderer.texts, vec!["h", "é", "l", "l", "o"]);
        assert_eq!(session.conversation.messages()[0].text, "héllo");
    }

    #[tokio::test]
    async fn mid_stream_error_propagates() {
        let mut session = session_with_pace(0);
        let target = session.conversation.push(Role::Assistant, "");
        let mut renderer = RecordingRenderer::default();

        let events = vec![
            Ok(StreamEvent::Text("partial".to_string())),
            Err(Error::streaming("connection reset", None)),
        ];
        let outcome = session
            .consume_stream(target, stream::iter(events), &mut renderer)
            .await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn failed_request_leaves_error_message_and_clears_loading() {
        let mut session = session_with_pace(0);
        let mut renderer = RecordingRenderer::default();

        let outcome = session.send_streaming("hello", &mut renderer).await;
        assert!(outcome.is_err());
        assert!(!session.is_loading());

        let assistants: Vec<_> = session
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].text, RESPONSE_ERROR_TEXT);
        assert_eq!(renderer.errors.len(), 1);
        assert_eq!(renderer.finishes, 1);
    }

    #[test]
    fn extension_allow_list() {
        assert_eq!(validate_extension("notes.txt").unwrap(), "text/plain");
        assert_eq!(validate_extension("paper.PDF").unwrap(), "application/pdf");
        assert!(validate_extension("setup.exe").is_err());
        assert!(validate_extension("no_extension").is_err());
    }

    #[test]
    fn size_cap_enforced() {
        let cap = 10 * 1024 * 1024;
        assert!(validate_size("a.txt", 11 * 1024 * 1024, cap).is_err());
        assert!(validate_size("a.txt", cap, cap).is_ok());
    }

    #[tokio::test]
    async fn oversized_file_rejected_before_any_network_call() {
        // An unroutable client would error differently; a validation error
        // proves the request was never sent.
        let mut session = session_with_pace(0);
        let mut renderer = RecordingRenderer::default();

        let dir = std::env::temp_dir().join("ragchat-session-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("big.txt");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(11 * 1024 * 1024).unwrap();

        let err = session.upload(&path, &mut renderer).await.unwrap_err();
        assert!(err.is_validation());
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn exe_rejected_regardless_of_size() {
        let mut session = session_with_pace(0);
        let mut renderer = RecordingRenderer::default();

        let dir = std::env::temp_dir().join("ragchat-session-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tiny.exe");
        std::fs::write(&path, b"MZ").unwrap();

        let err = session.upload(&path, &mut renderer).await.unwrap_err();
        assert!(err.is_validation());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn clear_resets_conversation() {
        let mut session = session_with_pace(0);
        let id = session.conversation.push(Role::Assistant, "hi");
        session.conversation.attach_usage(id, TokenUsage::new(3, 5, 8));

        session.clear();
        assert!(session.conversation().is_empty());
        assert!(session.conversation().totals().is_zero());
    }

    #[test]
    fn remove_file_by_index() {
        let mut session = session_with_pace(0);
        session.files.push(UploadedFile {
            name: "a.txt".to_string(),
            size: 1,
            content_type: "text/plain".to_string(),
            content: "a".to_string(),
            file_path: "uploads/a.txt".to_string(),
        });
        assert!(session.remove_file(1).is_none());
        let removed = session.remove_file(0).unwrap();
        assert_eq!(removed.name, "a.txt");
        assert!(session.files().is_empty());
    }
}
