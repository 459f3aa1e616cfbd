//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the backend.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history and token totals.
    Clear,

    /// Upload a file into the conversation context.
    Upload(String),

    /// List uploaded files.
    Files,

    /// Remove one uploaded file by its list position.
    RemoveFile(usize),

    /// Set the per-character display delay in milliseconds (0 disables).
    Pace(u64),

    /// Display session statistics (message count, token totals, etc.).
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use ragchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/upload notes.txt").is_some());
/// assert!(parse_command("What is RAG?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "files" => ChatCommand::Files,
        "remove" => match argument {
            Some(arg) => match arg.parse::<usize>() {
                Ok(index) if index >= 1 => ChatCommand::RemoveFile(index - 1),
                _ => ChatCommand::Invalid(
                    "/remove expects a file number from /files".to_string(),
                ),
            },
            None => ChatCommand::Invalid("/remove requires a file number".to_string()),
        },
        "pace" => match argument {
            Some(arg) => match arg.parse::<u64>() {
                Ok(value) => ChatCommand::Pace(value),
                Err(_) => ChatCommand::Invalid(
                    "/pace expects a delay in milliseconds".to_string(),
                ),
            },
            None => ChatCommand::Invalid("/pace requires a value".to_string()),
        },
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history and token totals
  /upload <file>         Upload a document (.pdf, .docx, .doc, .txt) into context
  /files                 List uploaded files
  /remove <n>            Remove uploaded file number n
  /pace <ms>             Set per-character delay in ms (0 disables pacing)
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_upload() {
        assert_eq!(
            parse_command("/upload notes.txt"),
            Some(ChatCommand::Upload("notes.txt".to_string()))
        );
        assert_eq!(
            parse_command("/upload  reports/q3 summary.pdf "),
            Some(ChatCommand::Upload("reports/q3 summary.pdf".to_string()))
        );
        assert!(matches!(
            parse_command("/upload"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_remove() {
        assert_eq!(parse_command("/remove 1"), Some(ChatCommand::RemoveFile(0)));
        assert_eq!(parse_command("/remove 3"), Some(ChatCommand::RemoveFile(2)));
        assert!(matches!(
            parse_command("/remove 0"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/remove x"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_pace() {
        assert_eq!(parse_command("/pace 0"), Some(ChatCommand::Pace(0)));
        assert_eq!(parse_command("/pace 25"), Some(ChatCommand::Pace(25)));
        assert!(matches!(
            parse_command("/pace fast"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_stats_and_files() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/files"), Some(ChatCommand::Files));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/upload"));
        assert!(help.contains("/pace"));
    }
}
