//! Interactive chat application for the RAG backend.
//!
//! This binary provides a streaming REPL interface for chatting with the
//! backend, with file upload into the conversation context and running
//! token-usage totals.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! ragchat-chat
//!
//! # Point at a specific backend
//! ragchat-chat --base-url http://10.0.0.2:8000
//!
//! # Disable the per-character display pacing
//! ragchat-chat --pace 0
//!
//! # Disable colors (useful for piping output)
//! ragchat-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history and totals
//! - `/upload <file>` - Upload a document into context
//! - `/files` - List uploaded files
//! - `/remove <n>` - Remove an uploaded file
//! - `/pace <ms>` - Adjust display pacing
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::path::Path;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use ragchat::RagChat;
use ragchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};

/// Main entry point for the ragchat-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("ragchat-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = RagChat::with_options(config.base_url.clone(), Some(config.upload_timeout))?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    println!("RAG Chat ({})", session.stats().base_url);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Upload(path) => {
                            if let Err(err) = session.upload(Path::new(&path), &mut renderer).await
                            {
                                renderer.print_error(&format!("{}: {}", path, err));
                            }
                        }
                        ChatCommand::Files => {
                            print_files(&session);
                        }
                        ChatCommand::RemoveFile(index) => match session.remove_file(index) {
                            Some(file) => {
                                renderer.print_info(&format!("Removed {}", file.name));
                            }
                            None => {
                                renderer.print_error("No such file; see /files");
                            }
                        },
                        ChatCommand::Pace(pace_ms) => {
                            session.set_pace_ms(pace_ms);
                            if pace_ms == 0 {
                                renderer.print_info("Pacing disabled.");
                            } else {
                                renderer.print_info(&format!("Pace set to {pace_ms} ms/char."));
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - stream the response. Failures are
                // reported through the renderer and leave the session
                // usable.
                println!("Assistant:");
                let _ = session.send_streaming(line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Backend: {}", stats.base_url);
    println!("      Messages: {}", stats.message_count);
    println!("      Uploaded files: {}", stats.file_count);
    if stats.pace_ms == 0 {
        println!("      Pace: disabled");
    } else {
        println!("      Pace: {} ms/char", stats.pace_ms);
    }
    println!(
        "      Total tokens: {} in / {} out / {} total",
        stats.totals.input_tokens, stats.totals.output_tokens, stats.totals.total_tokens
    );
}

fn print_files(session: &ChatSession) {
    let files = session.files();
    if files.is_empty() {
        println!("    No files uploaded.");
        return;
    }
    println!("    Uploaded files:");
    for (index, file) in files.iter().enumerate() {
        println!(
            "      {}. {} ({} bytes, {})",
            index + 1,
            file.name,
            file.size,
            file.content_type
        );
    }
}
