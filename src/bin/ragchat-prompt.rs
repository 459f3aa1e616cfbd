//! One-shot prompt tool for the RAG backend.
//!
//! Sends a single prompt through the non-streaming chat endpoint and
//! prints the complete response.
//!
//! # Usage
//!
//! ```bash
//! # Prompt from the command line
//! ragchat-prompt "What is in the uploaded report?"
//!
//! # Prompt from stdin
//! echo "Summarize the design" | ragchat-prompt
//!
//! # Point at a specific backend
//! ragchat-prompt --base-url http://10.0.0.2:8000 "hello"
//! ```

use std::io::Read;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use ragchat::RagChat;

/// Command-line arguments for the ragchat-prompt tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct PromptArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: http://127.0.0.1:8000)", "URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = PromptArgs::from_command_line_relaxed("ragchat-prompt [OPTIONS] [PROMPT]");

    let prompt = if free.is_empty() {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        free.join(" ")
    };
    let prompt = prompt.trim();
    if prompt.is_empty() {
        eprintln!("ragchat-prompt: no prompt provided");
        std::process::exit(1);
    }

    let client = RagChat::new(args.base_url)?;
    let response = client.chat(prompt).await?;
    println!("{}", response);
    Ok(())
}
