// SPDX-License-Identifier: MIT

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for Parlor.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parlor - chat with local language models from your terminal
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(version, about = "Chat with local language models")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory scanned for GGUF model files (overrides settings)
    #[arg(long, global = true)]
    pub models_dir: Option<PathBuf>,

    /// Directory holding chat transcripts (overrides settings)
    #[arg(long, global = true)]
    pub chats_dir: Option<PathBuf>,

    /// Settings file path (default: ~/.parlor/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available model files
    Models,

    /// List chat transcripts
    Chats,

    /// Create a new chat
    New,

    /// Print a chat transcript
    Show(ShowArgs),

    /// Send a message in a chat and print the response
    Send(SendArgs),
}

/// Arguments for the show subcommand
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Chat to show (e.g. chat_1.md; the .md suffix may be omitted)
    pub chat: String,

    /// Print the rendered HTML instead of the markdown source
    #[arg(long)]
    pub html: bool,
}

/// Arguments for the send subcommand
#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Chat to send the message in
    pub chat: String,

    /// The message text
    pub message: String,

    /// Model file to load (e.g. tiny.gguf; required)
    #[arg(short, long)]
    pub model: String,

    /// Maximum number of tokens to generate (default from settings)
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_args() {
        let cli = Cli::parse_from([
            "parlor",
            "send",
            "chat_1.md",
            "hello there",
            "--model",
            "tiny.gguf",
            "--max-tokens",
            "256",
        ]);
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.chat, "chat_1.md");
                assert_eq!(args.message, "hello there");
                assert_eq!(args.model, "tiny.gguf");
                assert_eq!(args.max_tokens, Some(256));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_dir_overrides() {
        let cli = Cli::parse_from(["parlor", "--models-dir", "/opt/models", "models"]);
        assert_eq!(cli.models_dir, Some(PathBuf::from("/opt/models")));
    }
}
