// SPDX-License-Identifier: MIT

//! Parlor - chat with local language models from your terminal
//!
//! Entry point for the Parlor CLI. The CLI is a thin shell over the
//! [`ChatManager`]; every failure is reported on stderr with a nonzero
//! exit, never a crash.

use clap::Parser;

use parlor::chat::ChatManager;
use parlor::cli::{Cli, Commands, SendArgs, ShowArgs};
use parlor::config::Settings;
use parlor::error::{ParlorError, Result};
use parlor::llm::default_loader;
use parlor::transcript::ChatId;

fn main() {
    let cli = Cli::parse();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { "trace" } else { "debug" };
        if let Ok(directive) = format!("parlor={}", level).parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.models_dir {
        settings.models_dir = dir;
    }
    if let Some(dir) = cli.chats_dir {
        settings.chats_dir = dir;
    }

    let loader = default_loader(&settings.generation)?;
    let mut manager = ChatManager::with_settings(&settings, loader);

    match cli.command {
        Commands::Models => run_models(&manager),
        Commands::Chats => run_chats(&manager),
        Commands::New => run_new(&mut manager),
        Commands::Show(args) => run_show(&mut manager, args),
        Commands::Send(args) => run_send(&mut manager, args, &settings),
    }
}

fn run_models(manager: &ChatManager) -> Result<()> {
    let models = match manager.list_models() {
        Ok(models) => models,
        // A missing models directory is reported but not fatal; the user
        // just sees an empty list.
        Err(ParlorError::DirectoryNotFound(dir)) => {
            eprintln!("Models directory not found: {}", dir.display());
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    if models.is_empty() {
        println!("No model files found.");
    }
    for model in models {
        println!("{}", model.name);
    }
    Ok(())
}

fn run_chats(manager: &ChatManager) -> Result<()> {
    let chats = manager.list_chats()?;
    if chats.is_empty() {
        println!("No chats yet. Create one with `parlor new`.");
    }
    for chat in chats {
        println!("{}", chat);
    }
    Ok(())
}

fn run_new(manager: &mut ChatManager) -> Result<()> {
    let chat_id = manager.create_chat()?;
    println!("{}", chat_id);
    Ok(())
}

fn run_show(manager: &mut ChatManager, args: ShowArgs) -> Result<()> {
    let chat_id = normalize_chat_name(&args.chat);
    let rendered = manager.load_chat(&chat_id)?;
    if args.html {
        println!("{}", rendered.html);
    } else {
        println!("{}", rendered.markdown);
    }
    Ok(())
}

fn run_send(manager: &mut ChatManager, args: SendArgs, settings: &Settings) -> Result<()> {
    let descriptor = manager
        .list_models()?
        .into_iter()
        .find(|m| m.name == args.model || m.name == format!("{}.gguf", args.model))
        .ok_or_else(|| {
            ParlorError::ModelLoad(format!("No model file named '{}'", args.model))
        })?;
    manager.load_model(&descriptor)?;

    let chat_id = normalize_chat_name(&args.chat);
    manager.load_chat(&chat_id)?;

    let max_tokens = args.max_tokens.unwrap_or(settings.generation.max_tokens);
    let rendered = manager.send_message(&chat_id, &args.message, max_tokens)?;

    match last_assistant_reply(&rendered.markdown) {
        Some(reply) => println!("{}", reply.trim()),
        None => println!("{}", rendered.markdown),
    }
    Ok(())
}

/// Accept chat names with or without the .md suffix
fn normalize_chat_name(name: &str) -> ChatId {
    if name.ends_with(".md") {
        ChatId::new(name)
    } else {
        ChatId::new(format!("{}.md", name))
    }
}

/// The text of the last assistant block, if any
fn last_assistant_reply(markdown: &str) -> Option<&str> {
    const LABEL: &str = "**Assistant:**\n";
    let start = markdown.rfind(LABEL)? + LABEL.len();
    Some(&markdown[start..])
}
