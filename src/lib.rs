// SPDX-License-Identifier: MIT

//! Parlor - local language-model chat with persisted markdown transcripts.
//!
//! This crate exposes the shared core used by the `parlor` CLI
//! (`src/main.rs`) and by any GUI shell built on top of it.
//!
//! Architecture highlights:
//! - `registry`: model-file discovery and the single active-model slot
//! - `chat`: the chat manager tying transcripts to the active model
//! - `transcript`: append-only markdown transcript files and rendering
//! - `llm`: inference backend abstraction (llama.cpp or mock)
//! - `config`: settings loaded from `~/.parlor/settings.json`

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod registry;
pub mod transcript;

pub use error::{ParlorError, Result};
