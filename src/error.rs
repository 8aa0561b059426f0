// SPDX-License-Identifier: MIT

//! Error types for Parlor
//!
//! Every operation that can fail converts the underlying failure into one
//! of these variants at the boundary of the operation; no failure is fatal
//! to the process.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Parlor operations
#[derive(Error, Debug)]
pub enum ParlorError {
    /// A configured directory does not exist (reported for the models
    /// directory; the chats directory is auto-created instead)
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The inference backend failed to load a model file
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// A transcript file does not exist
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    /// A message was sent with no model loaded
    #[error("No model is loaded; load a model before sending a message")]
    NoModelLoaded,

    /// A message was sent for a chat that is not the current one
    #[error("No chat is selected; load or create a chat before sending a message")]
    NoChatSelected,

    /// The inference backend failed while generating a response
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Invalid input from the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transcript or settings file I/O errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Settings (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Parlor operations
pub type Result<T> = std::result::Result<T, ParlorError>;
