// SPDX-License-Identifier: MIT

//! Chat transcript persistence and rendering
//!
//! Each chat is a UTF-8 markdown file in the chats directory: a title
//! line followed by append-only `(User, Assistant)` turn pairs. Nothing
//! in the file is ever edited, reordered or deleted.

pub mod render;
pub mod store;

pub use render::{render_markdown, RenderedTranscript};
pub use store::{ChatId, TranscriptStore, TRANSCRIPT_EXTENSION};
