// SPDX-License-Identifier: MIT

//! Markdown rendering of transcripts
//!
//! Converts transcript markdown into HTML for display. Rendering is pure;
//! the persisted file is always the markdown source, never the HTML.

use pulldown_cmark::{html, Options, Parser};

use crate::transcript::store::ChatId;

/// A transcript in both source and display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTranscript {
    /// Which chat this is
    pub chat_id: ChatId,
    /// Raw markdown source as read from disk
    pub markdown: String,
    /// HTML rendering of the source
    pub html: String,
}

impl RenderedTranscript {
    /// Render `markdown` for `chat_id`
    pub fn new(chat_id: ChatId, markdown: String) -> Self {
        let html = render_markdown(&markdown);
        Self {
            chat_id,
            markdown,
            html,
        }
    }
}

/// Render markdown source to HTML
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::empty());
    let mut html = String::with_capacity(source.len() * 2);
    html::push_html(&mut html, parser);
    html
}
