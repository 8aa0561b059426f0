// SPDX-License-Identifier: MIT

//! Transcript file store
//!
//! Owns the on-disk chat files. Every append is an atomic
//! open-append-close cycle, so a transcript is never held open across a
//! generation call and a user turn is flushed before generation starts.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ParlorError, Result};

/// File extension of chat transcripts
pub const TRANSCRIPT_EXTENSION: &str = "md";

/// Title block written to every new transcript
const TITLE_BLOCK: &str = "# New Chat\n\n";

/// Identifier of a chat; the transcript's file name (e.g. `chat_3.md`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatId(String);

impl ChatId {
    /// Wrap an existing transcript file name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The underlying file name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store for transcript files in a single directory
pub struct TranscriptStore {
    chats_dir: PathBuf,
}

impl TranscriptStore {
    /// Create a store over `chats_dir`; the directory is created lazily
    pub fn new(chats_dir: impl Into<PathBuf>) -> Self {
        Self {
            chats_dir: chats_dir.into(),
        }
    }

    /// The directory holding the transcripts
    pub fn chats_dir(&self) -> &Path {
        &self.chats_dir
    }

    /// Full path of a chat's transcript file
    pub fn path_for(&self, chat_id: &ChatId) -> PathBuf {
        self.chats_dir.join(chat_id.as_str())
    }

    /// List transcripts, creating the directory if it does not exist yet.
    ///
    /// Absence of the directory is expected on first run, not an error.
    /// Ordering is numeric-aware so `chat_10` follows `chat_9`.
    pub fn list_chats(&self) -> Result<Vec<ChatId>> {
        if !self.chats_dir.is_dir() {
            tracing::debug!(dir = %self.chats_dir.display(), "creating chats directory");
            std::fs::create_dir_all(&self.chats_dir)?;
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.chats_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TRANSCRIPT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort_by_key(|name| numeric_sort_key(name));
        Ok(names.into_iter().map(ChatId::new).collect())
    }

    /// Create a new transcript containing only the title block.
    ///
    /// The id is `chat_<n>.md` with `n` starting at the current file count
    /// plus one and bumped until the name is free, so ids stay compatible
    /// with existing transcripts while never clobbering one.
    pub fn create_chat(&self) -> Result<ChatId> {
        let count = self.list_chats()?.len();
        let mut n = count + 1;
        let mut path = self.chats_dir.join(format!("chat_{}.md", n));
        while path.exists() {
            n += 1;
            path = self.chats_dir.join(format!("chat_{}.md", n));
        }

        std::fs::write(&path, TITLE_BLOCK)?;
        let chat_id = ChatId::new(format!("chat_{}.md", n));
        tracing::info!(chat = %chat_id, "created chat");
        Ok(chat_id)
    }

    /// Read a transcript's full markdown source
    pub fn read(&self, chat_id: &ChatId) -> Result<String> {
        let path = self.path_for(chat_id);
        if !path.is_file() {
            return Err(ParlorError::ChatNotFound(chat_id.as_str().to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// Whether a transcript file exists for `chat_id`
    pub fn exists(&self, chat_id: &ChatId) -> bool {
        self.path_for(chat_id).is_file()
    }

    /// Append a user turn as its own markdown block
    pub fn append_user_turn(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        self.append(chat_id, &format!("\n\n**User:** {}\n\n", text))
    }

    /// Append an assistant turn as its own markdown block
    pub fn append_assistant_turn(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        self.append(chat_id, &format!("**Assistant:**\n {}\n\n", text))
    }

    /// One open-append-close cycle; the file is closed before returning
    fn append(&self, chat_id: &ChatId, block: &str) -> Result<()> {
        let path = self.path_for(chat_id);
        if !path.is_file() {
            return Err(ParlorError::ChatNotFound(chat_id.as_str().to_string()));
        }
        let mut file = OpenOptions::new().append(true).open(path)?;
        file.write_all(block.as_bytes())?;
        Ok(())
    }
}

/// Sort key putting `chat_10` after `chat_9` while keeping other names
/// in lexicographic order
fn numeric_sort_key(name: &str) -> (String, u64) {
    let stem = name.strip_suffix(".md").unwrap_or(name);
    if let Some((prefix, digits)) = stem.rsplit_once('_') {
        if let Ok(n) = digits.parse::<u64>() {
            return (prefix.to_string(), n);
        }
    }
    (stem.to_string(), 0)
}
