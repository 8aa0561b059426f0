// SPDX-License-Identifier: MIT

//! Chat Session & Transcript Manager
//!
//! Ties conversations to their on-disk transcripts and drives the active
//! model to produce responses. All state lives in an explicit
//! [`ChatManager`] context object so independent instances can coexist
//! (one per test, one per window).
//!
//! Ordering contract for `send_message`: the user turn is appended to the
//! transcript before generation starts, so the user's input survives a
//! generation failure. The assistant turn is appended only on success.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{ParlorError, Result};
use crate::llm::backend::{with_session, ModelLoader};
use crate::registry::{ModelDescriptor, ModelRegistry};
use crate::transcript::{ChatId, RenderedTranscript, TranscriptStore};

/// Explicit context object owning the active-model slot, the transcript
/// store and the current-chat selection
pub struct ChatManager {
    registry: ModelRegistry,
    store: TranscriptStore,
    models_dir: PathBuf,
    current_chat: Option<ChatId>,
    /// Generation of the model the current chat's session is bound to.
    /// `None` is the sessionless state (no chat selected or no model
    /// active); a value older than the registry's active generation
    /// marks the session stale, and the next access rebinds it.
    bound_generation: Option<u64>,
}

impl ChatManager {
    /// Create a manager over explicit directories
    pub fn new(
        models_dir: impl Into<PathBuf>,
        chats_dir: impl Into<PathBuf>,
        loader: Box<dyn ModelLoader>,
    ) -> Self {
        Self {
            registry: ModelRegistry::new(loader),
            store: TranscriptStore::new(chats_dir),
            models_dir: models_dir.into(),
            current_chat: None,
            bound_generation: None,
        }
    }

    /// Create a manager from settings
    pub fn with_settings(settings: &Settings, loader: Box<dyn ModelLoader>) -> Self {
        Self::new(&settings.models_dir, &settings.chats_dir, loader)
    }

    /// List model files in the configured models directory
    pub fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        self.registry.list_models(&self.models_dir)
    }

    /// Load a model, releasing any previously loaded one.
    ///
    /// Any session bound to the previous model is invalidated; the next
    /// chat access binds a fresh one.
    pub fn load_model(&mut self, descriptor: &ModelDescriptor) -> Result<()> {
        self.bound_generation = None;
        self.registry.load_model(descriptor)?;
        if self.current_chat.is_some() {
            self.bind_session();
        }
        Ok(())
    }

    /// Release the active model; the current chat stays loaded but
    /// sessionless. Idempotent.
    pub fn eject_model(&mut self) {
        self.registry.eject_model();
        self.bound_generation = None;
    }

    /// The currently loaded model, if any
    pub fn active_model(&self) -> Option<&ModelDescriptor> {
        self.registry.active().map(|a| &a.descriptor)
    }

    /// The currently selected chat, if any
    pub fn current_chat(&self) -> Option<&ChatId> {
        self.current_chat.as_ref()
    }

    /// List chat transcripts, creating the chats directory on first run
    pub fn list_chats(&self) -> Result<Vec<ChatId>> {
        self.store.list_chats()
    }

    /// Create a new chat and leave it selected
    pub fn create_chat(&mut self) -> Result<ChatId> {
        let chat_id = self.store.create_chat()?;
        self.current_chat = Some(chat_id.clone());
        self.bind_session();
        Ok(chat_id)
    }

    /// Load a chat: read and render its transcript, select it, and if a
    /// model is active bind a fresh session (discarding any prior one)
    pub fn load_chat(&mut self, chat_id: &ChatId) -> Result<RenderedTranscript> {
        let markdown = self.store.read(chat_id)?;
        self.current_chat = Some(chat_id.clone());
        self.bind_session();
        Ok(RenderedTranscript::new(chat_id.clone(), markdown))
    }

    /// Send a user message in `chat_id` and return the updated transcript.
    ///
    /// Preconditions: a model must be loaded and `chat_id` must be the
    /// selected chat. Blank input (after trimming) is a silent no-op that
    /// returns the transcript unchanged. The user turn is persisted before
    /// generation; on generation failure it stays and no assistant turn is
    /// written.
    pub fn send_message(
        &mut self,
        chat_id: &ChatId,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<RenderedTranscript> {
        if self.registry.active().is_none() {
            return Err(ParlorError::NoModelLoaded);
        }
        if self.current_chat.as_ref() != Some(chat_id) {
            return Err(ParlorError::NoChatSelected);
        }
        if user_text.trim().is_empty() {
            let markdown = self.store.read(chat_id)?;
            return Ok(RenderedTranscript::new(chat_id.clone(), markdown));
        }
        if max_tokens == 0 {
            return Err(ParlorError::InvalidInput(
                "max_tokens must be positive".to_string(),
            ));
        }

        self.store.append_user_turn(chat_id, user_text)?;

        // The binding may be stale if the model was reloaded since the
        // chat was opened; rebind transparently rather than reject.
        self.bind_session();

        let active = self
            .registry
            .active()
            .ok_or(ParlorError::NoModelLoaded)?;
        tracing::debug!(
            chat = %chat_id,
            model = %active.descriptor.name,
            max_tokens,
            "generating response"
        );
        let response = with_session(active.handle.as_ref(), |session| {
            session.generate(user_text, max_tokens)
        })?;

        self.store.append_assistant_turn(chat_id, &response)?;

        let markdown = self.store.read(chat_id)?;
        Ok(RenderedTranscript::new(chat_id.clone(), markdown))
    }

    /// Whether the current chat is bound to the active model (the
    /// `withSession` state); false while sessionless
    pub fn has_session(&self) -> bool {
        self.bound_generation.is_some()
            && self.bound_generation == self.registry.active_generation()
    }

    /// Bind (or rebind) the current chat to the active model's generation.
    /// Without an active model the chat stays loaded but sessionless.
    fn bind_session(&mut self) {
        match self.registry.active_generation() {
            Some(generation) => {
                if self.bound_generation.is_some_and(|bound| bound != generation) {
                    tracing::debug!(generation, "rebinding chat session to reloaded model");
                }
                self.bound_generation = Some(generation);
            }
            None => self.bound_generation = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLoader;
    use tempfile::TempDir;

    fn manager_with(loader: MockLoader, temp_dir: &TempDir) -> ChatManager {
        let models_dir = temp_dir.path().join("MODELS");
        std::fs::create_dir_all(&models_dir).unwrap();
        ChatManager::new(
            models_dir,
            temp_dir.path().join("Chat_Data"),
            Box::new(loader),
        )
    }

    fn add_model(temp_dir: &TempDir, name: &str) -> ModelDescriptor {
        let path = temp_dir.path().join("MODELS").join(name);
        std::fs::write(&path, b"").unwrap();
        ModelDescriptor {
            name: name.to_string(),
            file_path: path,
        }
    }

    #[test]
    fn test_send_without_model_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);
        let chat_id = manager.create_chat().unwrap();

        let before = manager.load_chat(&chat_id).unwrap().markdown;
        let err = manager.send_message(&chat_id, "hello", 100).unwrap_err();
        assert!(matches!(err, ParlorError::NoModelLoaded));

        let after = manager.load_chat(&chat_id).unwrap().markdown;
        assert_eq!(before, after);
    }

    #[test]
    fn test_send_for_unselected_chat_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();

        let first = manager.create_chat().unwrap();
        let second = manager.create_chat().unwrap();
        assert_eq!(manager.current_chat(), Some(&second));

        let err = manager.send_message(&first, "hello", 100).unwrap_err();
        assert!(matches!(err, ParlorError::NoChatSelected));
    }

    #[test]
    fn test_blank_input_is_a_silent_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        let before = manager.load_chat(&chat_id).unwrap().markdown;
        let rendered = manager.send_message(&chat_id, "   \n\t ", 100).unwrap();
        assert_eq!(rendered.markdown, before);
    }

    #[test]
    fn test_zero_max_tokens_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        let err = manager.send_message(&chat_id, "hello", 0).unwrap_err();
        assert!(matches!(err, ParlorError::InvalidInput(_)));
    }

    #[test]
    fn test_send_appends_user_then_assistant() {
        let temp_dir = TempDir::new().unwrap();
        let loader = MockLoader::with_responses(vec!["the answer".to_string()]);
        let mut manager = manager_with(loader, &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        let rendered = manager.send_message(&chat_id, "a question", 100).unwrap();
        assert_eq!(
            rendered.markdown,
            "# New Chat\n\n\n\n**User:** a question\n\n**Assistant:**\n the answer\n\n"
        );
    }

    #[test]
    fn test_generation_failure_keeps_user_turn_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::failing_generation("oom"), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        let err = manager.send_message(&chat_id, "hello", 100).unwrap_err();
        assert!(matches!(err, ParlorError::Generation(_)));

        let content = manager.load_chat(&chat_id).unwrap().markdown;
        assert!(content.contains("**User:** hello"));
        assert!(!content.contains("**Assistant:**"));
    }

    #[test]
    fn test_create_then_load_renders_title_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);

        let chat_id = manager.create_chat().unwrap();
        let rendered = manager.load_chat(&chat_id).unwrap();
        assert_eq!(rendered.markdown, "# New Chat\n\n");
        assert_eq!(
            rendered.html,
            crate::transcript::render_markdown("# New Chat\n\n")
        );
    }

    #[test]
    fn test_reload_rebinds_session_transparently() {
        let temp_dir = TempDir::new().unwrap();
        let loader = MockLoader::echo();
        let mut manager = manager_with(loader.clone(), &temp_dir);
        let first = add_model(&temp_dir, "first.gguf");
        let second = add_model(&temp_dir, "second.gguf");

        manager.load_model(&first).unwrap();
        let chat_id = manager.create_chat().unwrap();
        manager.send_message(&chat_id, "one", 100).unwrap();

        // Reload with a different model; the stale binding is replaced on
        // the next send and the new model serves it.
        manager.load_model(&second).unwrap();
        manager.send_message(&chat_id, "two", 100).unwrap();

        assert_eq!(manager.active_model().unwrap().name, "second.gguf");
        let prompts = loader.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].model_name, "first");
        assert_eq!(prompts[1].model_name, "second");
    }

    #[test]
    fn test_eject_leaves_chat_loaded_but_sessionless() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        manager.eject_model();
        assert_eq!(manager.current_chat(), Some(&chat_id));
        let err = manager.send_message(&chat_id, "hello", 100).unwrap_err();
        assert!(matches!(err, ParlorError::NoModelLoaded));
    }

    #[test]
    fn test_session_binding_follows_model_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);
        let first = add_model(&temp_dir, "first.gguf");
        let second = add_model(&temp_dir, "second.gguf");

        // No chat, no model: nothing to bind.
        assert!(!manager.has_session());

        // Chat without a model stays sessionless.
        let chat_id = manager.create_chat().unwrap();
        assert!(!manager.has_session());

        // A model becoming active while the chat is loaded binds it.
        manager.load_model(&first).unwrap();
        assert!(manager.has_session());

        // Reload binds to the new generation, eject unbinds.
        manager.load_model(&second).unwrap();
        assert!(manager.has_session());
        manager.eject_model();
        assert!(!manager.has_session());

        // Reopening the chat with a model active binds again.
        manager.load_model(&first).unwrap();
        manager.load_chat(&chat_id).unwrap();
        assert!(manager.has_session());
    }

    #[test]
    fn test_load_chat_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager_with(MockLoader::echo(), &temp_dir);

        let err = manager.load_chat(&ChatId::new("chat_404.md")).unwrap_err();
        assert!(matches!(err, ParlorError::ChatNotFound(_)));
    }

    #[test]
    fn test_each_send_opens_a_fresh_session_scope() {
        let temp_dir = TempDir::new().unwrap();
        let loader = MockLoader::echo();
        let mut manager = manager_with(loader.clone(), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        manager.send_message(&chat_id, "one", 100).unwrap();
        manager.send_message(&chat_id, "two", 100).unwrap();
        assert_eq!(loader.sessions_opened(), 2);
    }

    #[test]
    fn test_max_tokens_bound_reaches_backend() {
        let temp_dir = TempDir::new().unwrap();
        let loader = MockLoader::echo();
        let mut manager = manager_with(loader.clone(), &temp_dir);
        let descriptor = add_model(&temp_dir, "tiny.gguf");
        manager.load_model(&descriptor).unwrap();
        let chat_id = manager.create_chat().unwrap();

        manager.send_message(&chat_id, "hello", 321).unwrap();
        assert_eq!(loader.last_prompt().unwrap().max_tokens, 321);
    }
}
