// SPDX-License-Identifier: MIT

//! Mock inference backend for testing
//!
//! Provides a configurable mock implementation of the backend traits that
//! can be used in unit tests without loading a real model.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{ParlorError, Result};
use crate::llm::backend::{InferenceSession, ModelHandle, ModelLoader};

/// How the mock produces responses
#[derive(Clone, Debug)]
enum MockBehavior {
    /// Return the prompt unchanged
    Echo,
    /// Return queued responses in order, sticking at the last one
    Scripted(Vec<String>),
    /// Fail every generation with this message
    FailGeneration(String),
}

/// A recorded generation request
#[derive(Clone, Debug)]
pub struct RecordedPrompt {
    /// The prompt text passed to `generate`
    pub prompt: String,
    /// The token bound passed to `generate`
    pub max_tokens: u32,
    /// Which model handle served the request
    pub model_name: String,
}

#[derive(Default)]
struct MockState {
    prompts: Mutex<Vec<RecordedPrompt>>,
    loads: AtomicUsize,
    sessions: AtomicUsize,
    generations: AtomicUsize,
}

/// A mock model loader for testing
#[derive(Clone)]
pub struct MockLoader {
    behavior: MockBehavior,
    fail_load: Option<String>,
    state: Arc<MockState>,
}

impl MockLoader {
    /// A loader whose models echo the prompt back
    pub fn echo() -> Self {
        Self::with_behavior(MockBehavior::Echo)
    }

    /// A loader whose models return `texts` in order (last one repeats)
    pub fn with_responses(texts: Vec<String>) -> Self {
        Self::with_behavior(MockBehavior::Scripted(texts))
    }

    /// A loader whose models fail every generation
    pub fn failing_generation(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::FailGeneration(message.into()))
    }

    /// A loader that refuses to load any model
    pub fn failing_load(message: impl Into<String>) -> Self {
        let mut loader = Self::echo();
        loader.fail_load = Some(message.into());
        loader
    }

    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            fail_load: None,
            state: Arc::new(MockState::default()),
        }
    }

    /// Number of successful `load` calls
    pub fn loads_performed(&self) -> usize {
        self.state.loads.load(Ordering::SeqCst)
    }

    /// Number of sessions opened across all handles
    pub fn sessions_opened(&self) -> usize {
        self.state.sessions.load(Ordering::SeqCst)
    }

    /// Number of `generate` calls across all sessions
    pub fn generations_performed(&self) -> usize {
        self.state.generations.load(Ordering::SeqCst)
    }

    /// All recorded generation requests, in order
    pub fn recorded_prompts(&self) -> Vec<RecordedPrompt> {
        self.state.prompts.lock().unwrap().clone()
    }

    /// The last recorded generation request
    pub fn last_prompt(&self) -> Option<RecordedPrompt> {
        self.state.prompts.lock().unwrap().last().cloned()
    }
}

impl ModelLoader for MockLoader {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&self, path: &Path) -> Result<Box<dyn ModelHandle>> {
        if let Some(ref message) = self.fail_load {
            return Err(ParlorError::ModelLoad(message.clone()));
        }
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mock-model")
            .to_string();
        self.state.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockModel {
            model_name,
            behavior: self.behavior.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockModel {
    model_name: String,
    behavior: MockBehavior,
    state: Arc<MockState>,
}

impl ModelHandle for MockModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn open_session(&self) -> Result<Box<dyn InferenceSession + '_>> {
        self.state.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession { model: self }))
    }
}

struct MockSession<'a> {
    model: &'a MockModel,
}

impl InferenceSession for MockSession<'_> {
    fn generate(&mut self, prompt: &str, max_tokens: u32) -> Result<String> {
        if max_tokens == 0 {
            return Err(ParlorError::InvalidInput(
                "max_tokens must be positive".to_string(),
            ));
        }

        let state = &self.model.state;
        state.prompts.lock().unwrap().push(RecordedPrompt {
            prompt: prompt.to_string(),
            max_tokens,
            model_name: self.model.model_name.clone(),
        });
        let call = state.generations.fetch_add(1, Ordering::SeqCst);

        match &self.model.behavior {
            MockBehavior::Echo => Ok(prompt.to_string()),
            MockBehavior::Scripted(texts) => {
                if texts.is_empty() {
                    Ok(String::new())
                } else {
                    Ok(texts[call.min(texts.len() - 1)].clone())
                }
            }
            MockBehavior::FailGeneration(message) => {
                Err(ParlorError::Generation(message.clone()))
            }
        }
    }
}
