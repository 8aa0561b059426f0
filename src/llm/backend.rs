// SPDX-License-Identifier: MIT

//! Backend traits for model loading and generation
//!
//! `ModelLoader` turns a model file into a `ModelHandle`; a handle opens
//! short-lived `InferenceSession`s, one per bounded generation scope.
//! Session resources are released by `Drop`, so every exit path from
//! [`with_session`] releases them, including the failure path.

use std::path::Path;

use crate::error::Result;

/// Loads model files into inference handles
pub trait ModelLoader: Send + Sync {
    /// Backend name (e.g., "llama.cpp", "mock")
    fn name(&self) -> &str;

    /// Load the model file at `path`.
    ///
    /// May block for seconds. Failures surface as
    /// [`ParlorError::ModelLoad`](crate::ParlorError::ModelLoad).
    fn load(&self, path: &Path) -> Result<Box<dyn ModelHandle>>;
}

/// An opaque, loaded model
pub trait ModelHandle: Send {
    /// Name of the loaded model (usually the file stem)
    fn model_name(&self) -> &str;

    /// Open a fresh inference session bound to this model
    fn open_session(&self) -> Result<Box<dyn InferenceSession + '_>>;
}

/// A bounded inference scope tied to one loaded model
pub trait InferenceSession {
    /// Generate a completion for `prompt`, at most `max_tokens` tokens.
    ///
    /// Failures surface as
    /// [`ParlorError::Generation`](crate::ParlorError::Generation).
    fn generate(&mut self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Run `f` inside a freshly opened session on `handle`.
///
/// The session is dropped when this returns, whether `f` succeeded or not.
pub fn with_session<T>(
    handle: &dyn ModelHandle,
    f: impl FnOnce(&mut dyn InferenceSession) -> Result<T>,
) -> Result<T> {
    let mut session = handle.open_session()?;
    f(session.as_mut())
}
