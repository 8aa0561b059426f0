// SPDX-License-Identifier: MIT

//! Model Registry
//!
//! Discovers GGUF model files and owns the single active-model slot.
//! At most one model is resident at a time; loading a new model releases
//! the previous handle first, since a model may claim exclusive
//! device/accelerator resources.

use std::path::{Path, PathBuf};

use crate::error::{ParlorError, Result};
use crate::llm::backend::{ModelHandle, ModelLoader};

/// File extension of loadable model artifacts
pub const MODEL_EXTENSION: &str = "gguf";

/// A model file available for loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Display name (the file name)
    pub name: String,
    /// Full path to the model file
    pub file_path: PathBuf,
}

/// The single model currently resident in memory
pub struct ActiveModel {
    /// Descriptor of the loaded file
    pub descriptor: ModelDescriptor,
    /// Opaque inference handle
    pub handle: Box<dyn ModelHandle>,
    /// Load generation; increments on every successful load, letting
    /// stale chat sessions detect that their model was replaced
    pub generation: u64,
}

/// Owns model discovery and the active-model slot
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    active: Option<ActiveModel>,
    generations: u64,
}

impl ModelRegistry {
    /// Create a registry backed by the given loader
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            active: None,
            generations: 0,
        }
    }

    /// List model files in `directory`, sorted by file name.
    ///
    /// A missing directory is reported as `DirectoryNotFound`; the caller
    /// is expected to show an empty list and continue.
    pub fn list_models(&self, directory: &Path) -> Result<Vec<ModelDescriptor>> {
        if !directory.is_dir() {
            return Err(ParlorError::DirectoryNotFound(directory.to_path_buf()));
        }

        let mut models = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODEL_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            models.push(ModelDescriptor {
                name: name.to_string(),
                file_path: path.clone(),
            });
        }
        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    /// Load the model described by `descriptor`, releasing any currently
    /// active model first. Failure leaves no model active.
    pub fn load_model(&mut self, descriptor: &ModelDescriptor) -> Result<&ActiveModel> {
        // Release the previous handle before loading; two models must
        // never be resident at once.
        if let Some(previous) = self.active.take() {
            tracing::debug!(model = %previous.descriptor.name, "releasing previous model");
            drop(previous);
        }

        tracing::info!(model = %descriptor.name, "loading model");
        let handle = self
            .loader
            .load(&descriptor.file_path)
            .map_err(|e| match e {
                err @ ParlorError::ModelLoad(_) => err,
                other => ParlorError::ModelLoad(other.to_string()),
            })?;

        self.generations += 1;
        Ok(self.active.insert(ActiveModel {
            descriptor: descriptor.clone(),
            handle,
            generation: self.generations,
        }))
    }

    /// Release the active model. Calling this with no model loaded is a
    /// no-op.
    pub fn eject_model(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::info!(model = %active.descriptor.name, "ejecting model");
        }
    }

    /// The currently active model, if any
    pub fn active(&self) -> Option<&ActiveModel> {
        self.active.as_ref()
    }

    /// Generation of the currently active model, if any
    pub fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.generation)
    }

    /// Name of the backing loader
    pub fn backend_name(&self) -> &str {
        self.loader.name()
    }
}
