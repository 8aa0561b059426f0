// SPDX-License-Identifier: MIT

//! Backend selection
//!
//! Picks the inference backend available in this build. With `local-llm`
//! enabled this is llama.cpp; without it, browsing models and transcripts
//! still works but loading a model reports how to enable a backend.

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::llm::backend::ModelLoader;

/// Construct the default model loader for this build
#[cfg(feature = "local-llm")]
pub fn default_loader(config: &GenerationConfig) -> Result<Box<dyn ModelLoader>> {
    let loader = crate::llm::llama_cpp::LlamaCppLoader::new(config.clone())?;
    Ok(Box::new(loader))
}

/// Construct the default model loader for this build
#[cfg(not(feature = "local-llm"))]
pub fn default_loader(_config: &GenerationConfig) -> Result<Box<dyn ModelLoader>> {
    Ok(Box::new(unavailable::UnavailableLoader))
}

#[cfg(not(feature = "local-llm"))]
mod unavailable {
    use std::path::Path;

    use crate::error::{ParlorError, Result};
    use crate::llm::backend::{ModelHandle, ModelLoader};

    /// Placeholder loader for builds without an inference backend
    pub struct UnavailableLoader;

    impl ModelLoader for UnavailableLoader {
        fn name(&self) -> &str {
            "unavailable"
        }

        fn load(&self, _path: &Path) -> Result<Box<dyn ModelHandle>> {
            Err(ParlorError::ModelLoad(
                "this build has no inference backend; rebuild with --features local-llm"
                    .to_string(),
            ))
        }
    }
}
