// SPDX-License-Identifier: MIT

//! Local inference backend using llama.cpp
//!
//! Loads GGUF model files through llama-cpp-2, giving Parlor fully local
//! generation with no network dependency. Compiled only with the
//! `local-llm` feature.

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::token::data_array::LlamaTokenDataArray;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::error::{ParlorError, Result};
use crate::llm::backend::{InferenceSession, ModelHandle, ModelLoader};

/// Sampling temperature for local generation
const TEMPERATURE: f32 = 0.7;

/// Loader for GGUF model files
pub struct LlamaCppLoader {
    config: GenerationConfig,
    backend: Arc<LlamaBackend>,
}

impl LlamaCppLoader {
    /// Initialize the llama.cpp backend with the given generation config
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let backend = LlamaBackend::init().map_err(|e| {
            ParlorError::Config(format!("Failed to initialize llama.cpp backend: {}", e))
        })?;
        Ok(Self {
            config,
            backend: Arc::new(backend),
        })
    }
}

impl ModelLoader for LlamaCppLoader {
    fn name(&self) -> &str {
        "llama.cpp"
    }

    fn load(&self, path: &Path) -> Result<Box<dyn ModelHandle>> {
        if !path.exists() {
            return Err(ParlorError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let model_params = LlamaModelParams::default().with_n_gpu_layers(self.config.gpu_layers);

        tracing::info!(path = %path.display(), "loading GGUF model");
        let model = LlamaModel::load_from_file(&self.backend, path, &model_params)
            .map_err(|e| ParlorError::ModelLoad(e.to_string()))?;

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("local")
            .to_string();

        Ok(Box::new(LlamaCppModel {
            model_name,
            model,
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
        }))
    }
}

/// A loaded GGUF model
pub struct LlamaCppModel {
    model_name: String,
    model: LlamaModel,
    backend: Arc<LlamaBackend>,
    config: GenerationConfig,
}

impl ModelHandle for LlamaCppModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn open_session(&self) -> Result<Box<dyn InferenceSession + '_>> {
        let ctx_params =
            LlamaContextParams::default().with_n_ctx(NonZeroU32::new(self.config.context_size));

        let ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| ParlorError::Generation(format!("Failed to create context: {}", e)))?;

        Ok(Box::new(LlamaCppSession {
            model: &self.model,
            ctx,
            context_size: self.config.context_size,
        }))
    }
}

/// One inference context window; dropped at the end of each scope
pub struct LlamaCppSession<'a> {
    model: &'a LlamaModel,
    ctx: LlamaContext<'a>,
    context_size: u32,
}

impl LlamaCppSession<'_> {
    /// Wrap the user text in a single-turn ChatML prompt
    fn chatml_prompt(text: &str) -> String {
        format!("<|im_start|>user\n{}<|im_end|>\n<|im_start|>assistant\n", text)
    }
}

impl InferenceSession for LlamaCppSession<'_> {
    fn generate(&mut self, prompt: &str, max_tokens: u32) -> Result<String> {
        if max_tokens == 0 {
            return Err(ParlorError::InvalidInput(
                "max_tokens must be positive".to_string(),
            ));
        }

        let prompt = Self::chatml_prompt(prompt);
        let tokens = self
            .model
            .str_to_token(&prompt, AddBos::Always)
            .map_err(|e| ParlorError::Generation(format!("Failed to tokenize prompt: {}", e)))?;

        if tokens.is_empty() {
            return Ok(String::new());
        }

        let mut batch = LlamaBatch::new(self.context_size as usize, 1);
        for (i, token) in tokens.iter().enumerate() {
            let is_last = i == tokens.len() - 1;
            batch
                .add(*token, i as i32, &[0], is_last)
                .map_err(|e| ParlorError::Generation(format!("Failed to build batch: {}", e)))?;
        }

        self.ctx
            .decode(&mut batch)
            .map_err(|e| ParlorError::Generation(format!("Failed to decode prompt: {}", e)))?;

        let mut output = String::new();
        let mut n_cur = tokens.len();

        for _ in 0..max_tokens {
            let candidates = self.ctx.candidates_ith(batch.n_tokens() - 1);
            let mut candidates_data = candidates
                .iter()
                .map(|c| llama_cpp_2::token::data::LlamaTokenData::new(c.id(), c.logit(), 0.0))
                .collect::<Vec<_>>();
            let mut candidates_array =
                LlamaTokenDataArray::from_iter(candidates_data.iter_mut(), false);

            candidates_array.sample_temp(TEMPERATURE);
            let new_token_id = candidates_array.sample_token(&mut self.ctx);

            if self.model.is_eog_token(new_token_id) {
                break;
            }

            let piece = self
                .model
                .token_to_str(new_token_id, Special::Tokenize)
                .map_err(|e| ParlorError::Generation(format!("Failed to decode token: {}", e)))?;
            output.push_str(&piece);

            batch.clear();
            batch
                .add(new_token_id, n_cur as i32, &[0], true)
                .map_err(|e| ParlorError::Generation(format!("Failed to build batch: {}", e)))?;
            self.ctx
                .decode(&mut batch)
                .map_err(|e| ParlorError::Generation(format!("Failed to decode: {}", e)))?;
            n_cur += 1;
        }

        // Strip a trailing ChatML end token if the model emitted one
        Ok(output.trim_end_matches("<|im_end|>").trim_end().to_string())
    }
}
