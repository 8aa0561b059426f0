// SPDX-License-Identifier: MIT

//! Inference backend abstraction
//!
//! Defines the seam between Parlor and the model-inference library:
//! a loader produces an opaque model handle, and each generation runs
//! inside a short-lived session opened on that handle.

pub mod backend;
pub mod factory;
#[cfg(feature = "local-llm")]
pub mod llama_cpp;
pub mod mock;

pub use backend::{with_session, InferenceSession, ModelHandle, ModelLoader};
pub use factory::default_loader;
#[cfg(feature = "local-llm")]
pub use llama_cpp::LlamaCppLoader;
pub use mock::MockLoader;
