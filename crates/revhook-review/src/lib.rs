//! Review orchestration for the pre-commit hook.
//!
//! Provides the inference engine client, prompt construction, the per-file
//! review pipeline, hook installation, and model acquisition.

pub mod engine;
pub mod hook;
pub mod model;
pub mod pipeline;
pub mod prompt;
