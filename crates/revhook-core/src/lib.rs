//! Core types, configuration, and error handling for revhook.
//!
//! This crate provides the shared foundation used by the other revhook crates:
//! - [`RevhookError`]: unified error type using `thiserror`
//! - [`RevhookConfig`]: configuration loaded from `.revhook.toml`
//! - Shared types: [`DiffFile`], [`FileChunk`]

mod config;
mod error;
mod types;

pub use config::{EngineConfig, HookConfig, RevhookConfig, ReviewConfig, DEFAULT_CONFIG_FILE};
pub use error::RevhookError;
pub use types::{DiffFile, FileChunk};
