use std::path::PathBuf;

/// Errors that can occur across revhook.
///
/// Library crates return this type directly. It implements
/// [`miette::Diagnostic`] so the binary can surface it with `?`.
///
/// # Examples
///
/// ```
/// use revhook_core::RevhookError;
///
/// let err = RevhookError::Config("missing base_url".into());
/// assert!(err.to_string().contains("missing base_url"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RevhookError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(revhook::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(revhook::config))]
    Config(String),

    /// Git invocation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(revhook::git))]
    Git(String),

    /// Inference engine request or response error.
    #[error("LLM error: {0}")]
    #[diagnostic(
        code(revhook::llm),
        help("is the local model server running? check [engine] base_url in .revhook.toml")
    )]
    Llm(String),

    /// Model artifact could not be fetched or stored.
    #[error("model error: {0}")]
    #[diagnostic(code(revhook::model))]
    Model(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(revhook::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(revhook::not_found))]
    FileNotFound(PathBuf),
}
