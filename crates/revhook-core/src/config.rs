use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RevhookError;

/// File name looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".revhook.toml";

/// Top-level configuration loaded from `.revhook.toml`.
///
/// Resolution order: CLI flags > env vars > config file > defaults.
///
/// # Examples
///
/// ```
/// use revhook_core::RevhookConfig;
///
/// let config = RevhookConfig::default();
/// assert_eq!(config.review.max_tokens, 1024);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevhookConfig {
    /// Inference engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Review output settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Hook installation settings.
    #[serde(default)]
    pub hook: HookConfig,
}

impl RevhookConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RevhookError::FileNotFound`] if the file does not exist,
    /// [`RevhookError::Io`] if it cannot be read, or [`RevhookError::Toml`]
    /// if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use revhook_core::RevhookConfig;
    /// use std::path::Path;
    ///
    /// let config = RevhookConfig::from_file(Path::new(".revhook.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, RevhookError> {
        if !path.exists() {
            return Err(RevhookError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`RevhookError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use revhook_core::RevhookConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// max_tokens = 512
    /// "#;
    /// let config = RevhookConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.max_tokens, 512);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, RevhookError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply `REVHOOK_BASE_URL` and `REVHOOK_API_KEY` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use revhook_core::RevhookConfig;
    ///
    /// let mut config = RevhookConfig::default();
    /// config.apply_overrides(|key| {
    ///     (key == "REVHOOK_BASE_URL").then(|| "http://localhost:11434".to_string())
    /// });
    /// assert_eq!(config.engine.base_url, "http://localhost:11434");
    /// ```
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("REVHOOK_BASE_URL").filter(|v| !v.is_empty()) {
            self.engine.base_url = url;
        }
        if let Some(key) = lookup("REVHOOK_API_KEY").filter(|v| !v.is_empty()) {
            self.engine.api_key = Some(key);
        }
    }
}

/// Inference engine configuration.
///
/// The engine is any server exposing the OpenAI-compatible
/// `/v1/completions` endpoint (llama.cpp server, Ollama, vLLM, ...).
///
/// # Examples
///
/// ```
/// use revhook_core::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.base_url, "http://127.0.0.1:8080");
/// assert!(config.model_path.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the model server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (default: 600).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sampling temperature (default: 0.2).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Local path of the model weights served by the engine.
    pub model_path: Option<PathBuf>,
    /// Where to download the weights from when `model_path` is missing.
    pub model_url: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_model() -> String {
    "mistral-7b-instruct-v0.2.Q4_K_M".into()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            model_path: None,
            model_url: None,
        }
    }
}

/// Review output configuration.
///
/// # Examples
///
/// ```
/// use revhook_core::ReviewConfig;
/// use std::path::PathBuf;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.output_dir, PathBuf::from(".code_review"));
/// assert_eq!(config.max_tokens, 1024);
/// assert_eq!(config.artifact_suffix, ".review.txt");
/// assert_eq!(config.completion_marker, "REVIEW DONE");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Directory receiving the review artifacts (default: `.code_review`).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum completion tokens per file (default: 1024).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Suffix appended to `{basename}_{commit}` (default: `.review.txt`).
    #[serde(default = "default_artifact_suffix")]
    pub artifact_suffix: String,
    /// Line printed once a run has finished (default: `REVIEW DONE`).
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,
    /// Replaces the built-in reviewer instructions when set.
    pub instructions: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".code_review")
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_artifact_suffix() -> String {
    ".review.txt".into()
}

fn default_completion_marker() -> String {
    "REVIEW DONE".into()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_tokens: default_max_tokens(),
            artifact_suffix: default_artifact_suffix(),
            completion_marker: default_completion_marker(),
            instructions: None,
        }
    }
}

/// Hook installation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    /// Global hooks directory (default: `~/.git-hooks`). A leading `~/`
    /// is expanded to the home directory.
    pub hooks_dir: Option<PathBuf>,
}

impl HookConfig {
    /// Resolve the hooks directory, expanding `~`.
    ///
    /// # Errors
    ///
    /// Returns [`RevhookError::Config`] if the home directory is needed but
    /// cannot be determined.
    pub fn resolve_hooks_dir(&self) -> Result<PathBuf, RevhookError> {
        let home = || {
            dirs::home_dir()
                .ok_or_else(|| RevhookError::Config("cannot determine home directory".into()))
        };
        match &self.hooks_dir {
            None => Ok(home()?.join(".git-hooks")),
            Some(dir) => match dir.strip_prefix("~") {
                Ok(rest) => Ok(home()?.join(rest)),
                Err(_) => Ok(dir.clone()),
            },
        }
    }
}
