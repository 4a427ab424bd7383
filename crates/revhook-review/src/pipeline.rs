use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use revhook_core::{DiffFile, FileChunk, RevhookError, ReviewConfig};
use serde::Serialize;

use crate::engine::InferenceEngine;
use crate::prompt;

/// Per-file review produced by the engine.
///
/// # Examples
///
/// ```
/// use revhook_review::pipeline::ReviewResult;
///
/// let result = ReviewResult {
///     file_path: "foo.py".into(),
///     suggestion: Some("Add a docstring.".into()),
///     commit_id: "abc123".into(),
/// };
/// assert!(result.suggestion.is_some());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Path as written in the diff.
    pub file_path: String,
    /// Trimmed suggestion text; `None` when the engine produced nothing.
    pub suggestion: Option<String>,
    /// Caller-supplied commit id.
    pub commit_id: String,
}

/// Bookkeeping for a single run.
#[derive(Debug, Clone)]
pub struct ReviewRun {
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Monotonic start, used for elapsed time.
    pub started: Instant,
    /// Files processed so far, successful or not.
    pub processed: usize,
}

impl ReviewRun {
    /// Start the clock.
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            processed: 0,
        }
    }

    /// Time since [`ReviewRun::start`].
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// A file whose review could not be produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    /// Path as written in the diff.
    pub file_path: String,
    /// Rendered error.
    pub error: String,
}

/// Summary of a finished run.
///
/// # Examples
///
/// ```
/// use revhook_review::pipeline::{ReviewOutcome, ReviewReport};
///
/// let report = ReviewReport::empty("abc123");
/// assert_eq!(report.outcome(), ReviewOutcome::NothingToReview);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    /// Commit id used to name artifacts.
    pub commit_id: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Number of file sections found in the diff.
    pub total_files: usize,
    /// Artifacts written, in review order.
    pub artifacts: Vec<PathBuf>,
    /// Files whose review failed.
    pub failures: Vec<FileFailure>,
    /// Wall-clock duration, rounded to whole seconds.
    pub elapsed_secs: u64,
}

impl ReviewReport {
    /// Report for a diff with no reviewable files.
    pub fn empty(commit_id: &str) -> Self {
        Self {
            commit_id: commit_id.to_string(),
            started_at: Utc::now(),
            total_files: 0,
            artifacts: Vec::new(),
            failures: Vec::new(),
            elapsed_secs: 0,
        }
    }

    /// Number of files that got an artifact.
    pub fn files_reviewed(&self) -> usize {
        self.artifacts.len()
    }

    /// Classify the run.
    pub fn outcome(&self) -> ReviewOutcome {
        let failed = self.failures.len();
        match (self.total_files, failed) {
            (0, _) => ReviewOutcome::NothingToReview,
            (_, 0) => ReviewOutcome::Success,
            (total, failed) if failed == total => ReviewOutcome::TotalFailure { total },
            (total, failed) => ReviewOutcome::Partial { failed, total },
        }
    }
}

/// How a run ended, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ReviewOutcome {
    /// The diff held no file sections.
    NothingToReview,
    /// Every file was reviewed.
    Success,
    /// Some files failed.
    Partial { failed: usize, total: usize },
    /// Every file failed.
    TotalFailure { total: usize },
}

impl ReviewOutcome {
    /// Process exit status for this outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use revhook_review::pipeline::ReviewOutcome;
    ///
    /// assert_eq!(ReviewOutcome::Success.exit_code(), 0);
    /// assert_eq!(ReviewOutcome::Partial { failed: 1, total: 3 }.exit_code(), 2);
    /// assert_eq!(ReviewOutcome::TotalFailure { total: 3 }.exit_code(), 1);
    /// ```
    pub fn exit_code(self) -> u8 {
        match self {
            ReviewOutcome::NothingToReview | ReviewOutcome::Success => 0,
            ReviewOutcome::TotalFailure { .. } => 1,
            ReviewOutcome::Partial { .. } => 2,
        }
    }
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewOutcome::NothingToReview => write!(f, "nothing to review"),
            ReviewOutcome::Success => write!(f, "all files reviewed"),
            ReviewOutcome::Partial { failed, total } => {
                write!(f, "{failed} of {total} files failed")
            }
            ReviewOutcome::TotalFailure { total } => write!(f, "all {total} files failed"),
        }
    }
}

impl fmt::Display for ReviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Commit: {} | Files: {} | Reviewed: {} | Failed: {} | {} sec",
            self.commit_id,
            self.total_files,
            self.files_reviewed(),
            self.failures.len(),
            self.elapsed_secs,
        )?;
        for failure in &self.failures {
            writeln!(f, "  failed: {} ({})", failure.file_path, failure.error)?;
        }
        Ok(())
    }
}

/// Artifact location for `chunk` under `config.output_dir`.
///
/// # Examples
///
/// ```
/// use revhook_core::{FileChunk, ReviewConfig};
/// use revhook_review::pipeline::artifact_path;
/// use std::path::PathBuf;
///
/// let chunk = FileChunk {
///     path: "src/foo.py".into(),
///     body: "+x".into(),
/// };
/// let path = artifact_path(&ReviewConfig::default(), &chunk, "abc123");
/// assert_eq!(path, PathBuf::from(".code_review/foo.py_abc123.review.txt"));
/// ```
pub fn artifact_path(config: &ReviewConfig, chunk: &FileChunk, commit_id: &str) -> PathBuf {
    config.output_dir.join(format!(
        "{}_{commit_id}{}",
        chunk.file_name(),
        config.artifact_suffix
    ))
}

/// Reject commit ids that would place artifacts outside the output directory.
///
/// # Errors
///
/// Returns [`RevhookError::Config`] if `commit_id` contains a path separator.
///
/// # Examples
///
/// ```
/// use revhook_review::pipeline::validate_commit_id;
///
/// assert!(validate_commit_id("abc123").is_ok());
/// assert!(validate_commit_id("feature/x").is_err());
/// ```
pub fn validate_commit_id(commit_id: &str) -> Result<(), RevhookError> {
    if commit_id.contains(['/', '\\']) {
        return Err(RevhookError::Config(format!(
            "commit id {commit_id:?} must not contain path separators"
        )));
    }
    Ok(())
}

/// Review orchestrator: one engine call and one artifact per diffed file.
///
/// Files are reviewed sequentially in diff order. A failing engine call is
/// logged and skipped; a failing artifact write aborts the run.
pub struct ReviewPipeline<E> {
    engine: E,
    config: ReviewConfig,
}

impl<E: InferenceEngine> ReviewPipeline<E> {
    /// Create a pipeline around an opened engine.
    pub fn new(engine: E, config: ReviewConfig) -> Self {
        Self { engine, config }
    }

    /// Release the engine handle.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Review the diff stored at `diff_path`.
    ///
    /// # Errors
    ///
    /// Returns [`RevhookError::FileNotFound`] / [`RevhookError::Io`] if the
    /// diff cannot be read, and otherwise the errors of
    /// [`ReviewPipeline::review`].
    pub async fn run(&self, diff_path: &Path, commit_id: &str) -> Result<ReviewReport, RevhookError> {
        let files = revhook_difflens::parser::read_diff_file(diff_path)?;
        self.review(&files, commit_id).await
    }

    /// Review already-parsed files.
    ///
    /// # Errors
    ///
    /// Returns [`RevhookError::Config`] if `commit_id` contains a path
    /// separator, and [`RevhookError::Io`] if the output directory or an
    /// artifact cannot be written.
    pub async fn review(&self, files: &DiffFile, commit_id: &str) -> Result<ReviewReport, RevhookError> {
        validate_commit_id(commit_id)?;
        let mut run = ReviewRun::start();

        if files.is_empty() {
            println!("\u{26a0}\u{fe0f} No relevant changes found in diff.");
            return Ok(ReviewReport::empty(commit_id));
        }

        std::fs::create_dir_all(&self.config.output_dir)?;

        let mut artifacts = Vec::new();
        let mut failures = Vec::new();

        for chunk in files {
            println!("\u{1f9e0} Reviewing {}", chunk.path);
            let spinner = spinner_for(&chunk.path);

            let reviewed = self.review_chunk(chunk, commit_id).await;
            run.processed += 1;

            if let Some(pb) = &spinner {
                pb.finish_and_clear();
            }

            match reviewed {
                Ok(result) => match result.suggestion {
                    Some(suggestion) => {
                        let path = artifact_path(&self.config, chunk, commit_id);
                        std::fs::write(&path, prompt::render_artifact(&chunk.path, &suggestion))
                            .map_err(|e| {
                                RevhookError::Io(std::io::Error::new(
                                    e.kind(),
                                    format!("writing {}: {e}", path.display()),
                                ))
                            })?;
                        tracing::debug!(file = %chunk.path, artifact = %path.display(), "review written");
                        artifacts.push(path);
                    }
                    None => {
                        let error = "engine returned no suggestion".to_string();
                        tracing::error!(file = %chunk.path, %error, "error reviewing file");
                        failures.push(FileFailure {
                            file_path: chunk.path.clone(),
                            error,
                        });
                    }
                },
                Err(e) => {
                    tracing::error!(file = %chunk.path, error = %e, "error reviewing file");
                    failures.push(FileFailure {
                        file_path: chunk.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let elapsed_secs = run.elapsed().as_secs_f64().round() as u64;
        println!(
            "\u{2705} Review completed. See {}/ folder for suggestions.\n{elapsed_secs} sec",
            self.config.output_dir.display()
        );
        println!("{}", self.config.completion_marker);

        Ok(ReviewReport {
            commit_id: commit_id.to_string(),
            started_at: run.started_at,
            total_files: run.processed,
            artifacts,
            failures,
            elapsed_secs,
        })
    }

    async fn review_chunk(&self, chunk: &FileChunk, commit_id: &str) -> Result<ReviewResult, RevhookError> {
        let prompt = prompt::build_review_prompt(
            self.config.instructions.as_deref(),
            &chunk.path,
            &chunk.body,
        );
        tracing::debug!(file = %chunk.path, %prompt, "built review prompt");

        let completion = self.engine.complete(&prompt, self.config.max_tokens).await?;
        let suggestion = completion
            .first_text()
            .map(str::trim)
            .map(ToString::to_string);

        Ok(ReviewResult {
            file_path: chunk.path.clone(),
            suggestion,
            commit_id: commit_id.to_string(),
        })
    }
}

fn spinner_for(path: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(format!("Waiting for model on {path}..."));
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Completion;

    struct EchoEngine;

    impl InferenceEngine for EchoEngine {
        async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Completion, RevhookError> {
            assert_eq!(max_tokens, 1024);
            let file = prompt
                .lines()
                .find_map(|l| l.strip_prefix("File: "))
                .unwrap_or("?");
            Ok(Completion::from_text(format!("\n  review of {file}  \n")))
        }
    }

    struct EmptyEngine;

    impl InferenceEngine for EmptyEngine {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<Completion, RevhookError> {
            Ok(Completion::default())
        }
    }

    fn config_in(dir: &Path) -> ReviewConfig {
        ReviewConfig {
            output_dir: dir.join(".code_review"),
            ..ReviewConfig::default()
        }
    }

    #[test]
    fn artifact_path_uses_basename_and_suffix() {
        let config = ReviewConfig {
            output_dir: PathBuf::from("out"),
            artifact_suffix: ".md".into(),
            ..ReviewConfig::default()
        };
        let chunk = FileChunk {
            path: "deep/nested/mod.rs".into(),
            body: "+x".into(),
        };
        assert_eq!(
            artifact_path(&config, &chunk, "deadbeef"),
            PathBuf::from("out/mod.rs_deadbeef.md")
        );
    }

    #[test]
    fn commit_ids_with_separators_are_rejected() {
        assert!(validate_commit_id("0a1b2c3").is_ok());
        assert!(validate_commit_id("v1.2.3-rc").is_ok());
        assert!(matches!(
            validate_commit_id("feature/x"),
            Err(RevhookError::Config(_))
        ));
        assert!(validate_commit_id("a\\b").is_err());
    }

    #[tokio::test]
    async fn separator_in_commit_id_fails_before_any_review() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReviewPipeline::new(EchoEngine, config_in(dir.path()));
        let files: DiffFile = [("a.rs", "+a"), ("b.rs", "+b")].into_iter().collect();

        let err = pipeline.review(&files, "feature/x").await.unwrap_err();
        assert!(matches!(err, RevhookError::Config(_)));
        assert!(!dir.path().join(".code_review").exists());
    }

    #[test]
    fn outcome_classification() {
        let mut report = ReviewReport::empty("c");
        assert_eq!(report.outcome(), ReviewOutcome::NothingToReview);

        report.total_files = 3;
        assert_eq!(report.outcome(), ReviewOutcome::Success);

        report.failures.push(FileFailure {
            file_path: "a".into(),
            error: "boom".into(),
        });
        assert_eq!(
            report.outcome(),
            ReviewOutcome::Partial { failed: 1, total: 3 }
        );

        report.total_files = 1;
        assert_eq!(report.outcome(), ReviewOutcome::TotalFailure { total: 1 });
    }

    #[test]
    fn outcome_display() {
        assert_eq!(
            ReviewOutcome::Partial { failed: 2, total: 5 }.to_string(),
            "2 of 5 files failed"
        );
        assert_eq!(ReviewOutcome::NothingToReview.exit_code(), 0);
    }

    #[tokio::test]
    async fn suggestion_is_trimmed_and_written() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReviewPipeline::new(EchoEngine, config_in(dir.path()));
        let files: DiffFile = [("pkg/foo.py", "@@ -1 +1 @@\n+x")].into_iter().collect();

        let report = pipeline.review(&files, "abc123").await.unwrap();
        assert_eq!(report.outcome(), ReviewOutcome::Success);

        let artifact = dir.path().join(".code_review/foo.py_abc123.review.txt");
        assert_eq!(report.artifacts, vec![artifact.clone()]);
        let text = std::fs::read_to_string(artifact).unwrap();
        assert_eq!(
            text,
            "\u{1f4dd} Suggestions for pkg/foo.py:\nreview of `pkg/foo.py`\n"
        );
    }

    #[tokio::test]
    async fn empty_completion_is_recorded_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReviewPipeline::new(EmptyEngine, config_in(dir.path()));
        let files: DiffFile = [("a.rs", "+a")].into_iter().collect();

        let report = pipeline.review(&files, "c1").await.unwrap();
        assert_eq!(report.outcome(), ReviewOutcome::TotalFailure { total: 1 });
        assert_eq!(report.failures[0].file_path, "a.rs");
        assert!(report.artifacts.is_empty());
    }

    #[tokio::test]
    async fn empty_diff_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReviewPipeline::new(EchoEngine, config_in(dir.path()));

        let report = pipeline.review(&DiffFile::new(), "c1").await.unwrap();
        assert_eq!(report.files_reviewed(), 0);
        assert!(!dir.path().join(".code_review").exists());
    }

    #[tokio::test]
    async fn unwritable_output_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be.
        let blocker = dir.path().join(".code_review");
        std::fs::write(&blocker, "not a dir").unwrap();

        let pipeline = ReviewPipeline::new(EchoEngine, config_in(dir.path()));
        let files: DiffFile = [("a.rs", "+a")].into_iter().collect();
        let err = pipeline.review(&files, "c1").await.unwrap_err();
        assert!(matches!(err, RevhookError::Io(_)));
    }
}
