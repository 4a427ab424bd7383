const REVIEW_INSTRUCTIONS: &str = "\
You are a senior code reviewer. Given the diff and surrounding code context, \
suggest improvements in code quality, logic, and readability. \
Be precise and constructive.";

/// Build the prompt for one file's diff.
///
/// `instructions` replaces the built-in reviewer preamble when set.
///
/// # Examples
///
/// ```
/// use revhook_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt(None, "foo.py", "+print(\"hi\")");
/// assert!(prompt.contains("File: `foo.py`"));
/// assert!(prompt.ends_with("```diff\n+print(\"hi\")\n```"));
/// ```
pub fn build_review_prompt(instructions: Option<&str>, path: &str, diff: &str) -> String {
    let preamble = instructions.unwrap_or(REVIEW_INSTRUCTIONS);
    format!("{preamble}\nFile: `{path}`\nDiff:\n```diff\n{diff}\n```")
}

/// Header line written at the top of every review artifact.
pub fn artifact_header(path: &str) -> String {
    format!("\u{1f4dd} Suggestions for {path}:")
}

/// Full contents of a review artifact.
///
/// # Examples
///
/// ```
/// use revhook_review::prompt::render_artifact;
///
/// let text = render_artifact("foo.py", "Add a docstring.");
/// assert!(text.starts_with("\u{1f4dd} Suggestions for foo.py:\n"));
/// assert!(text.ends_with("Add a docstring.\n"));
/// ```
pub fn render_artifact(path: &str, suggestion: &str) -> String {
    format!("{}\n{suggestion}\n", artifact_header(path))
}
