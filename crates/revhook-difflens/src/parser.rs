use std::path::Path;

use revhook_core::{DiffFile, RevhookError};

/// Marker that opens a file section in a unified diff.
pub const NEW_FILE_MARKER: &str = "+++ b/";

/// Split a unified diff into per-file bodies.
///
/// Every line after a `+++ b/<path>` marker, up to the next marker, belongs to
/// `<path>` verbatim, hunk headers included. Lines before the first marker,
/// or under a marker with an empty path, are dropped. A marker with no lines
/// after it produces no entry.
///
/// # Examples
///
/// ```
/// use revhook_difflens::parser::parse_diff_file;
///
/// let diff = "diff --git a/foo.py b/foo.py\n\
///             --- a/foo.py\n\
///             +++ b/foo.py\n\
///             @@ -1,2 +1,3 @@\n\
///             +print(\"hi\")\n";
/// let files = parse_diff_file(diff);
/// assert_eq!(files.len(), 1);
/// assert_eq!(files.get("foo.py"), Some("@@ -1,2 +1,3 @@\n+print(\"hi\")"));
/// ```
pub fn parse_diff_file(input: &str) -> DiffFile {
    let mut files = DiffFile::new();
    let mut current: Option<&str> = None;
    let mut chunk: Vec<&str> = Vec::new();

    for line in input.lines() {
        if let Some(path) = line.strip_prefix(NEW_FILE_MARKER) {
            flush_chunk(&mut files, current, &mut chunk);
            // A bare `+++ b/` names no file; its lines are dropped.
            current = Some(path).filter(|p| !p.is_empty());
            continue;
        }

        if current.is_some() {
            chunk.push(line);
        }
    }

    flush_chunk(&mut files, current, &mut chunk);
    files
}

/// Read the diff at `path` and split it with [`parse_diff_file`].
///
/// # Errors
///
/// Returns [`RevhookError::FileNotFound`] if `path` does not exist and
/// [`RevhookError::Io`] if it cannot be read as UTF-8 text.
///
/// # Examples
///
/// ```no_run
/// use revhook_difflens::parser::read_diff_file;
/// use std::path::Path;
///
/// let files = read_diff_file(Path::new("staged.diff")).unwrap();
/// for chunk in &files {
///     println!("{}", chunk.path);
/// }
/// ```
pub fn read_diff_file(path: &Path) -> Result<DiffFile, RevhookError> {
    if !path.exists() {
        return Err(RevhookError::FileNotFound(path.to_path_buf()));
    }
    let input = std::fs::read_to_string(path)?;
    Ok(parse_diff_file(&input))
}

fn flush_chunk(files: &mut DiffFile, current: Option<&str>, chunk: &mut Vec<&str>) {
    if let Some(path) = current {
        if !chunk.is_empty() {
            files.insert(path, chunk.join("\n"));
        }
    }
    chunk.clear();
}
