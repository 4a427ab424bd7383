use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The diff body of a single file, keyed by the path after `+++ b/`.
///
/// # Examples
///
/// ```
/// use revhook_core::FileChunk;
///
/// let chunk = FileChunk {
///     path: "src/app.py".into(),
///     body: "@@ -1 +1 @@\n-a\n+b".into(),
/// };
/// assert_eq!(chunk.file_name(), "app.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunk {
    /// Relative path as written in the diff.
    pub path: String,
    /// The section's lines joined with `\n`.
    pub body: String,
}

impl FileChunk {
    /// Last path component, or the whole path if it has none.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// Ordered mapping from file path to diff body.
///
/// Iteration follows the order in which paths first appeared. Inserting a
/// path that is already present replaces its body in place.
///
/// # Examples
///
/// ```
/// use revhook_core::DiffFile;
///
/// let mut diff = DiffFile::new();
/// diff.insert("b.rs", "+x");
/// diff.insert("a.rs", "+y");
/// diff.insert("b.rs", "+z");
///
/// let paths: Vec<&str> = diff.iter().map(|c| c.path.as_str()).collect();
/// assert_eq!(paths, ["b.rs", "a.rs"]);
/// assert_eq!(diff.get("b.rs"), Some("+z"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFile {
    chunks: Vec<FileChunk>,
}

impl DiffFile {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the body for `path`.
    pub fn insert(&mut self, path: impl Into<String>, body: impl Into<String>) {
        let path = path.into();
        let body = body.into();
        match self.chunks.iter_mut().find(|c| c.path == path) {
            Some(existing) => existing.body = body,
            None => self.chunks.push(FileChunk { path, body }),
        }
    }

    /// Body recorded for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.chunks
            .iter()
            .find(|c| c.path == path)
            .map(|c| c.body.as_str())
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// `true` when no file section survived parsing.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over the chunks in first-appearance order.
    pub fn iter(&self) -> std::slice::Iter<'_, FileChunk> {
        self.chunks.iter()
    }
}

impl<'a> IntoIterator for &'a DiffFile {
    type Item = &'a FileChunk;
    type IntoIter = std::slice::Iter<'a, FileChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

impl<P: Into<String>, B: Into<String>> FromIterator<(P, B)> for DiffFile {
    fn from_iter<I: IntoIterator<Item = (P, B)>>(iter: I) -> Self {
        let mut diff = DiffFile::new();
        for (path, body) in iter {
            diff.insert(path, body);
        }
        diff
    }
}

impl fmt::Display for DiffFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.chunks.len() == 1 { "file" } else { "files" };
        write!(f, "{} {noun}", self.chunks.len())
    }
}
