use std::io::Write;

use revhook_core::RevhookError;
use revhook_difflens::parser::{parse_diff_file, read_diff_file};

#[test]
fn read_diff_file_matches_in_memory_parse() {
    let text = include_str!("fixtures/staged.diff");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();

    let from_disk = read_diff_file(file.path()).unwrap();
    assert_eq!(from_disk, parse_diff_file(text));
    assert_eq!(from_disk.len(), 3);
}

#[test]
fn rename_and_binary_sections_fold_into_previous_file() {
    let files = parse_diff_file(include_str!("fixtures/staged.diff"));
    let readme = files.get("README.md").unwrap();
    assert!(readme.contains("rename from old_name.py"));
    assert!(readme.contains("Binary files /dev/null and b/assets/logo.png differ"));
    assert!(files.get("new_name.py").is_none());
    assert!(files.get("assets/logo.png").is_none());
}

#[test]
fn new_file_body_keeps_no_newline_marker() {
    let files = parse_diff_file(include_str!("fixtures/staged.diff"));
    assert_eq!(
        files.get("docs/new_page.md"),
        Some("@@ -0,0 +1,2 @@\n+# New page\n+Content.\n\\ No newline at end of file")
    );
}

#[test]
fn missing_diff_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_diff_file(&dir.path().join("absent.diff")).unwrap_err();
    assert!(matches!(err, RevhookError::FileNotFound(_)));
}

#[test]
fn non_utf8_diff_file_is_io_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0x2b, 0x2b, 0x2b, 0x20, 0xff, 0xfe]).unwrap();
    let err = read_diff_file(file.path()).unwrap_err();
    assert!(matches!(err, RevhookError::Io(_)));
}
