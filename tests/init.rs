use std::process::Command;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn init_installs_hook_and_sets_hooks_path() {
    if !git_available() {
        return;
    }
    let home = tempfile::tempdir().unwrap();
    let gitconfig = home.path().join(".gitconfig");

    let output = Command::new(env!("CARGO_BIN_EXE_revhook"))
        .arg("init")
        .current_dir(home.path())
        .env("HOME", home.path())
        .env("GIT_CONFIG_GLOBAL", &gitconfig)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "revhook init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let script = home.path().join(".git-hooks/pre-commit");
    assert!(script.exists(), "pre-commit hook should exist");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pre-commit hook installed"));

    let config = std::fs::read_to_string(&gitconfig).unwrap();
    assert!(config.contains("hooksPath"));
    assert!(config.contains(".git-hooks"));
}

#[test]
fn init_honours_configured_hooks_dir() {
    if !git_available() {
        return;
    }
    let home = tempfile::tempdir().unwrap();
    let hooks_dir = home.path().join("custom");
    std::fs::write(
        home.path().join(".revhook.toml"),
        format!("[hook]\nhooks_dir = {:?}\n", hooks_dir.display().to_string()),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_revhook"))
        .arg("init")
        .current_dir(home.path())
        .env("HOME", home.path())
        .env("GIT_CONFIG_GLOBAL", home.path().join(".gitconfig"))
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(hooks_dir.join("pre-commit").exists());
    assert!(!home.path().join(".git-hooks").exists());
}
