use std::path::{Path, PathBuf};
use std::process::Command;

use revhook_core::{HookConfig, RevhookError};

/// Script installed as the global `pre-commit` hook.
pub const PRE_COMMIT_SCRIPT: &str = include_str!("../hooks/pre-commit");

/// Install the hook script and point git's global `core.hooksPath` at it.
///
/// Returns the path of the installed script.
///
/// # Errors
///
/// Returns [`RevhookError::Io`] if the script cannot be written and
/// [`RevhookError::Git`] if `git config` fails.
pub fn install_global_hook(config: &HookConfig) -> Result<PathBuf, RevhookError> {
    let hooks_dir = config.resolve_hooks_dir()?;
    set_global_hooks_path(&hooks_dir)?;
    install_hook_script(&hooks_dir)
}

/// Write the `pre-commit` script into `hooks_dir` and make it executable.
///
/// Creates `hooks_dir` if needed and overwrites an existing script.
///
/// # Errors
///
/// Returns [`RevhookError::Io`] on filesystem failures.
pub fn install_hook_script(hooks_dir: &Path) -> Result<PathBuf, RevhookError> {
    std::fs::create_dir_all(hooks_dir)?;
    let script = hooks_dir.join("pre-commit");
    std::fs::write(&script, PRE_COMMIT_SCRIPT)?;
    make_executable(&script)?;
    Ok(script)
}

/// Run `git config --global core.hooksPath <hooks_dir>`.
///
/// # Errors
///
/// Returns [`RevhookError::Git`] if git is missing or exits non-zero.
pub fn set_global_hooks_path(hooks_dir: &Path) -> Result<(), RevhookError> {
    let output = Command::new("git")
        .arg("config")
        .arg("--global")
        .arg("core.hooksPath")
        .arg(hooks_dir)
        .output()
        .map_err(|e| RevhookError::Git(format!("failed to run git config: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RevhookError::Git(format!(
            "git config --global core.hooksPath failed: {}",
            stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), RevhookError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perm = std::fs::metadata(path)?.permissions();
    perm.set_mode(0o755);
    std::fs::set_permissions(path, perm)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), RevhookError> {
    Ok(())
}
