use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use revhook_core::{EngineConfig, RevhookError};
use tokio::io::AsyncWriteExt;

/// State of the local model weights after [`ensure_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    /// `engine.model_path` is unset; the engine manages its own weights.
    NotConfigured,
    /// The weights were already on disk.
    Present(PathBuf),
    /// The weights were fetched during this call.
    Downloaded(PathBuf),
}

/// Make sure the configured model file exists, downloading it if needed.
///
/// The download streams into `<model_path>.part` and is renamed into place
/// once complete, so an interrupted fetch never leaves a truncated model.
///
/// # Errors
///
/// Returns [`RevhookError::Model`] if the file is missing and no
/// `engine.model_url` is configured, or if the download fails.
pub async fn ensure_model(config: &EngineConfig) -> Result<ModelStatus, RevhookError> {
    let Some(path) = &config.model_path else {
        return Ok(ModelStatus::NotConfigured);
    };
    if path.exists() {
        return Ok(ModelStatus::Present(path.clone()));
    }
    let Some(url) = &config.model_url else {
        return Err(RevhookError::Model(format!(
            "{} is missing and engine.model_url is not set",
            path.display()
        )));
    };

    download(url, path, config.timeout_secs).await?;
    Ok(ModelStatus::Downloaded(path.clone()))
}

async fn download(url: &str, dest: &Path, timeout_secs: u64) -> Result<(), RevhookError> {
    println!("\u{1f4e5} Downloading model...");
    tracing::debug!(%url, dest = %dest.display(), "fetching model");

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Connect timeout only: the body of a multi-GB model is unbounded.
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RevhookError::Model(format!("failed to create HTTP client: {e}")))?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RevhookError::Model(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RevhookError::Model(format!("{url} returned {status}")));
    }

    let progress = progress_bar(response.content_length());
    let partial = partial_path(dest);

    let saved = match stream_body(&mut response, &partial, progress.as_ref()).await {
        Ok(()) => tokio::fs::rename(&partial, dest).await.map_err(RevhookError::from),
        Err(e) => Err(e),
    };
    if let Err(e) = saved {
        let _ = tokio::fs::remove_file(&partial).await;
        if let Some(pb) = progress {
            pb.abandon();
        }
        return Err(e);
    }

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }
    Ok(())
}

/// Write the response body to `partial`. The file is closed on return.
async fn stream_body(
    response: &mut reqwest::Response,
    partial: &Path,
    progress: Option<&indicatif::ProgressBar>,
) -> Result<(), RevhookError> {
    let mut file = tokio::fs::File::create(partial).await?;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| RevhookError::Model(format!("download interrupted: {e}")))?
    {
        file.write_all(&chunk).await?;
        if let Some(pb) = progress {
            pb.inc(chunk.len() as u64);
        }
    }
    file.flush().await?;
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn progress_bar(len: Option<u64>) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = match len {
        Some(len) => {
            let pb = indicatif::ProgressBar::new(len);
            if let Ok(style) = indicatif::ProgressStyle::with_template(
                "{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta}) {msg}",
            ) {
                pb.set_style(style);
            }
            pb
        }
        None => indicatif::ProgressBar::new_spinner(),
    };
    Some(pb)
}
