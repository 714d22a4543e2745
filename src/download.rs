/// Streams one media file to disk.
///
/// Bytes land in `<dest>.part` and the file is renamed into place only once the
/// transfer completes, so an interrupted run never leaves a truncated file
/// under the final name.
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub bytes_so_far: u64,
    pub chunk_size: u64,
    /// From `Content-Length`; unknown for chunked responses.
    pub total_size: Option<u64>,
}

impl ProgressUpdate {
    pub fn percent(&self) -> Option<f64> {
        match self.total_size {
            Some(total) if total > 0 => Some(self.bytes_so_far as f64 * 100.0 / total as f64),
            _ => None,
        }
    }
}

/// Download `uri` to `dest`, calling `on_progress` after every chunk.
/// Returns the number of bytes written.
pub async fn fetch_to_file<F>(
    http: &reqwest::Client,
    uri: &str,
    dest: &Path,
    mut on_progress: F,
) -> Result<u64>
where
    F: FnMut(ProgressUpdate) + Send,
{
    let part = part_path(dest);
    match transfer(http, uri, &part, &mut on_progress).await {
        Ok(written) => {
            tokio::fs::rename(&part, dest)
                .await
                .map_err(|e| AppError::download(uri, format!("rename into place: {e}")))?;
            Ok(written)
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Could not delete partial file {}: {rm}", part.display());
                }
            }
            Err(AppError::download(uri, format!("{e:#}")))
        }
    }
}

async fn transfer<F>(
    http: &reqwest::Client,
    uri: &str,
    part: &Path,
    on_progress: &mut F,
) -> anyhow::Result<u64>
where
    F: FnMut(ProgressUpdate) + Send,
{
    let mut resp = http.get(uri).send().await.context("request media")?;
    let status = resp.status();
    if !status.is_success() {
        bail!("server returned {status}");
    }

    let total_size = resp.content_length();
    tracing::debug!(
        "Downloading {uri} ({} bytes) to {}",
        total_size.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
        part.display()
    );

    if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let mut file = tokio::fs::File::create(part)
        .await
        .with_context(|| format!("create {}", part.display()))?;

    let mut bytes_so_far = 0u64;
    while let Some(chunk) = resp.chunk().await.context("read media body")? {
        file.write_all(&chunk).await.context("write media chunk")?;
        bytes_so_far += chunk.len() as u64;
        on_progress(ProgressUpdate {
            bytes_so_far,
            chunk_size: chunk.len() as u64,
            total_size,
        });
    }
    file.flush().await.context("flush media file")?;

    if let Some(total) = total_size {
        if bytes_so_far < total {
            bail!("connection closed after {bytes_so_far} of {total} bytes");
        }
    }

    Ok(bytes_so_far)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
