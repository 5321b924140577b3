// src/download.rs
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::store::DownloadTicket;

/// Stream the package behind `ticket` to `dest`. Returns bytes written.
/// A partial file is removed when the transfer fails.
pub async fn download_package(
    client: &reqwest::Client,
    ticket: &DownloadTicket,
    dest: &Path,
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut resp = client
        .get(&ticket.url)
        .send()
        .await
        .context("package request")?
        .error_for_status()
        .context("package non-2xx")?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("creating {}", dest.display()))?;

    let mut written: u64 = 0;
    let copied = async {
        while let Some(chunk) = resp.chunk().await.context("reading package body")? {
            file.write_all(&chunk).await.context("writing package")?;
            written += chunk.len() as u64;
        }
        file.flush().await.context("flushing package")?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = copied {
        drop(file);
        let _ = tokio::fs::remove_file(dest).await;
        return Err(e);
    }

    tracing::info!(path = %dest.display(), bytes = written, "package downloaded");
    Ok(written)
}
