use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// The only component that touches the network.
///
/// Every higher layer goes through a [`Downloader`](super::Downloader),
/// which owns one of these. Tests swap in an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// The parent directory of `dest` must already exist. When
    /// `expected_sha1` is set the body is hashed while streaming and a
    /// mismatch is an error; `dest` is left untouched in that case.
    async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        expected_sha1: Option<&str>,
    ) -> LauncherResult<u64>;

    /// Fetch a small text document (manifest, descriptor).
    async fn get_text(&self, url: &str) -> LauncherResult<String>;
}

/// `reqwest` backed fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        expected_sha1: Option<&str>,
    ) -> LauncherResult<u64> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Written next to the destination and renamed once complete, so a
        // file at its canonical path is always a finished download. The name
        // is unique per transfer; concurrent downloads of one destination
        // never share a partial file.
        let partial = partial_path(dest);
        let (written, actual_sha1) = match stream_body(response, &partial, expected_sha1).await {
            Ok(out) => out,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        if let (Some(expected), Some(actual)) = (expected_sha1, actual_sha1) {
            if !actual.eq_ignore_ascii_case(expected) {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Err(e) = tokio::fs::rename(&partial, dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(LauncherError::io(dest)(e));
        }

        Ok(written)
    }

    async fn get_text(&self, url: &str) -> LauncherResult<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

async fn stream_body(
    response: reqwest::Response,
    partial: &Path,
    expected_sha1: Option<&str>,
) -> LauncherResult<(u64, Option<String>)> {
    let mut hasher = expected_sha1.map(|_| Sha1::new());
    let mut written = 0u64;

    // Scoped so the handle is closed before the rename.
    {
        let mut file = tokio::fs::File::create(partial)
            .await
            .map_err(LauncherError::io(partial))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(hasher) = hasher.as_mut() {
                hasher.update(&chunk);
            }
            file.write_all(&chunk)
                .await
                .map_err(LauncherError::io(partial))?;
            written = written.saturating_add(chunk.len() as u64);
        }

        file.flush().await.map_err(LauncherError::io(partial))?;
    }

    Ok((written, hasher.map(|h| hex::encode(h.finalize()))))
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.part", Uuid::new_v4().simple()));
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_sits_next_to_destination() {
        let dest = Path::new("/store/libraries/org/lwjgl/lwjgl-3.3.3.jar");
        let partial = partial_path(dest);

        assert_eq!(partial.parent(), dest.parent());
        let name = partial.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("lwjgl-3.3.3.jar."));
        assert!(name.ends_with(".part"));
    }

    #[test]
    fn partial_names_are_unique_per_transfer() {
        let dest = Path::new("/store/versions/1.12.2/1.12.2.jar");
        assert_ne!(partial_path(dest), partial_path(dest));
    }
}
