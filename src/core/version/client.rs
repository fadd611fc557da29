use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::downloader::{BatchReport, DownloadTask, Downloader};
use crate::core::error::{LauncherError, LauncherResult};

use super::manifest::ResolvedVersion;
use super::version_file::VersionDescriptor;

impl ResolvedVersion {
    fn descriptor_path(directory: &Path, version_number: &str) -> PathBuf {
        directory.join(format!("{version_number}.json"))
    }

    /// Write the descriptor verbatim to `<directory>/<version_number>.json`.
    pub async fn save(&self, directory: &Path, version_number: &str) -> LauncherResult<()> {
        let path = Self::descriptor_path(directory, version_number);
        tokio::fs::write(&path, &self.raw)
            .await
            .map_err(LauncherError::io(&path))
    }

    /// Reload a descriptor persisted by [`acquire_client_jar`], for
    /// relaunching without touching the manifest.
    pub async fn load(directory: &Path, version_number: &str) -> LauncherResult<Self> {
        let path = Self::descriptor_path(directory, version_number);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(LauncherError::io(&path))?;
        let descriptor = VersionDescriptor::parse(&raw, &path.to_string_lossy())?;
        Ok(Self { descriptor, raw })
    }
}

/// Download the client jar to `<directory>/<version_number>.jar` and store
/// the descriptor next to it.
///
/// The jar is always fetched again, even if present.
pub async fn acquire_client_jar(
    resolved: &ResolvedVersion,
    version_number: &str,
    directory: &Path,
    downloader: &Downloader,
) -> LauncherResult<BatchReport> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(LauncherError::io(directory))?;

    let client = &resolved.descriptor.downloads.client;
    let task = DownloadTask::new(&client.url, directory, format!("{version_number}.jar"))
        .with_sha1(&client.sha1);
    let report = downloader.fetch_batch(vec![task]).await;

    resolved.save(directory, version_number).await?;

    if report.is_complete() {
        info!("Downloaded {}.jar", version_number);
    }
    Ok(report)
}
