// ─── Native Extraction ───
// Downloads the platform's native archives into a fresh per-launch
// directory and unpacks them there.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::downloader::{DownloadTask, Downloader, FailedDownload};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::TargetOs;
use crate::core::store::ContentStore;
use crate::core::version::VersionDescriptor;

/// A native archive that downloaded but could not be unpacked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub archive: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NativeReport {
    /// `natives/<uuid>`, unique to this call and never cleaned up here.
    pub directory: PathBuf,
    /// Files written across all archives.
    pub extracted: usize,
    pub failures: Vec<FailedDownload>,
    pub extraction_failures: Vec<ExtractionFailure>,
}

impl NativeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.extraction_failures.is_empty()
    }
}

/// Fetch and unpack every native archive `os` needs.
///
/// Each call gets its own directory, so concurrent launches of the same
/// version never share extracted files. Archives are deleted once unpacked.
pub async fn extract_natives(
    store: &ContentStore,
    descriptor: &VersionDescriptor,
    os: TargetOs,
    downloader: &Downloader,
) -> LauncherResult<NativeReport> {
    let directory = store.natives_root().join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(LauncherError::io(&directory))?;

    let mut names = HashSet::new();
    let mut jobs: Vec<(DownloadTask, Vec<String>)> = Vec::new();
    for lib in &descriptor.libraries {
        if !lib.is_allowed_for(os) {
            continue;
        }
        let Some(native) = lib.native_for(os) else {
            continue;
        };

        let name = native.path.rsplit('/').next().unwrap_or(&native.path);
        if !names.insert(name.to_string()) {
            continue;
        }

        let task = DownloadTask::new(&native.url, &directory, name).with_sha1(&native.sha1);
        jobs.push((task, lib.extract_excludes()));
    }

    info!("Extracting {} native archives into {:?}", jobs.len(), directory);

    let batch = downloader
        .fetch_batch(jobs.iter().map(|(task, _)| task.clone()).collect())
        .await;
    let failed: HashSet<PathBuf> = batch
        .failures
        .iter()
        .map(|failure| failure.task.destination())
        .collect();

    let mut report = NativeReport {
        directory,
        extracted: 0,
        failures: batch.failures,
        extraction_failures: Vec::new(),
    };

    // One archive at a time, in descriptor order: when two archives carry
    // the same entry, the later library's copy is the one left on disk.
    for (task, excludes) in jobs {
        if failed.contains(&task.destination()) {
            continue;
        }
        match unpack_and_remove(task.destination(), report.directory.clone(), excludes).await {
            Ok(count) => report.extracted += count,
            Err(failure) => {
                warn!("Native extraction failed: {:?}: {}", failure.archive, failure.error);
                report.extraction_failures.push(failure);
            }
        }
    }

    Ok(report)
}

async fn unpack_and_remove(
    archive: PathBuf,
    dest_dir: PathBuf,
    excludes: Vec<String>,
) -> Result<usize, ExtractionFailure> {
    let unpacked = {
        let archive = archive.clone();
        tokio::task::spawn_blocking(move || unpack_archive(&archive, &dest_dir, &excludes)).await
    };

    if let Err(e) = tokio::fs::remove_file(&archive).await {
        warn!("Cannot remove native archive {:?}: {}", archive, e);
    }

    match unpacked {
        Ok(Ok(count)) => {
            debug!("Unpacked {} files from {:?}", count, archive);
            Ok(count)
        }
        Ok(Err(e)) => Err(ExtractionFailure {
            archive,
            error: e.to_string(),
        }),
        Err(e) => Err(ExtractionFailure {
            archive,
            error: format!("extraction task failed: {e}"),
        }),
    }
}

/// Unpack `archive` into `dest`, skipping entries under any excluded prefix
/// and entries that would escape `dest`.
fn unpack_archive(archive: &Path, dest: &Path, excludes: &[String]) -> LauncherResult<usize> {
    let file = File::open(archive).map_err(LauncherError::io(archive))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| LauncherError::Extraction {
        archive: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if excludes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry {:?} in {:?}", name, archive);
            continue;
        };
        let out = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(LauncherError::io(&out))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(LauncherError::io(parent))?;
        }

        let mut target = File::create(&out).map_err(LauncherError::io(&out))?;
        std::io::copy(&mut entry, &mut target).map_err(LauncherError::io(&out))?;
        written += 1;
    }

    Ok(written)
}
