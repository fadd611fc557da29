use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::downloader::{DownloadTask, Downloader, FailedDownload};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::store::{hash_prefix, is_cached, ContentStore};
use crate::core::version::VersionDescriptor;

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

/// What a synchronization pass did. `failures` lists only the objects that
/// were still missing after the retry pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetReport {
    pub index_id: String,
    /// Distinct objects referenced by the index.
    pub objects: usize,
    /// Objects that were already in the store.
    pub cached: usize,
    pub failures: Vec<FailedDownload>,
}

impl AssetReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reconcile the descriptor's asset index against `assets/`.
///
/// The index is downloaded once and then treated as immutable. Every object
/// missing from `assets/objects/<hash[0:2]>/<hash>` is fetched in one
/// bounded batch; failures get the downloader's retry pass and whatever is
/// left is reported rather than aborting the sync.
pub async fn sync_assets(
    store: &ContentStore,
    descriptor: &VersionDescriptor,
    assets_base_url: &str,
    downloader: &Downloader,
    verify_cached: bool,
) -> LauncherResult<AssetReport> {
    let info = &descriptor.asset_index;
    let mut report = AssetReport {
        index_id: info.id.clone(),
        ..AssetReport::default()
    };

    // 1. Asset index JSON
    let index_path = store.asset_index_path(&info.id);
    if !is_cached(&index_path, info.sha1.as_deref(), verify_cached).await {
        let mut task = DownloadTask::new(
            &info.url,
            store.asset_indexes_dir(),
            format!("{}.json", info.id),
        );
        if let Some(sha1) = &info.sha1 {
            task = task.with_sha1(sha1);
        }

        let index_report = downloader.fetch_batch(vec![task]).await;
        if !index_report.is_complete() {
            warn!("Asset index {} unavailable, no objects synchronized", info.id);
            report.failures = index_report.failures;
            return Ok(report);
        }
    }

    let raw = tokio::fs::read_to_string(&index_path)
        .await
        .map_err(LauncherError::io(&index_path))?;
    let index: AssetIndex =
        serde_json::from_str(&raw).map_err(|e| LauncherError::ManifestParse {
            document: "asset index",
            source_url: info.url.clone(),
            reason: e.to_string(),
        })?;

    // 2. Missing objects. Several virtual paths may share one hash; each
    // object file is written by a single task.
    let hashes: BTreeSet<&str> = index.objects.values().map(|o| o.hash.as_str()).collect();
    report.objects = hashes.len();

    let base = assets_base_url.trim_end_matches('/');
    let mut entries = Vec::new();
    for hash in hashes {
        let dest = store.asset_object_path(hash);
        if is_cached(&dest, Some(hash), verify_cached).await {
            continue;
        }

        let prefix = hash_prefix(hash);
        entries.push(
            DownloadTask::new(
                format!("{}/{}/{}", base, prefix, hash),
                store.asset_bucket_dir(hash),
                hash,
            )
            .with_sha1(hash),
        );
    }
    report.cached = report.objects - entries.len();

    info!(
        "Downloading {} asset objects ({} already cached)",
        entries.len(),
        report.cached
    );

    // 3. Download batch (retry pass included)
    let batch = downloader.fetch_batch(entries).await;
    if !batch.is_complete() {
        warn!("{} asset downloads failed", batch.failures.len());
    }
    report.failures = batch.failures;

    Ok(report)
}
