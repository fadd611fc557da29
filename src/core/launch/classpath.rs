// ─── Classpath Builder ───
// Ensures every library artifact is in the store and returns the ordered
// classpath for the target OS.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::downloader::{DownloadTask, Downloader, FailedDownload};
use crate::core::platform::TargetOs;
use crate::core::store::{is_cached, ContentStore};
use crate::core::version::VersionDescriptor;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClasspathReport {
    /// Library jars in descriptor order, whether or not they downloaded.
    pub entries: Vec<PathBuf>,
    pub failures: Vec<FailedDownload>,
}

/// Resolve the library classpath for `os`.
///
/// Order is fixed before anything is downloaded, so it follows the
/// descriptor no matter how the batch completes. Libraries whose rules
/// exclude `os` never appear.
pub async fn resolve_classpath(
    store: &ContentStore,
    descriptor: &VersionDescriptor,
    os: TargetOs,
    downloader: &Downloader,
    verify_cached: bool,
) -> ClasspathReport {
    let mut entries: Vec<PathBuf> = Vec::new();
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();

    for lib in &descriptor.libraries {
        if !lib.is_allowed_for(os) {
            debug!("Skipping library (OS rule): {}", lib.name);
            continue;
        }

        let Some(artifact) = lib.artifact() else {
            continue;
        };

        let dest = store.library_path(&artifact.path);
        // Some descriptors list the same artifact twice.
        if !seen.insert(dest.clone()) {
            continue;
        }

        if !is_cached(&dest, Some(&artifact.sha1), verify_cached).await {
            if let (Some(directory), Some(name)) = (dest.parent(), dest.file_name()) {
                tasks.push(
                    DownloadTask::new(&artifact.url, directory, name.to_string_lossy())
                        .with_sha1(&artifact.sha1),
                );
            }
        }

        entries.push(dest);
    }

    info!(
        "Classpath has {} libraries ({} to download)",
        entries.len(),
        tasks.len()
    );

    let batch = downloader.fetch_batch(tasks).await;

    ClasspathReport {
        entries,
        failures: batch.failures,
    }
}

/// Join classpath entries with the separator `os` expects.
pub fn classpath_string(entries: &[PathBuf], os: TargetOs) -> String {
    entries
        .iter()
        .map(|entry| entry.to_string_lossy())
        .collect::<Vec<_>>()
        .join(os.classpath_separator())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::downloader::testing::{fixture_body, ScriptedFetcher};
    use crate::core::version::version_file::sample_descriptor_json;

    const PATCHY_URL: &str = "https://libraries.test/com/mojang/patchy/1.1/patchy-1.1.jar";
    const GSON_URL: &str = "https://libraries.test/com/google/code/gson/gson-2.8.0.jar";
    const OBJC_URL: &str = "https://libraries.test/ca/weblite/java-objc-bridge-1.0.0.jar";

    fn descriptor() -> VersionDescriptor {
        serde_json::from_value(sample_descriptor_json()).unwrap()
    }

    fn fixture() -> Arc<ScriptedFetcher> {
        let fetcher = Arc::new(ScriptedFetcher::new());
        for url in [PATCHY_URL, GSON_URL, OBJC_URL] {
            fetcher.serve_fixture(url);
        }
        fetcher
    }

    #[tokio::test]
    async fn classpath_follows_descriptor_order() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(temp.path());
        let fetcher = fixture();
        // Make the first library finish last.
        fetcher.fail_first(PATCHY_URL, 1);
        let downloader = Downloader::new(fetcher.clone()).with_concurrency(4);

        let report = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;

        assert!(report.failures.is_empty());
        assert_eq!(
            report.entries,
            vec![
                store.library_path("com/mojang/patchy/1.1/patchy-1.1.jar"),
                store.library_path("com/google/code/gson/gson/2.8.0/gson-2.8.0.jar"),
            ]
        );
        assert!(report.entries.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn second_run_against_populated_store_is_offline() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(temp.path());
        let fetcher = fixture();
        let downloader = Downloader::new(fetcher.clone());

        let first = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;
        let calls_after_first = fetcher.call_count();
        let second = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;

        assert_eq!(calls_after_first, 2);
        assert_eq!(fetcher.call_count(), calls_after_first);
        assert_eq!(first.entries, second.entries);
    }

    #[tokio::test]
    async fn os_rules_exclude_libraries() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(temp.path());
        let fetcher = fixture();
        let downloader = Downloader::new(fetcher.clone());

        let linux = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;
        assert!(!linux
            .entries
            .iter()
            .any(|p| p.to_string_lossy().contains("java-objc-bridge")));
        assert_eq!(fetcher.calls_to(OBJC_URL), 0);

        let osx = resolve_classpath(&store, &descriptor(), TargetOs::Osx, &downloader, false).await;
        assert_eq!(osx.entries.len(), 3);
        assert!(osx.entries[1].ends_with("java-objc-bridge-1.0.0.jar"));
    }

    #[tokio::test]
    async fn failed_libraries_are_reported_but_keep_their_slot() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(temp.path());
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.serve_fixture(PATCHY_URL);
        let downloader = Downloader::new(fetcher);

        let report = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task.url, GSON_URL);
        assert_eq!(report.failures[0].task.name, "gson-2.8.0.jar");
    }

    #[tokio::test]
    async fn verification_refetches_corrupt_cache_entries() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(temp.path());
        let fetcher = fixture();
        let downloader = Downloader::new(fetcher.clone());
        let gson = store.library_path("com/google/code/gson/gson/2.8.0/gson-2.8.0.jar");

        resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;
        std::fs::write(&gson, b"corrupt").unwrap();

        // Presence alone is trusted unless verification is on.
        resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;
        assert_eq!(fetcher.calls_to(GSON_URL), 1);

        let report = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, true).await;
        assert!(report.failures.is_empty());
        assert_eq!(fetcher.calls_to(GSON_URL), 2);
        assert_eq!(std::fs::read(&gson).unwrap(), fixture_body(GSON_URL));
    }

    #[tokio::test]
    async fn artifacts_are_checked_against_their_hash() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::new(temp.path());
        let fetcher = fixture();
        fetcher.serve(GSON_URL, b"tampered".to_vec());
        let downloader = Downloader::new(fetcher);

        let report = resolve_classpath(&store, &descriptor(), TargetOs::Linux, &downloader, false).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task.url, GSON_URL);
        assert!(report.failures[0].task.sha1.is_some());
        assert!(!report.entries[1].exists());
    }

    #[test]
    fn classpath_string_uses_target_separator() {
        let entries = vec![PathBuf::from("/a.jar"), PathBuf::from("/b.jar")];
        assert_eq!(classpath_string(&entries, TargetOs::Linux), "/a.jar:/b.jar");
        assert_eq!(classpath_string(&entries, TargetOs::Windows), "/a.jar;/b.jar");
    }
}
