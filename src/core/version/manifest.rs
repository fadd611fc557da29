// ─── Version Manifest ───
// Fetches the version manifest and resolves a version id to its descriptor.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};

use super::version_file::VersionDescriptor;

/// Top-level version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(rename = "releaseTime", default)]
    pub release_time: Option<DateTime<Utc>>,
}

impl VersionManifest {
    /// First entry whose id equals `id`.
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// A descriptor together with the exact JSON it was parsed from, so the
/// document can be persisted verbatim next to the client jar.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    pub descriptor: VersionDescriptor,
    pub raw: String,
}

pub struct ManifestResolver {
    downloader: Downloader,
    manifest_url: String,
}

impl ManifestResolver {
    pub fn new(downloader: Downloader, manifest_url: impl Into<String>) -> Self {
        Self {
            downloader,
            manifest_url: manifest_url.into(),
        }
    }

    /// Fetch the manifest. It is never cached; every call goes to the network.
    pub async fn fetch_manifest(&self) -> LauncherResult<VersionManifest> {
        info!("Fetching version manifest from {}", self.manifest_url);

        let raw = self.downloader.fetch_text(&self.manifest_url).await?;
        let manifest: VersionManifest =
            serde_json::from_str(&raw).map_err(|e| LauncherError::ManifestParse {
                document: "version manifest",
                source_url: self.manifest_url.clone(),
                reason: e.to_string(),
            })?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Resolve `version_id` to its full descriptor.
    pub async fn resolve_version(&self, version_id: &str) -> LauncherResult<ResolvedVersion> {
        let manifest = self.fetch_manifest().await?;

        let entry = manifest
            .find_version(version_id)
            .ok_or_else(|| LauncherError::VersionNotFound(version_id.to_string()))?;

        let raw = self.downloader.fetch_text(&entry.url).await?;
        let descriptor = VersionDescriptor::parse(&raw, &entry.url)?;

        info!("Resolved version {} ({})", descriptor.id, entry.url);
        Ok(ResolvedVersion { descriptor, raw })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::downloader::testing::ScriptedFetcher;
    use crate::core::version::version_file::sample_descriptor_json;

    const MANIFEST_URL: &str = "https://launcher.test/version_manifest.json";

    fn fixture() -> (Arc<ScriptedFetcher>, ManifestResolver) {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.serve_json(
            MANIFEST_URL,
            &serde_json::json!({
                "latest": { "release": "1.12.2", "snapshot": "17w45a" },
                "versions": [
                    { "id": "17w45a", "type": "snapshot", "url": "https://launcher.test/17w45a.json", "releaseTime": "2017-11-08T13:17:29+00:00" },
                    { "id": "1.12.2", "type": "release", "url": "https://launcher.test/1.12.2.json" },
                    { "id": "1.12.1", "url": "https://launcher.test/1.12.1.json" }
                ]
            }),
        );

        for id in ["17w45a", "1.12.2", "1.12.1"] {
            let mut descriptor = sample_descriptor_json();
            descriptor["id"] = serde_json::Value::String(id.to_string());
            fetcher.serve_json(&format!("https://launcher.test/{id}.json"), &descriptor);
        }

        let resolver = ManifestResolver::new(Downloader::new(fetcher.clone()), MANIFEST_URL);
        (fetcher, resolver)
    }

    #[tokio::test]
    async fn resolves_every_listed_version() {
        let (_, resolver) = fixture();
        for id in ["17w45a", "1.12.2", "1.12.1"] {
            let resolved = resolver.resolve_version(id).await.unwrap();
            assert_eq!(resolved.descriptor.id, id);
            assert!(resolved.raw.contains(id));
        }
    }

    #[tokio::test]
    async fn absent_version_is_an_error() {
        let (_, resolver) = fixture();
        let err = resolver.resolve_version("1.99").await.unwrap_err();
        assert!(matches!(err, LauncherError::VersionNotFound(ref id) if id == "1.99"));
    }

    #[tokio::test]
    async fn manifest_is_fetched_on_every_call() {
        let (fetcher, resolver) = fixture();
        resolver.resolve_version("1.12.2").await.unwrap();
        resolver.resolve_version("1.12.2").await.unwrap();
        assert_eq!(fetcher.calls_to(MANIFEST_URL), 2);
    }

    #[tokio::test]
    async fn malformed_manifest_is_a_parse_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.serve(MANIFEST_URL, b"<html>maintenance</html>".to_vec());
        let resolver = ManifestResolver::new(Downloader::new(fetcher), MANIFEST_URL);

        let err = resolver.resolve_version("1.12.2").await.unwrap_err();
        assert!(matches!(
            err,
            LauncherError::ManifestParse {
                document: "version manifest",
                ..
            }
        ));
    }

    #[test]
    fn deserialize_manifest_entry() {
        let json = r#"{
            "id": "1.20.4",
            "type": "release",
            "releaseTime": "2023-12-07T08:00:00+00:00",
            "url": "https://example.com/1.20.4.json",
            "sha1": "abc123"
        }"#;
        let entry: VersionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "1.20.4");
        assert_eq!(entry.version_type.as_deref(), Some("release"));
        assert!(entry.release_time.is_some());
    }
}
