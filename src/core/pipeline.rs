// ─── Launch Pipeline ───
// Turns a version id into everything needed to start the game process:
// descriptor, client jar, libraries, assets, natives and arguments.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::assets::sync_assets;
use crate::core::auth::LaunchSession;
use crate::core::downloader::{Downloader, FailedDownload};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{
    build_game_arguments, extract_natives, resolve_classpath, select_platform_flag,
    ExtractionFailure, LaunchConfiguration,
};
use crate::core::platform::TargetOs;
use crate::core::settings::PipelineSettings;
use crate::core::store::ContentStore;
use crate::core::version::{acquire_client_jar, ManifestResolver};

#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub version_id: String,
    /// Descriptor OS name: `windows`, `osx` or `linux`.
    pub os: String,
    pub session: LaunchSession,
}

/// Per-artifact failures from every batch of one `prepare` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LaunchFailures {
    pub client_jar: Vec<FailedDownload>,
    pub libraries: Vec<FailedDownload>,
    pub assets: Vec<FailedDownload>,
    pub natives: Vec<FailedDownload>,
    pub extraction: Vec<ExtractionFailure>,
}

impl LaunchFailures {
    pub fn total(&self) -> usize {
        self.client_jar.len()
            + self.libraries.len()
            + self.assets.len()
            + self.natives.len()
            + self.extraction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// What the process launcher needs. Paths are absolute.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
    pub version: String,
    pub main_class: String,
    /// Libraries in descriptor order followed by the client jar.
    pub classpath: Vec<PathBuf>,
    pub jvm_flag: String,
    pub game_arguments: Vec<String>,
    pub natives_directory: PathBuf,
    pub failures: LaunchFailures,
}

pub struct LaunchPipeline {
    root: PathBuf,
    settings: PipelineSettings,
    downloader: Downloader,
    resolver: ManifestResolver,
}

impl LaunchPipeline {
    pub fn new(root: impl Into<PathBuf>, settings: PipelineSettings, downloader: Downloader) -> Self {
        let resolver = ManifestResolver::new(downloader.clone(), settings.manifest_url.clone());
        Self {
            root: root.into(),
            settings,
            downloader,
            resolver,
        }
    }

    /// Pipeline backed by HTTP, configured from `settings`.
    pub fn from_settings(root: impl Into<PathBuf>, settings: PipelineSettings) -> LauncherResult<Self> {
        let downloader = Downloader::from_settings(&settings)?;
        Ok(Self::new(root, settings, downloader))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquire everything `request` needs and build its launch plan.
    ///
    /// Structural problems (unknown OS, unknown version, unparseable
    /// documents, filesystem errors) abort with `Err`. Individual artifacts
    /// that could not be fetched or unpacked are listed in
    /// [`LaunchPlan::failures`] instead.
    pub async fn prepare(&self, request: &LaunchRequest) -> LauncherResult<LaunchPlan> {
        // 1. Platform, before any network traffic
        let jvm_flag = select_platform_flag(&request.os)?;
        let os: TargetOs = request.os.parse()?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(LauncherError::io(&self.root))?;
        // Absolute but not canonical: canonical paths on Windows carry a
        // verbatim prefix the JVM rejects.
        let root = std::path::absolute(&self.root).map_err(LauncherError::io(&self.root))?;
        let store = ContentStore::new(root);

        // 2. Version descriptor
        let resolved = self.resolver.resolve_version(&request.version_id).await?;
        let descriptor = &resolved.descriptor;
        info!(
            "Preparing {} ({}) for {}",
            descriptor.id,
            descriptor.version_type(),
            os
        );

        // 3. Client jar, libraries, assets and natives
        let version_dir = store.version_dir(&request.version_id);
        let verify = self.settings.verify_cached;
        let (jar, classpath, assets, natives) = tokio::join!(
            acquire_client_jar(&resolved, &request.version_id, &version_dir, &self.downloader),
            resolve_classpath(&store, descriptor, os, &self.downloader, verify),
            sync_assets(
                &store,
                descriptor,
                &self.settings.assets_base_url,
                &self.downloader,
                verify,
            ),
            extract_natives(&store, descriptor, os, &self.downloader),
        );
        let natives = natives?;
        let (jar, assets) = match (jar, assets) {
            (Ok(jar), Ok(assets)) => (jar, assets),
            (Err(e), _) | (_, Err(e)) => {
                // The plan never reaches a caller, so nothing else will use
                // or remove this launch's natives directory.
                if let Err(cleanup) = tokio::fs::remove_dir_all(&natives.directory).await {
                    warn!("Cannot remove natives directory {:?}: {}", natives.directory, cleanup);
                }
                return Err(e);
            }
        };

        let mut entries = classpath.entries;
        entries.push(version_dir.join(format!("{}.jar", request.version_id)));

        // 4. Arguments
        let config = LaunchConfiguration {
            root: store.root().to_path_buf(),
            descriptor,
            version_number: request.version_id.clone(),
            version_type: descriptor.version_type().to_string(),
            os,
            session: &request.session,
        };
        let game_arguments = build_game_arguments(&config);

        let failures = LaunchFailures {
            client_jar: jar.failures,
            libraries: classpath.failures,
            assets: assets.failures,
            natives: natives.failures,
            extraction: natives.extraction_failures,
        };
        if failures.is_empty() {
            info!("{} is ready to launch", request.version_id);
        } else {
            warn!(
                "{} prepared with {} failed artifacts",
                request.version_id,
                failures.total()
            );
        }

        Ok(LaunchPlan {
            version: request.version_id.clone(),
            main_class: descriptor.main_class.clone(),
            classpath: entries,
            jvm_flag: jvm_flag.to_string(),
            game_arguments,
            natives_directory: natives.directory,
            failures,
        })
    }
}
