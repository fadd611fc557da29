use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::downloader::RetryPolicy;
use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "prelaunch";
const SETTINGS_FILE: &str = "launcher_settings.json";

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Tunables for one launcher root, persisted as `launcher_settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub manifest_url: String,
    pub assets_base_url: String,
    /// Maximum in-flight downloads per batch.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub timeout_secs: u64,
    /// Re-hash cached libraries and assets instead of trusting their presence.
    pub verify_cached: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            manifest_url: VERSION_MANIFEST_URL.to_string(),
            assets_base_url: RESOURCES_URL.to_string(),
            concurrency: 8,
            retry: RetryPolicy::default(),
            timeout_secs: 30,
            verify_cached: false,
        }
    }
}

impl PipelineSettings {
    /// Settings stored under `root`, or the defaults when the file is
    /// missing or unreadable.
    pub fn load(root: &Path) -> Self {
        let path = root.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Corrupt settings at {:?}: {} (using defaults)", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, root: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(root).map_err(LauncherError::io(root))?;
        let path = root.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(LauncherError::io(&path))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Default launcher root: `<data dir>/prelaunch`.
pub fn default_root_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
