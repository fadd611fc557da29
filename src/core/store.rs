// ─── Content Store ───
// On-disk layout shared by every acquisition step. External tooling relies
// on these paths, so they only ever grow.

use std::io::Read;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// `libraries/<artifact path>`
    pub fn library_path(&self, artifact_path: &str) -> PathBuf {
        self.libraries_dir().join(artifact_path)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_indexes_dir(&self) -> PathBuf {
        self.assets_dir().join("indexes")
    }

    /// `assets/indexes/<id>.json`
    pub fn asset_index_path(&self, index_id: &str) -> PathBuf {
        self.asset_indexes_dir().join(format!("{index_id}.json"))
    }

    /// `assets/objects/<hash[0:2]>`
    pub fn asset_bucket_dir(&self, hash: &str) -> PathBuf {
        self.assets_dir().join("objects").join(hash_prefix(hash))
    }

    /// `assets/objects/<hash[0:2]>/<hash>`
    pub fn asset_object_path(&self, hash: &str) -> PathBuf {
        self.asset_bucket_dir(hash).join(hash)
    }

    pub fn natives_root(&self) -> PathBuf {
        self.root.join("natives")
    }

    /// `versions/<version number>/`, home of the client jar and descriptor.
    pub fn version_dir(&self, version_number: &str) -> PathBuf {
        self.root.join("versions").join(version_number)
    }
}

/// Two-character bucket of a content hash.
pub fn hash_prefix(hash: &str) -> &str {
    hash.get(..2).unwrap_or(hash)
}

/// Whether `path` can be used without fetching it again.
///
/// Presence alone counts unless `verify` is set and a hash is known, in
/// which case the file is re-hashed. A mismatching file is treated as
/// missing and will be overwritten.
pub async fn is_cached(path: &Path, sha1: Option<&str>, verify: bool) -> bool {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return false;
    }

    let Some(expected) = sha1.filter(|_| verify) else {
        return true;
    };

    let owned = path.to_path_buf();
    match tokio::task::spawn_blocking(move || sha1_file(&owned)).await {
        Ok(Ok(actual)) if actual.eq_ignore_ascii_case(expected) => true,
        Ok(Ok(actual)) => {
            warn!(
                "Cached file {:?} is corrupt (expected {}, got {}), fetching again",
                path, expected, actual
            );
            false
        }
        Ok(Err(e)) => {
            warn!("Cannot verify {:?}: {}", path, e);
            false
        }
        Err(e) => {
            warn!("Verification task for {:?} failed: {}", path, e);
            false
        }
    }
}

/// Hex SHA-1 of a file, read in chunks.
pub fn sha1_file(path: &Path) -> LauncherResult<String> {
    let mut file = std::fs::File::open(path).map_err(LauncherError::io(path))?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer).map_err(LauncherError::io(path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
