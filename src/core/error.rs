use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launch preparation pipeline.
///
/// Only structural failures travel through this type. Per-artifact failures
/// inside a download batch are collected as values (see
/// [`FailedDownload`](crate::core::downloader::FailedDownload)) instead.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed {document} from {source_url}: {reason}")]
    ManifestParse {
        document: &'static str,
        source_url: String,
        reason: String,
    },

    // ── Resolution ──────────────────────────────────────
    #[error("Version {0} not found in manifest")]
    VersionNotFound(String),

    #[error("Unsupported platform: {0:?} (expected windows, osx or linux)")]
    UnsupportedPlatform(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to extract {archive:?}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// `map_err` adapter attaching the path an IO error happened at. There
    /// is no blanket `From<io::Error>`, so every IO error names its file.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LauncherError::Io { path, source }
    }
}
