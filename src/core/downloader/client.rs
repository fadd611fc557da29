use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::LauncherResult;
use crate::core::http::build_http_client;
use crate::core::settings::PipelineSettings;

use super::fetcher::{Fetcher, HttpFetcher};

const DEFAULT_CONCURRENCY: usize = 8;

/// One remote object destined for one local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    pub url: String,
    pub directory: PathBuf,
    pub name: String,
    /// Expected SHA-1 of the body, checked while streaming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            directory: directory.into(),
            name: name.into(),
            sha1: None,
        }
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }

    pub fn destination(&self) -> PathBuf {
        self.directory.join(&self.name)
    }
}

/// A task that did not complete, kept verbatim so it can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDownload {
    pub task: DownloadTask,
    pub error: String,
}

/// Outcome of a single [`Downloader::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    Completed,
    Failed(FailedDownload),
}

impl DownloadResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, DownloadResult::Completed)
    }

    pub fn failed_task(&self) -> Option<&DownloadTask> {
        match self {
            DownloadResult::Completed => None,
            DownloadResult::Failed(failure) => Some(&failure.task),
        }
    }

    fn into_failure(self) -> Option<FailedDownload> {
        match self {
            DownloadResult::Completed => None,
            DownloadResult::Failed(failure) => Some(failure),
        }
    }
}

/// Result of a whole batch after its retry passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub requested: usize,
    pub failures: Vec<FailedDownload>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.requested - self.failures.len()
    }
}

/// How often failed tasks of a batch are re-attempted.
///
/// Retries run sequentially after the concurrent pass. With a non-zero
/// backoff, retry pass `n` waits `backoff * 2^n` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            backoff_ms: 0,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, retry: u32) -> Duration {
        Duration::from_millis(self.backoff_ms).saturating_mul(2_u32.saturating_pow(retry))
    }
}

/// Bounded concurrent downloader shared by every acquisition step.
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    /// Maximum number of in-flight transfers per batch.
    concurrency: usize,
    retry: RetryPolicy,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }

    /// HTTP downloader configured from the pipeline settings.
    pub fn from_settings(settings: &PipelineSettings) -> LauncherResult<Self> {
        let client = build_http_client(settings.timeout())?;
        Ok(Self::new(Arc::new(HttpFetcher::new(client)))
            .with_concurrency(settings.concurrency)
            .with_retry(settings.retry))
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn fetch_text(&self, url: &str) -> LauncherResult<String> {
        self.fetcher.get_text(url).await
    }

    // ── Single file download ────────────────────────────

    /// Download one task. Never returns an error: every failure, including
    /// creating the destination directory, is reported in the result with
    /// the original task attached.
    pub async fn fetch(&self, task: &DownloadTask) -> DownloadResult {
        if let Err(e) = tokio::fs::create_dir_all(&task.directory).await {
            warn!("Cannot create {:?}: {}", task.directory, e);
            return DownloadResult::Failed(FailedDownload {
                task: task.clone(),
                error: format!("IO error at {:?}: {}", task.directory, e),
            });
        }

        let dest = task.destination();
        match self
            .fetcher
            .download_to(&task.url, &dest, task.sha1.as_deref())
            .await
        {
            Ok(bytes) => {
                debug!("Downloaded: {} -> {:?} ({} bytes)", task.url, dest, bytes);
                DownloadResult::Completed
            }
            Err(e) => {
                warn!("Download failed: {}: {}", task.url, e);
                DownloadResult::Failed(FailedDownload {
                    task: task.clone(),
                    error: e.to_string(),
                })
            }
        }
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download every task with at most `concurrency` in flight, then run
    /// the retry passes over whatever failed.
    pub async fn fetch_batch(&self, tasks: Vec<DownloadTask>) -> BatchReport {
        let requested = tasks.len();
        if requested == 0 {
            return BatchReport::default();
        }

        info!(
            "Starting batch download: {} files, concurrency={}",
            requested, self.concurrency
        );

        let mut failures: Vec<FailedDownload> = stream::iter(tasks)
            .map(|task| {
                let downloader = self;
                async move { downloader.fetch(&task).await.into_failure() }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|failure| async move { failure })
            .collect()
            .await;

        for retry in 0..self.retry.retries {
            if failures.is_empty() {
                break;
            }

            let delay = self.retry.delay(retry);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            warn!(
                "Retrying {} failed downloads (pass {}/{})",
                failures.len(),
                retry + 1,
                self.retry.retries
            );

            let mut still_failing = Vec::new();
            for failure in failures {
                if let Some(failure) = self.fetch(&failure.task).await.into_failure() {
                    still_failing.push(failure);
                }
            }
            failures = still_failing;
        }

        // Completion order is arbitrary; keep reports stable.
        failures.sort_by_key(|f| f.task.destination());

        if !failures.is_empty() {
            warn!("{} of {} downloads failed", failures.len(), requested);
        }

        BatchReport {
            requested,
            failures,
        }
    }
}
