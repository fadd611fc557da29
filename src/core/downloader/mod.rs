mod client;
mod fetcher;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{BatchReport, DownloadResult, DownloadTask, Downloader, FailedDownload, RetryPolicy};
pub use fetcher::{Fetcher, HttpFetcher};
