use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use sha1::{Digest, Sha1};

use crate::core::error::{LauncherError, LauncherResult};

use super::fetcher::Fetcher;

/// Hex SHA-1 of `body`.
pub fn sha1_hex(body: &[u8]) -> String {
    hex::encode(Sha1::digest(body))
}

/// Body served for `url` by [`ScriptedFetcher::serve_fixture`]. Test
/// descriptors hash this same body, so fixtures verify like real downloads.
pub fn fixture_body(url: &str) -> Vec<u8> {
    url.as_bytes().to_vec()
}

/// In-memory fetcher for tests: serves fixed bodies, can fail the first N
/// attempts for a URL and records every call. Downloads that carry a SHA-1
/// are verified against the served body, as over HTTP.
#[derive(Default)]
pub struct ScriptedFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    failures_left: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    pub fn serve_fixture(&self, url: &str) {
        self.serve(url, fixture_body(url));
    }

    pub fn serve_json(&self, url: &str, value: &serde_json::Value) {
        self.serve(url, serde_json::to_vec(value).unwrap());
    }

    pub fn fail_first(&self, url: &str, attempts: u32) {
        self.failures_left
            .lock()
            .unwrap()
            .insert(url.to_string(), attempts);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }

    fn respond(&self, url: &str) -> LauncherResult<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(left) = self.failures_left.lock().unwrap().get_mut(url) {
            if *left > 0 {
                *left -= 1;
                return Err(LauncherError::DownloadFailed {
                    url: url.to_string(),
                    status: 503,
                });
            }
        }

        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| LauncherError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            })
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        expected_sha1: Option<&str>,
    ) -> LauncherResult<u64> {
        let body = self.respond(url)?;
        if let Some(expected) = expected_sha1 {
            let actual = sha1_hex(&body);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        tokio::fs::write(dest, &body)
            .await
            .map_err(LauncherError::io(dest))?;
        Ok(body.len() as u64)
    }

    async fn get_text(&self, url: &str) -> LauncherResult<String> {
        let body = self.respond(url)?;
        String::from_utf8(body).map_err(|e| LauncherError::Other(e.to_string()))
    }
}
