use crate::github::{ContentsResponse, ErrorResponse, PutContentsRequest, PutContentsResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

pub const GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";

/// A text blob as read from the remote store, with its revision marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub sha: String,
}

#[derive(Debug)]
pub enum StoreError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    /// The blob changed (or appeared) since it was last read.
    Conflict(String),
    /// The store refused the write for a reason other than a stale revision.
    Rejected { path: String, status: u16, message: String },
    Decode(String),
    Codec(String),
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            StoreError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            StoreError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            StoreError::Conflict(path) => {
                write!(f, "{path} was changed by someone else, reload and try again")
            }
            StoreError::Rejected { path, status, message } => {
                write!(f, "Write to {path} rejected ({status}): {message}")
            }
            StoreError::Decode(msg) => write!(f, "Could not decode stored content: {msg}"),
            StoreError::Codec(msg) => write!(f, "Malformed table: {msg}"),
            StoreError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Version-controlled blob storage addressed by path.
pub trait RemoteStore: Send + Sync {
    /// Fetch a blob; `Ok(None)` when it does not exist.
    fn read(&self, path: &str) -> impl Future<Output = StoreResult<Option<RemoteFile>>> + Send;

    /// Create (`sha == None`) or replace the blob at `sha`. Returns the new sha.
    fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> impl Future<Output = StoreResult<String>> + Send;
}

// ---------------------------------------------------------------------------
// GitHub contents API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: String,
    /// `owner/repository`
    pub repo: String,
    pub branch: String,
    pub api_url: String,
}

impl GithubConfig {
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_string(),
            api_url: GITHUB_API.to_string(),
        }
    }
}

/// Remote store backed by files in a GitHub repository branch.
#[derive(Debug, Clone)]
pub struct GithubStore {
    client: Client,
    config: GithubConfig,
    timeout: Duration,
}

impl GithubStore {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("foostui/0.1 (foosball league tracker)")
                .build()
                .unwrap_or_default(),
            config,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn branch(&self) -> &str {
        &self.config.branch
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.repo,
            path.trim_start_matches('/')
        )
    }
}

impl RemoteStore for GithubStore {
    async fn read(&self, path: &str) -> StoreResult<Option<RemoteFile>> {
        let url = format!("{}?ref={}", self.contents_url(path), self.config.branch);
        debug!("reading {path} from {}", self.config.repo);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.clone()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let raw: ContentsResponse = response
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.clone()))?
            .json()
            .await
            .map_err(|e| StoreError::Parsing(e, url.clone()))?;

        if !raw.encoding.is_empty() && raw.encoding != "base64" {
            return Err(StoreError::Decode(format!(
                "unsupported encoding {} for {path}",
                raw.encoding
            )));
        }
        let content = decode_content(&raw.content)?;
        Ok(Some(RemoteFile { content, sha: raw.sha }))
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> StoreResult<String> {
        let url = self.contents_url(path);
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(content),
            branch: &self.config.branch,
            sha,
        };
        debug!("writing {path} to {} ({message})", self.config.repo);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.clone()))?;

        // 409: sha no longer matches the branch head. 422 is only a conflict
        // when it complains about the sha (missing for an existing file).
        let status = response.status();
        if status == StatusCode::CONFLICT {
            warn!("write to {path} rejected with {status}");
            return Err(StoreError::Conflict(path.to_owned()));
        }
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_default();
            warn!("write to {path} rejected with {status}: {message}");
            if is_revision_complaint(&message) {
                return Err(StoreError::Conflict(path.to_owned()));
            }
            return Err(StoreError::Rejected {
                path: path.to_owned(),
                status: status.as_u16(),
                message,
            });
        }

        let raw: PutContentsResponse = response
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.clone()))?
            .json()
            .await
            .map_err(|e| StoreError::Parsing(e, url.clone()))?;

        raw.content
            .map(|c| c.sha)
            .ok_or_else(|| StoreError::Other(format!("no blob sha returned for {path}")))
    }
}

fn is_revision_complaint(message: &str) -> bool {
    message.to_ascii_lowercase().contains("sha")
}

fn decode_content(encoded: &str) -> StoreResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// In-process store
// ---------------------------------------------------------------------------

/// Keeps blobs in memory with the same create/replace rules as GitHub.
/// Used when no repository is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, RemoteFile>>,
    failing: Mutex<HashSet<String>>,
    revision: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `path` fail until cleared.
    pub fn set_failing(&self, path: &str, failing: bool) {
        if let Ok(mut set) = self.failing.lock() {
            if failing {
                set.insert(path.to_owned());
            } else {
                set.remove(path);
            }
        }
    }

    /// Replace a blob as another writer would, bumping its sha.
    pub fn overwrite(&self, path: &str, content: &str) {
        let sha = self.next_sha();
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(path.to_owned(), RemoteFile { content: content.to_owned(), sha });
        }
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.blobs.lock().ok()?.get(path).map(|f| f.content.clone())
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn next_sha(&self) -> String {
        format!("{:040x}", self.revision.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn lock_blobs(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, RemoteFile>>> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Other("memory store poisoned".into()))
    }
}

impl RemoteStore for MemoryStore {
    async fn read(&self, path: &str) -> StoreResult<Option<RemoteFile>> {
        Ok(self.lock_blobs()?.get(path).cloned())
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        sha: Option<&str>,
    ) -> StoreResult<String> {
        let is_failing = self
            .failing
            .lock()
            .map(|set| set.contains(path))
            .unwrap_or(false);
        if is_failing {
            return Err(StoreError::Other(format!("write to {path} refused")));
        }

        let mut blobs = self.lock_blobs()?;
        let current = blobs.get(path).map(|f| f.sha.as_str());
        if current != sha {
            return Err(StoreError::Conflict(path.to_owned()));
        }

        let sha = self.next_sha();
        blobs.insert(
            path.to_owned(),
            RemoteFile { content: content.to_owned(), sha: sha.clone() },
        );
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(sha)
    }
}
