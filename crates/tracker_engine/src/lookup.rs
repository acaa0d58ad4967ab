use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracker_logging::tracker_debug;

use crate::{LookupError, LookupFailureKind};

#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub api_base: String,
    /// `owner/name` of the repository the pull requests belong to.
    pub repository: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            repository: "nixos/nixpkgs".to_string(),
            token: None,
            user_agent: "nixtracker".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Answers whether a pull request has reached a branch.
#[async_trait::async_trait]
pub trait BranchLookup: Send + Sync {
    async fn is_merged(&self, pr: u32, branch: &str) -> Result<bool, LookupError>;
}

/// Result of comparing a branch head against a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareStatus {
    Diverged,
    Ahead,
    Behind,
    Identical,
}

impl CompareStatus {
    /// The commit is reachable from the branch head.
    pub fn contains_commit(self) -> bool {
        matches!(self, CompareStatus::Behind | CompareStatus::Identical)
    }
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    merge_commit_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    status: CompareStatus,
}

/// Looks branch inclusion up through the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubLookup {
    settings: LookupSettings,
    client: reqwest::Client,
    /// Resolved merge commits by PR. Clones share it.
    merge_commits: Arc<Mutex<HashMap<u32, String>>>,
}

impl GithubLookup {
    pub fn new(settings: LookupSettings) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| LookupError::new(LookupFailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            merge_commits: Arc::default(),
        })
    }

    /// Resolves the merge commit of a pull request, once per PR.
    ///
    /// Concurrent lookups for the same query wait on the first request
    /// instead of repeating it. Failures are not cached.
    pub async fn merge_commit(&self, pr: u32) -> Result<String, LookupError> {
        let mut cache = self.merge_commits.lock().await;
        if let Some(sha) = cache.get(&pr) {
            return Ok(sha.clone());
        }
        let sha = self.fetch_merge_commit(pr).await?;
        cache.insert(pr, sha.clone());
        Ok(sha)
    }

    async fn fetch_merge_commit(&self, pr: u32) -> Result<String, LookupError> {
        let url = self.endpoint(&format!("pulls/{pr}"))?;
        let pull: PullResponse = match self.get_json(url).await {
            Err(err) if err.kind == LookupFailureKind::HttpStatus(404) => {
                return Err(LookupError::new(
                    LookupFailureKind::NotFound,
                    format!("pull request {pr} does not exist"),
                ));
            }
            other => other?,
        };
        pull.merge_commit_sha.ok_or_else(|| {
            LookupError::new(
                LookupFailureKind::NotFound,
                format!("pull request {pr} has no merge_commit_sha"),
            )
        })
    }

    /// Compares `branch` against `sha`.
    pub async fn compare(&self, branch: &str, sha: &str) -> Result<CompareStatus, LookupError> {
        let url = self.endpoint(&format!("compare/{branch}...{sha}"))?;
        let response: CompareResponse = self.get_json(url).await?;
        Ok(response.status)
    }

    fn endpoint(&self, tail: &str) -> Result<reqwest::Url, LookupError> {
        let raw = format!(
            "{}/repos/{}/{}",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.repository,
            tail
        );
        reqwest::Url::parse(&raw)
            .map_err(|err| LookupError::new(LookupFailureKind::InvalidRequest, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, LookupError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = self.settings.token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        tracker_debug!("GET {} -> {}", url, status);
        if status != StatusCode::OK {
            return Err(LookupError::new(
                LookupFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| LookupError::new(LookupFailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl BranchLookup for GithubLookup {
    async fn is_merged(&self, pr: u32, branch: &str) -> Result<bool, LookupError> {
        let sha = self.merge_commit(pr).await?;
        let status = self.compare(branch, &sha).await?;
        tracker_debug!("pr {} on {}: {:?}", pr, branch, status);
        Ok(status.contains_commit())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        return LookupError::new(LookupFailureKind::Timeout, err.to_string());
    }
    LookupError::new(LookupFailureKind::Network, err.to_string())
}
