//! Loading the issue text: GitHub first when configured, local file otherwise.

use std::path::PathBuf;

use fixloop_config::AppConfig;
use fixloop_core::issue::{Issue, IssueOrigin};
use serde::Deserialize;
use tracing::{info, warn};

use crate::client::{ClientError, GitHubClient};

/// Issue loading errors.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("GitHub request failed: {0}")]
    Http(String),

    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid issue payload: {0}")]
    Decode(String),

    #[error("Failed to read issue file {path}: {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ClientError> for IssueError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Transport(e) => IssueError::Http(e.to_string()),
            ClientError::Status(f) => IssueError::Status {
                status: f.status,
                body: f.body,
            },
            ClientError::Decode(e) => IssueError::Decode(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
}

impl GitHubClient {
    /// `GET /repos/{owner}/{repo}/issues/{number}`.
    pub async fn fetch_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue, IssueError> {
        let payload: IssuePayload = self
            .get_json(owner, repo, &format!("issues/{number}"))
            .await?;
        Ok(Issue {
            number: Some(payload.number),
            title: Some(payload.title),
            body: payload.body.unwrap_or_default(),
            origin: IssueOrigin::GitHub {
                owner: owner.to_string(),
                repo: repo.to_string(),
                number,
            },
        })
    }
}

/// Read the issue text from a local file.
pub async fn read_local_issue(path: impl Into<PathBuf>) -> Result<Issue, IssueError> {
    let path = path.into();
    let body = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| IssueError::LocalRead {
            path: path.clone(),
            source,
        })?;
    Ok(Issue::from_local(path, body))
}

/// Resolve the issue for this run.
///
/// GitHub is tried only when owner, repo and issue number are all set. Any
/// failure there is logged and the local file is used instead; only a
/// failing local read is an error.
pub async fn load_issue(config: &AppConfig) -> Result<Issue, IssueError> {
    if let Some((owner, repo, number)) = config.github.issue_ref() {
        match fetch_remote(config, owner, repo, number).await {
            Ok(issue) => {
                info!(issue = %issue.origin, "Loaded issue from GitHub");
                return Ok(issue);
            }
            Err(e) => {
                warn!(
                    owner,
                    repo,
                    number,
                    error = %e,
                    fallback = %config.issue.local_file.display(),
                    "GitHub issue fetch failed; using local issue file"
                );
            }
        }
    }

    let mut issue = read_local_issue(&config.issue.local_file).await?;
    // Keep the configured number so the branch and commit still reference it.
    issue.number = config.github.issue_number;
    info!(issue = %issue.origin, "Loaded issue from local file");
    Ok(issue)
}

async fn fetch_remote(config: &AppConfig, owner: &str, repo: &str, number: u64) -> Result<Issue, IssueError> {
    let client = GitHubClient::from_config(&config.github).map_err(|e| IssueError::Http(e.to_string()))?;
    client.fetch_issue(owner, repo, number).await
}
