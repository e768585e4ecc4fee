//! Publishing a fix: branch, commit, push, then open a pull request.

use std::path::Path;
use std::process::Stdio;

use chrono::{DateTime, Utc};
use fixloop_config::GithubConfig;
use fixloop_core::issue::Issue;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::client::{ClientError, GitHubClient};

/// Publication errors. All of them are fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Publishing is not configured: {0}")]
    NotConfigured(String),

    #[error("`{command}` failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("Pull request creation failed ({status}): {body}")]
    PullRequest { status: u16, body: String },

    #[error("GitHub request failed: {0}")]
    Http(String),
}

impl From<ClientError> for PublishError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Transport(e) | ClientError::Decode(e) => PublishError::Http(e.to_string()),
            ClientError::Status(f) => PublishError::PullRequest {
                status: f.status,
                body: f.body,
            },
        }
    }
}

/// Body of `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestCreated {
    html_url: String,
}

/// What a successful publication produced.
#[derive(Debug, Clone)]
pub struct Published {
    pub branch: String,
    pub pr_url: String,
}

/// `fix/issue-{n}-{YYYYmmddHHMMSS}`, or `fix/local-{ts}` without a number.
pub fn branch_name(number: Option<u64>, at: DateTime<Utc>) -> String {
    let ts = at.format("%Y%m%d%H%M%S");
    match number {
        Some(n) => format!("fix/issue-{n}-{ts}"),
        None => format!("fix/local-{ts}"),
    }
}

/// Fill `{issue}` in the commit template.
pub fn commit_message(template: &str, number: Option<u64>) -> String {
    let issue = number.map(|n| n.to_string()).unwrap_or_else(|| "local".into());
    template.replace("{issue}", &issue)
}

fn pull_request_for(issue: &Issue, branch: &str, base: &str, summary: &str) -> PullRequest {
    let title = match (&issue.title, issue.number) {
        (Some(title), _) => format!("Fix: {title}"),
        (None, Some(n)) => format!("Fix issue #{n}"),
        (None, None) => "Automated fix".to_string(),
    };
    let mut body = match issue.number {
        Some(n) => format!("Closes #{n}.\n\nAutomated patch by fixloop."),
        None => "Automated patch by fixloop.".to_string(),
    };
    if !summary.trim().is_empty() {
        body.push_str("\n\n");
        body.push_str(summary.trim());
    }
    PullRequest {
        title,
        head: branch.to_string(),
        base: base.to_string(),
        body,
    }
}

/// Run one git command in `workdir`, returning stdout.
pub async fn git(workdir: &Path, args: &[&str]) -> Result<String, PublishError> {
    let command = format!("git {}", args.join(" "));
    debug!(%command, "Running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PublishError::Git {
            command: command.clone(),
            stderr: format!("Failed to run git: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        return Err(PublishError::Git { command, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

impl GitHubClient {
    /// `POST /repos/{owner}/{repo}/pulls`; anything but 201 is an error.
    pub async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr: &PullRequest,
    ) -> Result<String, PublishError> {
        let created: PullRequestCreated = self.post_json(owner, repo, "pulls", pr, 201).await?;
        Ok(created.html_url)
    }
}

/// Branch, commit and push the working tree, then open a pull request.
pub async fn publish(
    config: &GithubConfig,
    workdir: &Path,
    issue: &Issue,
    summary: &str,
) -> Result<Published, PublishError> {
    let (owner, repo) = config
        .repo_ref()
        .ok_or_else(|| PublishError::NotConfigured("github.owner and github.repo are required".into()))?;
    if config.token.is_none() {
        return Err(PublishError::NotConfigured("github.token is required to open a pull request".into()));
    }
    let client = GitHubClient::from_config(config).map_err(|e| PublishError::Http(e.to_string()))?;

    let branch = branch_name(issue.number, Utc::now());
    let message = commit_message(&config.commit_template, issue.number);

    git(workdir, &["checkout", "-b", &branch]).await?;
    git(workdir, &["add", "-A"]).await?;
    git(workdir, &["commit", "-m", &message]).await?;
    git(workdir, &["push", "-u", &config.remote, &branch]).await?;
    info!(%branch, remote = %config.remote, "Pushed fix branch");

    let pr = pull_request_for(issue, &branch, &config.base_branch, summary);
    let pr_url = client.create_pull_request(owner, repo, &pr).await?;
    info!(%pr_url, "Opened pull request");

    Ok(Published { branch, pr_url })
}
