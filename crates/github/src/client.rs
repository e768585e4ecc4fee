//! Minimal GitHub REST client.

use std::time::Duration;

use fixloop_config::GithubConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

const USER_AGENT: &str = "fixloop";
const ACCEPT: &str = "application/vnd.github+json";
const TIMEOUT_SECS: u64 = 30;

/// A non-2xx (or unexpected) reply from the API.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub status: u16,
    pub body: String,
}

/// Talks to `{api_base}/repos/...` with the headers GitHub expects.
#[derive(Clone)]
pub struct GitHubClient {
    api_base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn from_config(config: &GithubConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.api_base.clone(), config.token.clone())
    }

    fn url(&self, owner: &str, repo: &str, tail: &str) -> String {
        format!("{}/repos/{owner}/{repo}/{tail}", self.api_base)
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Accept", ACCEPT).header("User-Agent", USER_AGENT);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET a repo-scoped resource and decode it.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        owner: &str,
        repo: &str,
        tail: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .with_headers(self.client.get(self.url(owner, repo, tail)))
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status(ApiFailure {
                status: status.as_u16(),
                body,
            }));
        }
        response.json::<T>().await.map_err(ClientError::Decode)
    }

    /// POST a JSON body to a repo-scoped resource, requiring `expected` back.
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        owner: &str,
        repo: &str,
        tail: &str,
        body: &B,
        expected: u16,
    ) -> Result<T, ClientError> {
        let response = self
            .with_headers(self.client.post(self.url(owner, repo, tail)))
            .json(body)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status().as_u16();
        if status != expected {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status(ApiFailure { status, body }));
        }
        response.json::<T>().await.map_err(ClientError::Decode)
    }
}

/// Low-level failure of a client call, mapped into each caller's error type.
#[derive(Debug)]
pub enum ClientError {
    Transport(reqwest::Error),
    Status(ApiFailure),
    Decode(reqwest::Error),
}
