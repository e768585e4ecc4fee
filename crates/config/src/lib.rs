//! Configuration loading, validation, and management for fixloop.
//!
//! Loads configuration from `./fixloop.toml` (or an explicit path) with
//! environment variable overrides. Validates all settings at startup.

use fixloop_core::tool::{ToolKind, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "fixloop.toml";

/// The root configuration structure.
///
/// Maps directly to `fixloop.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model endpoint settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool catalog and execution settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Local issue source
    #[serde(default)]
    pub issue: IssueConfig,

    /// GitHub issue fetch and pull request publication
    #[serde(default)]
    pub github: GithubConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("issue", &self.issue)
            .field("github", &self.github)
            .finish()
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("issue_number", &self.issue_number)
            .field("token", &redact(&self.token))
            .field("base_branch", &self.base_branch)
            .field("remote", &self.remote)
            .field("commit_template", &self.commit_template)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OpenAI-compatible base URL (without `/chat/completions`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// HTTP request timeout for a single model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4.1".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Step budget: maximum number of turns per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// The source file the agent is asked to fix
    #[serde(default = "default_target_file")]
    pub target_file: String,
}

fn default_max_steps() -> u32 {
    3
}
fn default_target_file() -> String {
    "target_code.py".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            target_file: default_target_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Tools offered to the model, in presentation order
    #[serde(default = "default_enabled_tools")]
    pub enabled: Vec<String>,

    /// Test runner program and its fixed arguments
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,

    /// Root for relative tool paths and the test runner's working directory
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
}

fn default_enabled_tools() -> Vec<String> {
    ToolKind::ALL.iter().map(|k| k.name().to_string()).collect()
}
fn default_test_command() -> Vec<String> {
    vec!["pytest".into()]
}
fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_tools(),
            test_command: default_test_command(),
            workspace_root: default_workspace_root(),
        }
    }
}

impl ToolsConfig {
    /// Build the registry from the enabled tool names.
    pub fn registry(&self) -> Result<ToolRegistry, ConfigError> {
        let mut registry = ToolRegistry::new();
        for name in &self.enabled {
            let kind = ToolKind::from_name(name)
                .ok_or_else(|| ConfigError::ValidationError(format!("unknown tool in tools.enabled: '{name}'")))?;
            registry.register(kind);
        }
        Ok(registry)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueConfig {
    /// Issue text used when GitHub is not configured or unreachable
    #[serde(default = "default_issue_file")]
    pub local_file: PathBuf,
}

fn default_issue_file() -> PathBuf {
    PathBuf::from("issue.txt")
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            local_file: default_issue_file(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api")]
    pub api_base: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Branch pull requests are opened against
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Git remote the fix branch is pushed to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Commit message; `{issue}` is replaced by the issue number
    #[serde(default = "default_commit_template")]
    pub commit_template: String,
}

fn default_github_api() -> String {
    "https://api.github.com".into()
}
fn default_base_branch() -> String {
    "main".into()
}
fn default_remote() -> String {
    "origin".into()
}
fn default_commit_template() -> String {
    "Fix #{issue}: automated patch by fixloop".into()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            owner: None,
            repo: None,
            issue_number: None,
            token: None,
            base_branch: default_base_branch(),
            remote: default_remote(),
            commit_template: default_commit_template(),
        }
    }
}

impl GithubConfig {
    /// `(owner, repo, number)` when all three are configured.
    pub fn issue_ref(&self) -> Option<(&str, &str, u64)> {
        match (&self.owner, &self.repo, self.issue_number) {
            (Some(owner), Some(repo), Some(number)) => Some((owner.as_str(), repo.as_str(), number)),
            _ => None,
        }
    }

    /// `(owner, repo)` when both are configured.
    pub fn repo_ref(&self) -> Option<(&str, &str)> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Some((owner.as_str(), repo.as_str())),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `./fixloop.toml` and the process environment.
    ///
    /// Environment variables checked:
    /// - `FIXLOOP_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `FIXLOOP_MODEL`, `FIXLOOP_BASE_URL`
    /// - `GITHUB_TOKEN`, `GITHUB_OWNER`, `GITHUB_REPO`, `GITHUB_ISSUE_NUMBER`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(Path::new(CONFIG_FILE_NAME), |key| std::env::var(key).ok())
    }

    /// Load from a specific file, then apply overrides from `env`.
    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(key) = env("FIXLOOP_API_KEY").or_else(|| env("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = env("FIXLOOP_MODEL") {
            self.provider.model = model;
        }
        if let Some(url) = env("FIXLOOP_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(token) = env("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(owner) = env("GITHUB_OWNER") {
            self.github.owner = Some(owner);
        }
        if let Some(repo) = env("GITHUB_REPO") {
            self.github.repo = Some(repo);
        }
        if let Some(number) = env("GITHUB_ISSUE_NUMBER") {
            let parsed = number.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("GITHUB_ISSUE_NUMBER is not a number: '{number}'"))
            })?;
            self.github.issue_number = Some(parsed);
        }
        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_steps must be at least 1".into(),
            ));
        }

        if self.tools.test_command.is_empty() {
            return Err(ConfigError::ValidationError(
                "tools.test_command must name a program".into(),
            ));
        }

        self.tools.registry()?;
        Ok(())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderSettings::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            issue: IssueConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
