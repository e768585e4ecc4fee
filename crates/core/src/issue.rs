//! The bug report a run is trying to fix.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where an issue's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueOrigin {
    LocalFile { path: PathBuf },
    GitHub { owner: String, repo: String, number: u64 },
}

impl std::fmt::Display for IssueOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueOrigin::LocalFile { path } => write!(f, "{}", path.display()),
            IssueOrigin::GitHub { owner, repo, number } => write!(f, "{owner}/{repo}#{number}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number, when known (always set for GitHub issues)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub body: String,

    pub origin: IssueOrigin,
}

impl Issue {
    /// An issue read from a plain text file: the whole file is the body.
    pub fn from_local(path: impl Into<PathBuf>, body: impl Into<String>) -> Self {
        Self {
            number: None,
            title: None,
            body: body.into(),
            origin: IssueOrigin::LocalFile { path: path.into() },
        }
    }

    /// Title and body joined the way they are shown to the model.
    pub fn text(&self) -> String {
        match &self.title {
            Some(title) => format!("{title}\n\n{}", self.body),
            None => self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_issue_text_is_body() {
        let issue = Issue::from_local("issue.txt", "add() subtracts instead of adding");
        assert_eq!(issue.text(), "add() subtracts instead of adding");
        assert_eq!(issue.origin.to_string(), "issue.txt");
    }

    #[test]
    fn github_issue_text_leads_with_title() {
        let issue = Issue {
            number: Some(7),
            title: Some("add() is broken".into()),
            body: "2 + 2 returns 0".into(),
            origin: IssueOrigin::GitHub {
                owner: "acme".into(),
                repo: "widgets".into(),
                number: 7,
            },
        };
        assert_eq!(issue.text(), "add() is broken\n\n2 + 2 returns 0");
        assert_eq!(issue.origin.to_string(), "acme/widgets#7");
    }
}
