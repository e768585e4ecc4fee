//! GitHub collaborators for fixloop.
//!
//! Both run outside the agent loop: the issue is loaded before the first
//! model turn, and publication happens after the loop has terminated.

pub mod client;
pub mod issue;
pub mod publish;

pub use client::{ApiFailure, ClientError, GitHubClient};
pub use issue::{IssueError, load_issue, read_local_issue};
pub use publish::{PublishError, PullRequest, Published, branch_name, commit_message, git, publish};
