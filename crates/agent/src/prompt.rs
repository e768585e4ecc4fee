//! Prompt templates for the seeded conversation and suggest mode.

use fixloop_core::issue::Issue;
use fixloop_core::tool::{ToolKind, ToolRegistry};

/// Build the system prompt listing the tools offered for this run.
pub fn system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .definitions()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an experienced software engineer fixing a reported bug in a small code base.

## Tools

{tool_descriptions}

## Rules

1. Read the relevant file before changing it.
2. When you write a file, write its complete new content.
3. Make the smallest change that fixes the issue.
4. Call at most one tool per reply.
5. When the fix is done, reply with a short summary and no tool call."#
    )
}

/// Build the user message framing the task.
pub fn task_prompt(issue: &Issue, target_file: &str, tools: &ToolRegistry) -> String {
    let mut steps = Vec::new();
    if tools.contains(ToolKind::ReadFile) {
        steps.push(format!("Read `{target_file}` and find the cause of the issue."));
    } else {
        steps.push(format!("Find the cause of the issue in `{target_file}`."));
    }
    if tools.contains(ToolKind::WriteFile) {
        steps.push(format!("Write the corrected code back to `{target_file}`."));
    }
    if tools.contains(ToolKind::RunTests) {
        steps.push("Run the tests to confirm the fix.".into());
    }
    let steps = steps
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {s}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "## Issue ({origin})\n\n{issue}\n\n## Task\n\n{steps}",
        origin = issue.origin,
        issue = issue.text().trim(),
    )
}

/// Build the single-shot prompt used by suggest mode.
pub fn suggest_prompt(issue: &Issue, code: &str) -> String {
    format!(
        "You are an excellent software engineer.\n\n\
         ## Issue\n\n{issue}\n\n\
         ## Current code\n\n{code}\n\n\
         Output only the corrected code.",
        issue = issue.text().trim(),
    )
}
