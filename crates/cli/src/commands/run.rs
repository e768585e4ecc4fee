//! `fixloop run`: load the issue, run the agent loop, optionally publish.

use std::path::Path;
use std::sync::Arc;

use fixloop_agent::{AgentLoop, LoopState, system_prompt, task_prompt};
use fixloop_core::message::{Conversation, Role};
use fixloop_github::{load_issue, publish};
use fixloop_tools::{ToolContext, ToolExecutor};
use tracing::info;

use super::load_config;

pub async fn run(
    config_path: &Path,
    max_steps: Option<u32>,
    publish_pr: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(max) = max_steps {
        config.agent.max_steps = max;
    }

    let provider = Arc::new(fixloop_providers::build_from_config(&config)?);
    let registry = config.tools.registry()?;
    let executor = ToolExecutor::new(registry, ToolContext::from_config(&config.tools)?);

    let issue = load_issue(&config).await?;
    let conversation = Conversation::seeded(
        system_prompt(executor.registry()),
        task_prompt(&issue, &config.agent.target_file, executor.registry()),
    );

    let agent = AgentLoop::from_config(provider, &config, executor);
    let state = agent.run(conversation).await?;

    print_summary(&state);

    if publish_pr {
        info!("Publishing fix");
        let summary = state.final_reply().unwrap_or_default();
        let published = publish(&config.github, &config.tools.workspace_root, &issue, summary).await?;
        println!();
        println!("Branch:       {}", published.branch);
        println!("Pull request: {}", published.pr_url);
    }

    Ok(())
}

fn print_summary(state: &LoopState) {
    let reason = state.reason.map(|r| r.as_str()).unwrap_or("unknown");
    println!();
    println!("Finished: {reason}");
    println!("Steps: {}/{}  Model calls: {}", state.step, state.max_steps, state.model_calls);
    println!();

    for message in state.conversation.messages() {
        let label = match message.role {
            Role::System => continue,
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let calls = message
            .tool_calls
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let first_line = message.content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        if calls.is_empty() {
            println!("  [{label}] {}", truncate(first_line, 100));
        } else {
            println!("  [{label}] -> {calls} {}", truncate(first_line, 80));
        }
    }

    if let Some(reply) = state.final_reply() {
        println!();
        println!("{reply}");
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}
