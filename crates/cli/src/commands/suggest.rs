//! `fixloop suggest`: one plain completion, printed and optionally applied.

use std::path::Path;

use fixloop_agent::{strip_code_fence, suggest_fix};
use fixloop_core::tool::WriteFileArgs;
use fixloop_github::load_issue;
use fixloop_tools::file_write::write_file;

use super::load_config;

pub async fn run(config_path: &Path, apply: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let provider = fixloop_providers::build_from_config(&config)?;
    let issue = load_issue(&config).await?;

    let root = &config.tools.workspace_root;
    let target = root.join(&config.agent.target_file);
    let code = tokio::fs::read_to_string(&target)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", target.display()))?;

    let suggestion = suggest_fix(
        &provider,
        &config.provider.model,
        config.provider.temperature,
        &issue,
        &code,
    )
    .await?;

    println!("===== Suggested fix =====");
    println!("{suggestion}");

    if apply {
        let content = strip_code_fence(&suggestion);
        if content.trim().is_empty() {
            return Err("The suggestion is empty; the target file was left unchanged.".into());
        }
        let args = WriteFileArgs {
            path: config.agent.target_file.clone(),
            content,
        };
        write_file(root, &args).await?;
        println!();
        println!("Applied to {}", target.display());
    }

    Ok(())
}
