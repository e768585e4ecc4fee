//! `fixloop init`: write the default config file.

use std::path::Path;

use fixloop_config::AppConfig;

pub async fn run(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !force {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or re-run with --force to overwrite.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(config_path, AppConfig::default_toml()).await?;

    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set FIXLOOP_API_KEY (or OPENAI_API_KEY), e.g. in .env");
    println!("  2. Describe the bug in issue.txt, or set the [github] section");
    println!("  3. Run: fixloop run");

    Ok(())
}
