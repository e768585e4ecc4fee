pub mod init;
pub mod run;
pub mod suggest;
pub mod tools;

use std::path::Path;

use fixloop_config::AppConfig;

/// Load config from `path` with environment overrides applied.
pub fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(path, |key| std::env::var(key).ok())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}
