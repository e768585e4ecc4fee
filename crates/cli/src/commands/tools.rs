//! `fixloop tools`: list the tools the model will be offered.

use std::path::Path;

use super::load_config;

pub async fn run(config_path: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let registry = config.tools.registry()?;

    if registry.is_empty() {
        println!("No tools enabled: the model can only answer in text.");
        return Ok(());
    }

    println!("Registered tools:");
    for def in registry.definitions() {
        println!("  {:<12} {}", def.name, def.description);
        if verbose {
            let schema = serde_json::to_string_pretty(&def.parameters)?;
            for line in schema.lines() {
                println!("               {line}");
            }
        }
    }
    println!();
    println!("Test command: {}", config.tools.test_command.join(" "));

    Ok(())
}
