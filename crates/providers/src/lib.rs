//! LLM Provider implementations for fixloop.
//!
//! All providers implement the `fixloop_core::Provider` trait. fixloop only
//! speaks the OpenAI-compatible chat-completions dialect, which covers OpenAI
//! itself, OpenRouter, Ollama, vLLM and most hosted gateways.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use fixloop_config::AppConfig;
use fixloop_core::error::ProviderError;

/// Build the model client from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("no API key (set FIXLOOP_API_KEY or OPENAI_API_KEY)".into()))?;

    OpenAiCompatProvider::new("openai", &config.provider.base_url, api_key)
        .and_then(|p| p.with_timeout(config.provider.timeout_secs))
}
