//! Single-shot fix suggestion without tools.

use fixloop_core::error::ProviderError;
use fixloop_core::issue::Issue;
use fixloop_core::message::Message;
use fixloop_core::provider::{Provider, ProviderRequest};
use tracing::{debug, info};

use crate::prompt::suggest_prompt;

/// Ask the model once for corrected code. Returns the raw reply text.
pub async fn suggest_fix(
    provider: &dyn Provider,
    model: &str,
    temperature: f32,
    issue: &Issue,
    code: &str,
) -> Result<String, ProviderError> {
    let mut request = ProviderRequest::new(model, vec![Message::user(suggest_prompt(issue, code))]);
    request.temperature = temperature;

    debug!(provider = provider.name(), model, "Requesting fix suggestion");
    let response = provider.complete(request).await?;
    if let Some(usage) = &response.usage {
        info!(
            model = %response.model,
            total_tokens = usage.total_tokens,
            "Suggestion received"
        );
    }
    Ok(response.message.content)
}

/// Drop a surrounding markdown code fence (and its language tag) when the
/// whole reply is one fenced block.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text.to_string();
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text.to_string();
    };
    // First line is the optional language tag.
    match body.split_once('\n') {
        Some((_lang, code)) => {
            let code = code.trim_end_matches(['\n', '\r']);
            format!("{code}\n")
        }
        None => format!("{}\n", body.trim()),
    }
}
