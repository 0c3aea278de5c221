//! Ticket content generation: one model call with the product-manager prompt

use crate::llm::prompts::STORY_SYSTEM;
use crate::llm::LlmClient;

pub const DEFAULT_MODEL_TYPE: &str = "gpt-4o-mini";

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("❌ All fields are required.")]
    MissingFields,
    #[error("❌ Error: {0}")]
    Llm(#[from] anyhow::Error),
}

/// Draft story, acceptance criteria, scenarios and estimates for a description.
///
/// `model_type` is recorded for the log only; the configured endpoint already
/// names its deployment.
pub async fn generate_story(
    llm: &LlmClient,
    description: &str,
    model_type: &str,
) -> Result<String, StoryError> {
    if description.trim().is_empty() || model_type.trim().is_empty() {
        return Err(StoryError::MissingFields);
    }

    tracing::info!(model_type, chars = description.len(), "generating ticket content");
    let content = llm.complete(STORY_SYSTEM, description, None).await?;
    Ok(content)
}
