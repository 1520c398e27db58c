use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::prompts::interview_prompt;
use crate::llm_client::prompts::GENERATION_TEMPERATURE;
use crate::llm_client::{CompletionRequest, LanguageModel, LlmError, ResponseFormat};

/// Body of `POST /api/interview`. The resume is whatever the client
/// currently holds, passed through to the prompt as JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    #[serde(default)]
    pub resume: Value,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub job_description: String,
}

/// Drafts a first-person answer to an interview question.
pub async fn answer_question(
    llm: &dyn LanguageModel,
    model: &str,
    request: &InterviewRequest,
) -> Result<String, LlmError> {
    let resume_json = serde_json::to_string_pretty(&request.resume)?;
    let completion = CompletionRequest {
        model: model.to_string(),
        system: None,
        prompt: interview_prompt(&resume_json, &request.job_description, &request.question),
        temperature: GENERATION_TEMPERATURE,
        format: ResponseFormat::Text,
    };

    let answer = llm.complete(completion).await?;
    info!(chars = answer.len(), "interview answer generated");
    Ok(answer.trim().to_string())
}
