// Language-model features: resume tailoring and interview answers.
// All model calls go through the LanguageModel trait in llm_client.

pub mod generator;
pub mod handlers;
pub mod interview;
pub mod prompts;
