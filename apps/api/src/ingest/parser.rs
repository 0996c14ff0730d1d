//! LLM field extraction: document text → structured candidate / JD fields.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::ingest::prompts::{EXTRACTION_SYSTEM, JD_EXTRACTION_PROMPT, RESUME_EXTRACTION_PROMPT};
use crate::llm_client::prompts::NO_GUESSING_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::matching::scorer::strip_nulls;
use crate::models::candidate::CandidateProfile;
use crate::models::job_description::JobDescriptionFields;

/// Keeps prompts inside the model's context window for very long documents.
pub const MAX_DOCUMENT_CHARS: usize = 60_000;

#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn candidate_profile(&self, text: &str) -> Result<CandidateProfile, AppError>;
    async fn job_description(&self, text: &str) -> Result<JobDescriptionFields, AppError>;
}

pub struct LlmFieldExtractor(pub LlmClient);

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    async fn candidate_profile(&self, text: &str) -> Result<CandidateProfile, AppError> {
        let profile: CandidateProfile = self.extract(RESUME_EXTRACTION_PROMPT, text).await?;
        if profile.name.trim().is_empty() && profile.technical_skills.is_empty() {
            return Err(AppError::Extraction(
                "Resume has neither a name nor any skills".to_string(),
            ));
        }
        info!(
            "Extracted resume of {} ({} skills, {:.1} years)",
            profile.name,
            profile.technical_skills.len(),
            profile.experience
        );
        Ok(profile)
    }

    async fn job_description(&self, text: &str) -> Result<JobDescriptionFields, AppError> {
        let fields: JobDescriptionFields = self.extract(JD_EXTRACTION_PROMPT, text).await?;
        info!(
            "Extracted JD '{}' ({} required skills)",
            fields.jobtitle,
            fields.required_skills.len()
        );
        Ok(fields)
    }
}

impl LlmFieldExtractor {
    async fn extract<T: DeserializeOwned>(&self, template: &str, text: &str) -> Result<T, AppError> {
        let prompt = build_extraction_prompt(template, text);
        let raw: Value = self
            .0
            .call_json(&prompt, EXTRACTION_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Field extraction failed: {e}")))?;
        parse_fields(raw)
    }
}

pub fn build_extraction_prompt(template: &str, text: &str) -> String {
    let text = truncate_chars(text, MAX_DOCUMENT_CHARS);
    template
        .replace("{no_guessing}", NO_GUESSING_INSTRUCTION)
        .replace("{document_text}", text)
}

/// Parses the model's JSON object into `T`, treating nulls as missing fields.
pub fn parse_fields<T: DeserializeOwned>(mut raw: Value) -> Result<T, AppError> {
    if !raw.is_object() {
        return Err(AppError::Extraction(
            "Model returned something other than a JSON object".to_string(),
        ));
    }
    strip_nulls(&mut raw);
    serde_json::from_value(raw).map_err(|e| {
        debug!("Extraction output did not match schema: {e}");
        AppError::Extraction(format!("Model output did not match the expected fields: {e}"))
    })
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
