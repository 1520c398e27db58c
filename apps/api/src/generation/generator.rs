//! Resume generation: profile + job description → validated resume document.
//!
//! The model writes the content sections (title, summary, experience, skills,
//! education); contact details are copied from the profile afterwards so the
//! model never sees or rewrites them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::prompts::resume_prompt;
use crate::llm_client::prompts::{GENERATION_TEMPERATURE, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, CompletionRequest, LanguageModel, LlmError, ResponseFormat};
use crate::models::profile::ProfileRow;

const EXPERIENCE_RANGE: (usize, usize) = (3, 4);
const HIGHLIGHT_RANGE: (usize, usize) = (5, 6);
const SKILL_RANGE: (usize, usize) = (3, 10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub graduation_date: String,
}

/// The part of the resume the model writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResume {
    pub title: String,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
}

/// Full resume returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeDocument {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub github: String,
    pub linkedin: String,
    pub website: String,
    #[serde(flatten)]
    pub content: GeneratedResume,
}

/// Profile fields the model gets to see.
#[derive(Debug, Serialize)]
struct ProfileFeed<'a> {
    location: &'a str,
    experience: &'a str,
    skills: &'a str,
    projects: &'a str,
    education: &'a str,
}

impl<'a> From<&'a ProfileRow> for ProfileFeed<'a> {
    fn from(profile: &'a ProfileRow) -> Self {
        Self {
            location: &profile.location,
            experience: &profile.experience,
            skills: &profile.skills,
            projects: &profile.projects,
            education: &profile.education,
        }
    }
}

fn check_count(what: &str, actual: usize, (min, max): (usize, usize)) -> Result<(), String> {
    if actual < min || actual > max {
        return Err(format!("{what} must have {min}-{max} entries, got {actual}"));
    }
    Ok(())
}

fn require_text(what: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{what} is empty"));
    }
    Ok(())
}

/// Checks the model's output against the resume contract.
pub fn validate_resume(resume: &GeneratedResume) -> Result<(), String> {
    require_text("title", &resume.title)?;
    require_text("summary", &resume.summary)?;

    check_count("experience", resume.experience.len(), EXPERIENCE_RANGE)?;
    let mut companies = HashSet::new();
    for (i, entry) in resume.experience.iter().enumerate() {
        for (field, value) in [
            ("title", &entry.title),
            ("company", &entry.company),
            ("location", &entry.location),
            ("startDate", &entry.start_date),
            ("endDate", &entry.end_date),
        ] {
            require_text(&format!("experience[{i}].{field}"), value)?;
        }
        check_count(
            &format!("experience[{i}].highlights"),
            entry.highlights.len(),
            HIGHLIGHT_RANGE,
        )?;
        if !companies.insert(entry.company.trim().to_lowercase()) {
            return Err(format!("company '{}' appears more than once", entry.company));
        }
    }

    check_count("skills", resume.skills.len(), SKILL_RANGE)?;

    if resume.education.is_empty() {
        return Err("education must have at least 1 entry".to_string());
    }
    for (i, entry) in resume.education.iter().enumerate() {
        for (field, value) in [
            ("degree", &entry.degree),
            ("institution", &entry.institution),
            ("location", &entry.location),
            ("graduationDate", &entry.graduation_date),
        ] {
            require_text(&format!("education[{i}].{field}"), value)?;
        }
    }

    Ok(())
}

/// Generates a resume tailored to `job_description` from the user's profile.
pub async fn generate_resume(
    llm: &dyn LanguageModel,
    model: &str,
    profile: &ProfileRow,
    job_description: &str,
) -> Result<ResumeDocument, LlmError> {
    let feed = serde_json::to_string_pretty(&ProfileFeed::from(profile))?;
    let request = CompletionRequest {
        model: model.to_string(),
        system: Some(JSON_ONLY_SYSTEM.to_string()),
        prompt: resume_prompt(job_description, &feed),
        temperature: GENERATION_TEMPERATURE,
        format: ResponseFormat::JsonObject,
    };

    let content: GeneratedResume = complete_json(llm, request).await?;
    if let Err(reason) = validate_resume(&content) {
        warn!(user_id = %profile.user_id, %reason, "generated resume rejected");
        return Err(LlmError::InvalidOutput(reason));
    }

    info!(
        user_id = %profile.user_id,
        positions = content.experience.len(),
        skills = content.skills.len(),
        "resume generated"
    );

    Ok(ResumeDocument {
        name: profile.name.clone(),
        email: profile.email.clone(),
        phone: profile.phone.clone(),
        location: profile.location.clone(),
        github: profile.github.clone(),
        linkedin: profile.linkedin.clone(),
        website: profile.website.clone(),
        content,
    })
}
