use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured fields extracted from a job description by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDescriptionFields {
    pub jobtitle: String,
    pub company: String,
    pub location: Option<String>,
    pub required_experience: Option<String>,
    pub job_type: Option<String>,
    pub required_skills: Vec<String>,
    pub responsibilities: Option<String>,
    pub qualifications: String,
    pub salary_range: Option<String>,
    pub posted_date: Option<String>,
    pub contact_email: Option<String>,
    pub description: String,
}

/// A stored job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionRecord {
    pub jd_id: Uuid,
    pub user_id: String,
    pub jd_url: String,
    #[serde(flatten)]
    pub fields: JobDescriptionFields,
    pub created_at: DateTime<Utc>,
}
