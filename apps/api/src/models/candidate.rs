use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub description: String,
}

/// Structured fields extracted from a resume by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub name: String,
    pub designation: String,
    /// Total professional experience in years.
    pub experience: f64,
    pub contact_number: String,
    pub email: String,
    #[serde(alias = "Location")]
    pub location: Option<String>,
    pub education: Vec<Education>,
    pub technical_skills: Vec<String>,
    pub key_achievements: Vec<String>,
    pub certifications: Vec<String>,
    pub projects: Vec<Project>,
    pub professional_summary: String,
}

/// A stored candidate: extracted profile plus ownership and blob location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_id: Uuid,
    pub user_id: String,
    pub resume_url: String,
    #[serde(flatten)]
    pub profile: CandidateProfile,
    pub created_at: DateTime<Utc>,
}
