use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::aggregator::{CategoryScores, ScoreBreakdown, ScoreResult};
use crate::scoring::weights::ProfileType;

/// Free-text justification per category, as written by the scoring model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryExplanations {
    pub skills: String,
    pub experience: String,
    pub education: String,
    pub certifications: String,
}

/// The ranked result for one (job description, candidate) pair.
///
/// The four `*_score` fields are the scorer's raw output; `total_score` and
/// `breakdown` are derived and recomputed whenever the user's weights change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScoreRecord {
    pub jd_id: Uuid,
    pub candidate_id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_url: String,
    pub profile_type: ProfileType,
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub certifications_score: f64,
    pub explanations: CategoryExplanations,
    pub skills_matched: Vec<String>,
    pub key_achievements: Vec<String>,
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl CandidateScoreRecord {
    pub fn category_scores(&self) -> CategoryScores {
        CategoryScores {
            skills: self.skills_score,
            experience: self.experience_score,
            education: self.education_score,
            certifications: self.certifications_score,
        }
    }

    pub fn apply(&mut self, result: ScoreResult) {
        self.total_score = result.total_score;
        self.breakdown = result.breakdown;
    }
}

/// A persisted score record with its bookkeeping timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct StoredScoreRecord {
    #[serde(flatten)]
    pub record: CandidateScoreRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Whether an upsert created a new record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
