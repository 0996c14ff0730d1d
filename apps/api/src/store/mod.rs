//! Document store: per-user collections of weights, candidates, JDs and ranked results.
//!
//! Logical layout (one namespace per user id):
//!   score_weights/{profile_type}
//!   candidates/{candidate_id}
//!   job_descriptions/{jd_id}
//!   top_score/{jd_id} → candidates/{candidate_id}
//!
//! No cross-collection queries: callers list a collection and filter in code.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::models::job_description::JobDescriptionRecord;
use crate::models::score::{CandidateScoreRecord, StoredScoreRecord, UpsertOutcome};
use crate::scoring::weights::{ProfileType, WeightProfile};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Carried in `AppState` as `Arc<dyn MatchStore>`.
#[async_trait]
pub trait MatchStore: Send + Sync {
    // ── score_weights ──────────────────────────────────────────────────────

    async fn weight_profiles(
        &self,
        user_id: &str,
    ) -> Result<Vec<(ProfileType, WeightProfile)>, AppError>;

    /// Stores `weights` unless a profile already exists for the tier.
    async fn seed_weight_profile(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: &WeightProfile,
    ) -> Result<(), AppError>;

    /// Replaces an existing profile. Returns false when none exists; never creates one.
    async fn replace_weight_profile(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: &WeightProfile,
    ) -> Result<bool, AppError>;

    // ── candidates ─────────────────────────────────────────────────────────

    async fn insert_candidate(&self, candidate: &CandidateRecord) -> Result<(), AppError>;

    async fn candidates(&self, user_id: &str) -> Result<Vec<CandidateRecord>, AppError>;

    async fn candidate(
        &self,
        user_id: &str,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateRecord>, AppError>;

    /// Deletes the candidate and every score record that references it.
    async fn delete_candidate(&self, user_id: &str, candidate_id: Uuid) -> Result<bool, AppError>;

    // ── job_descriptions ───────────────────────────────────────────────────

    async fn insert_job_description(&self, jd: &JobDescriptionRecord) -> Result<(), AppError>;

    async fn job_descriptions(&self, user_id: &str) -> Result<Vec<JobDescriptionRecord>, AppError>;

    async fn job_description(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Option<JobDescriptionRecord>, AppError>;

    /// Deletes the JD together with its ranked results.
    async fn delete_job_description(&self, user_id: &str, jd_id: Uuid) -> Result<bool, AppError>;

    // ── top_score ──────────────────────────────────────────────────────────

    /// Upserts a ranked result keyed by (user, jd, candidate).
    ///
    /// Existing records only have their score fields, display fields and
    /// `updated_at` refreshed. New records are inserted whole with `created_at`,
    /// and the JD's "scored" marker is created if this is its first record.
    async fn upsert_score(
        &self,
        user_id: &str,
        record: &CandidateScoreRecord,
    ) -> Result<UpsertOutcome, AppError>;

    async fn scores_for_job(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Vec<StoredScoreRecord>, AppError>;
}

/// Fields refreshed when a ranked result is re-upserted. Explanations, matched
/// skills and achievements keep their first-scored values.
pub(crate) fn score_patch(record: &CandidateScoreRecord) -> serde_json::Value {
    serde_json::json!({
        "total_score": record.total_score,
        "breakdown": record.breakdown,
        "profile_type": record.profile_type,
        "skills_score": record.skills_score,
        "experience_score": record.experience_score,
        "education_score": record.education_score,
        "certifications_score": record.certifications_score,
        "resume_url": record.resume_url,
        "name": record.name,
        "email": record.email,
    })
}
