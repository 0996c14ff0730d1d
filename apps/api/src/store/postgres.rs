use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::models::job_description::JobDescriptionRecord;
use crate::models::score::{CandidateScoreRecord, StoredScoreRecord, UpsertOutcome};
use crate::scoring::weights::{ProfileType, WeightProfile};
use crate::store::{score_patch, MatchStore};

/// PostgreSQL-backed store. Each collection is a table keyed by `user_id`;
/// documents live in JSONB `data` columns.
#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn weight_profiles(
        &self,
        user_id: &str,
    ) -> Result<Vec<(ProfileType, WeightProfile)>, AppError> {
        let rows: Vec<(String, Json<WeightProfile>)> = sqlx::query_as(
            "SELECT profile_type, weights FROM score_weights WHERE user_id = $1 ORDER BY profile_type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(profile_type, Json(weights))| match profile_type.parse() {
                Ok(profile) => Some((profile, weights)),
                Err(e) => {
                    warn!("Skipping stored weights for user {user_id}: {e}");
                    None
                }
            })
            .collect())
    }

    async fn seed_weight_profile(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: &WeightProfile,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO score_weights (user_id, profile_type, weights)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, profile_type) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(profile_type.as_str())
        .bind(Json(weights))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_weight_profile(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: &WeightProfile,
    ) -> Result<bool, AppError> {
        // Conditional write: the row must already exist.
        let result = sqlx::query(
            r#"
            UPDATE score_weights
            SET weights = $3, updated_at = now()
            WHERE user_id = $1 AND profile_type = $2
            "#,
        )
        .bind(user_id)
        .bind(profile_type.as_str())
        .bind(Json(weights))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_candidate(&self, candidate: &CandidateRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO candidates (user_id, candidate_id, data, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&candidate.user_id)
        .bind(candidate.candidate_id)
        .bind(Json(candidate))
        .bind(candidate.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn candidates(&self, user_id: &str) -> Result<Vec<CandidateRecord>, AppError> {
        let rows: Vec<Json<CandidateRecord>> = sqlx::query_scalar(
            "SELECT data FROM candidates WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(c)| c).collect())
    }

    async fn candidate(
        &self,
        user_id: &str,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateRecord>, AppError> {
        let row: Option<Json<CandidateRecord>> = sqlx::query_scalar(
            "SELECT data FROM candidates WHERE user_id = $1 AND candidate_id = $2",
        )
        .bind(user_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(c)| c))
    }

    async fn delete_candidate(&self, user_id: &str, candidate_id: Uuid) -> Result<bool, AppError> {
        let scores = sqlx::query(
            "DELETE FROM top_score_candidates WHERE user_id = $1 AND candidate_id = $2",
        )
        .bind(user_id)
        .bind(candidate_id)
        .execute(&self.pool)
        .await?;
        debug!(
            "Removed {} score records for candidate {candidate_id}",
            scores.rows_affected()
        );

        let result = sqlx::query("DELETE FROM candidates WHERE user_id = $1 AND candidate_id = $2")
            .bind(user_id)
            .bind(candidate_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_job_description(&self, jd: &JobDescriptionRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO job_descriptions (user_id, jd_id, data, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&jd.user_id)
        .bind(jd.jd_id)
        .bind(Json(jd))
        .bind(jd.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn job_descriptions(&self, user_id: &str) -> Result<Vec<JobDescriptionRecord>, AppError> {
        let rows: Vec<Json<JobDescriptionRecord>> = sqlx::query_scalar(
            "SELECT data FROM job_descriptions WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(jd)| jd).collect())
    }

    async fn job_description(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Option<JobDescriptionRecord>, AppError> {
        let row: Option<Json<JobDescriptionRecord>> = sqlx::query_scalar(
            "SELECT data FROM job_descriptions WHERE user_id = $1 AND jd_id = $2",
        )
        .bind(user_id)
        .bind(jd_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(jd)| jd))
    }

    async fn delete_job_description(&self, user_id: &str, jd_id: Uuid) -> Result<bool, AppError> {
        sqlx::query("DELETE FROM top_score_candidates WHERE user_id = $1 AND jd_id = $2")
            .bind(user_id)
            .bind(jd_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM top_scores WHERE user_id = $1 AND jd_id = $2")
            .bind(user_id)
            .bind(jd_id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM job_descriptions WHERE user_id = $1 AND jd_id = $2")
            .bind(user_id)
            .bind(jd_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_score(
        &self,
        user_id: &str,
        record: &CandidateScoreRecord,
    ) -> Result<UpsertOutcome, AppError> {
        // xmax = 0 only for freshly inserted tuples.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO top_score_candidates
                (user_id, jd_id, candidate_id, total_score, data)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, jd_id, candidate_id) DO UPDATE
            SET total_score = EXCLUDED.total_score,
                data = top_score_candidates.data || $6,
                updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(user_id)
        .bind(record.jd_id)
        .bind(record.candidate_id)
        .bind(record.total_score)
        .bind(Json(record))
        .bind(score_patch(record))
        .fetch_one(&self.pool)
        .await?;

        if !inserted {
            return Ok(UpsertOutcome::Updated);
        }

        sqlx::query(
            r#"
            INSERT INTO top_scores (user_id, jd_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, jd_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(record.jd_id)
        .execute(&self.pool)
        .await?;

        Ok(UpsertOutcome::Inserted)
    }

    async fn scores_for_job(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Vec<StoredScoreRecord>, AppError> {
        let rows: Vec<(Json<CandidateScoreRecord>, DateTime<Utc>, Option<DateTime<Utc>>)> =
            sqlx::query_as(
                r#"
                SELECT data, created_at, updated_at
                FROM top_score_candidates
                WHERE user_id = $1 AND jd_id = $2
                ORDER BY total_score DESC
                "#,
            )
            .bind(user_id)
            .bind(jd_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(Json(record), created_at, updated_at)| StoredScoreRecord {
                record,
                created_at,
                updated_at,
            })
            .collect())
    }
}
