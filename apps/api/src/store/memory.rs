//! In-memory `MatchStore` used by pipeline and router tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::models::job_description::JobDescriptionRecord;
use crate::models::score::{CandidateScoreRecord, StoredScoreRecord, UpsertOutcome};
use crate::scoring::weights::{ProfileType, WeightProfile};
use crate::store::{score_patch, MatchStore};

#[derive(Default)]
struct Collections {
    weights: BTreeMap<(String, ProfileType), WeightProfile>,
    candidates: Vec<CandidateRecord>,
    job_descriptions: Vec<JobDescriptionRecord>,
    scored_markers: HashSet<(String, Uuid)>,
    scores: HashMap<(String, Uuid, Uuid), StoredScoreRecord>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Collections>,
    reject_inserts: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate and JD inserts fail as if the database were unavailable.
    pub fn rejecting_inserts() -> Self {
        Self {
            reject_inserts: true,
            ..Self::default()
        }
    }

    fn check_insert(&self) -> Result<(), AppError> {
        if self.reject_inserts {
            return Err(AppError::Storage("document store unavailable".to_string()));
        }
        Ok(())
    }

    pub fn has_scored_marker(&self, user_id: &str, jd_id: Uuid) -> bool {
        self.inner
            .lock()
            .unwrap()
            .scored_markers
            .contains(&(user_id.to_string(), jd_id))
    }

    pub fn score_count(&self) -> usize {
        self.inner.lock().unwrap().scores.len()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn weight_profiles(
        &self,
        user_id: &str,
    ) -> Result<Vec<(ProfileType, WeightProfile)>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .weights
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|((_, profile), weights)| (*profile, *weights))
            .collect())
    }

    async fn seed_weight_profile(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: &WeightProfile,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .weights
            .entry((user_id.to_string(), profile_type))
            .or_insert(*weights);
        Ok(())
    }

    async fn replace_weight_profile(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: &WeightProfile,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.weights.get_mut(&(user_id.to_string(), profile_type)) {
            Some(stored) => {
                *stored = *weights;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_candidate(&self, candidate: &CandidateRecord) -> Result<(), AppError> {
        self.check_insert()?;
        self.inner.lock().unwrap().candidates.push(candidate.clone());
        Ok(())
    }

    async fn candidates(&self, user_id: &str) -> Result<Vec<CandidateRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .candidates
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn candidate(
        &self,
        user_id: &str,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .candidates
            .iter()
            .find(|c| c.user_id == user_id && c.candidate_id == candidate_id)
            .cloned())
    }

    async fn delete_candidate(&self, user_id: &str, candidate_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scores
            .retain(|(uid, _, cid), _| !(uid == user_id && *cid == candidate_id));
        let before = inner.candidates.len();
        inner
            .candidates
            .retain(|c| !(c.user_id == user_id && c.candidate_id == candidate_id));
        Ok(inner.candidates.len() < before)
    }

    async fn insert_job_description(&self, jd: &JobDescriptionRecord) -> Result<(), AppError> {
        self.check_insert()?;
        self.inner.lock().unwrap().job_descriptions.push(jd.clone());
        Ok(())
    }

    async fn job_descriptions(&self, user_id: &str) -> Result<Vec<JobDescriptionRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .job_descriptions
            .iter()
            .filter(|jd| jd.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn job_description(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Option<JobDescriptionRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .job_descriptions
            .iter()
            .find(|jd| jd.user_id == user_id && jd.jd_id == jd_id)
            .cloned())
    }

    async fn delete_job_description(&self, user_id: &str, jd_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scores
            .retain(|(uid, jid, _), _| !(uid == user_id && *jid == jd_id));
        inner.scored_markers.remove(&(user_id.to_string(), jd_id));
        let before = inner.job_descriptions.len();
        inner
            .job_descriptions
            .retain(|jd| !(jd.user_id == user_id && jd.jd_id == jd_id));
        Ok(inner.job_descriptions.len() < before)
    }

    async fn upsert_score(
        &self,
        user_id: &str,
        record: &CandidateScoreRecord,
    ) -> Result<UpsertOutcome, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (user_id.to_string(), record.jd_id, record.candidate_id);

        if let Some(stored) = inner.scores.get_mut(&key) {
            let mut merged = serde_json::to_value(&stored.record)
                .map_err(|e| AppError::Storage(e.to_string()))?;
            if let (Some(target), serde_json::Value::Object(patch)) =
                (merged.as_object_mut(), score_patch(record))
            {
                target.extend(patch);
            }
            stored.record =
                serde_json::from_value(merged).map_err(|e| AppError::Storage(e.to_string()))?;
            stored.updated_at = Some(Utc::now());
            return Ok(UpsertOutcome::Updated);
        }

        inner.scored_markers.insert((user_id.to_string(), record.jd_id));
        inner.scores.insert(
            key,
            StoredScoreRecord {
                record: record.clone(),
                created_at: Utc::now(),
                updated_at: None,
            },
        );
        Ok(UpsertOutcome::Inserted)
    }

    async fn scores_for_job(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Vec<StoredScoreRecord>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<StoredScoreRecord> = inner
            .scores
            .iter()
            .filter(|((uid, jid, _), _)| uid == user_id && *jid == jd_id)
            .map(|(_, stored)| stored.clone())
            .collect();
        rows.sort_by(|a, b| b.record.total_score.total_cmp(&a.record.total_score));
        Ok(rows)
    }
}
