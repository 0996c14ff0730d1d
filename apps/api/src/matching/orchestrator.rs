//! Match Orchestrator: runs the scoring pipeline for one upload event.
//!
//! Flow per event: received → filtered (skill-overlap gate against the
//! opposite collection) → scored (batched scorer calls, per-pair failures kept)
//! → persisted (aggregate with the user's weights, upsert ranked results).
//! An empty filter result ends the run as `skipped`. Unrecoverable errors end
//! it as `failed`; records already written stay written.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scorer::{attribute_outcomes, CandidateScorer, ScoringFailure, ScoringOutcome};
use crate::models::candidate::CandidateRecord;
use crate::models::job_description::JobDescriptionRecord;
use crate::models::score::{CandidateScoreRecord, UpsertOutcome};
use crate::scoring::aggregator::compute_total;
use crate::scoring::overlap::{has_overlap, MIN_SKILL_OVERLAP};
use crate::scoring::profile::resolve_profile;
use crate::scoring::weight_store::WeightStore;
use crate::scoring::weights::UserWeightConfig;
use crate::store::MatchStore;

// ────────────────────────────────────────────────────────────────────────────
// Pipeline state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Received,
    Filtered,
    Scored,
    Persisted,
    Skipped,
    Failed,
}

impl MatchState {
    pub fn can_transition_to(self, next: MatchState) -> bool {
        use MatchState::*;
        matches!(
            (self, next),
            (Received, Filtered)
                | (Filtered, Skipped)
                | (Filtered, Scored)
                | (Scored, Persisted)
                | (Received | Filtered | Scored, Failed)
        )
    }
}

/// Tracks one run through the state machine and logs every transition.
struct RunState {
    event: String,
    state: MatchState,
}

impl RunState {
    fn new(event: String) -> Self {
        debug!("[{event}] received");
        Self {
            event,
            state: MatchState::Received,
        }
    }

    fn advance(&mut self, next: MatchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("[{}] {:?} -> {:?}", self.event, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: AppError) -> AppError {
        warn!("[{}] failed while {:?}: {error}", self.event, self.state);
        self.advance(MatchState::Failed);
        error
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Run results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairStatus {
    Inserted { total_score: f64 },
    Updated { total_score: f64 },
    Failed {
        error: String,
        failure: ScoringFailure,
        /// A small excerpt of the input that could not be scored.
        sample: Value,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PairResult {
    pub jd_id: Uuid,
    pub candidate_id: Uuid,
    #[serde(flatten)]
    pub status: PairStatus,
}

impl PairResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, PairStatus::Failed { .. })
    }
}

/// Outcome of a completed (persisted or skipped) run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRun {
    pub state: MatchState,
    pub pairs: Vec<PairResult>,
}

impl MatchRun {
    fn skipped() -> Self {
        Self {
            state: MatchState::Skipped,
            pairs: Vec::new(),
        }
    }

    pub fn scored_count(&self) -> usize {
        self.pairs.iter().filter(|p| !p.is_failure()).count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct MatchOrchestrator<'a> {
    store: &'a dyn MatchStore,
    scorer: &'a dyn CandidateScorer,
    scoring_timeout: Duration,
    batch_size: usize,
}

impl<'a> MatchOrchestrator<'a> {
    pub fn new(
        store: &'a dyn MatchStore,
        scorer: &'a dyn CandidateScorer,
        scoring_timeout: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            scorer,
            scoring_timeout,
            batch_size: batch_size.max(1),
        }
    }

    /// A new candidate was stored: score it against every JD it shares a skill with.
    pub async fn on_candidate_added(
        &self,
        user_id: &str,
        candidate: &CandidateRecord,
    ) -> Result<MatchRun, AppError> {
        let mut run = RunState::new(format!("candidate {}", candidate.candidate_id));

        let job_descriptions = match self.store.job_descriptions(user_id).await {
            Ok(jds) => jds,
            Err(e) => return Err(run.fail(e)),
        };
        let matching: Vec<JobDescriptionRecord> = job_descriptions
            .into_iter()
            .filter(|jd| {
                has_overlap(
                    &jd.fields.required_skills,
                    &candidate.profile.technical_skills,
                    MIN_SKILL_OVERLAP,
                )
            })
            .collect();
        run.advance(MatchState::Filtered);

        if matching.is_empty() {
            run.advance(MatchState::Skipped);
            info!(
                "No job descriptions share a skill with candidate {}",
                candidate.candidate_id
            );
            return Ok(MatchRun::skipped());
        }

        let mut scored = Vec::new();
        for jd in &matching {
            let outcomes = self.score_in_batches(jd, std::slice::from_ref(candidate)).await;
            scored.push((jd, outcomes));
        }
        run.advance(MatchState::Scored);

        let pairs = match self
            .persist(user_id, &scored, std::slice::from_ref(candidate))
            .await
        {
            Ok(pairs) => pairs,
            Err(e) => return Err(run.fail(e)),
        };
        run.advance(MatchState::Persisted);

        Ok(MatchRun {
            state: MatchState::Persisted,
            pairs,
        })
    }

    /// A new JD was stored: score every candidate that shares a skill with it.
    pub async fn on_job_description_added(
        &self,
        user_id: &str,
        jd: &JobDescriptionRecord,
    ) -> Result<MatchRun, AppError> {
        let mut run = RunState::new(format!("jd {}", jd.jd_id));

        let candidates = match self.store.candidates(user_id).await {
            Ok(candidates) => candidates,
            Err(e) => return Err(run.fail(e)),
        };
        let matching: Vec<CandidateRecord> = candidates
            .into_iter()
            .filter(|c| {
                has_overlap(
                    &jd.fields.required_skills,
                    &c.profile.technical_skills,
                    MIN_SKILL_OVERLAP,
                )
            })
            .collect();
        run.advance(MatchState::Filtered);

        if matching.is_empty() {
            run.advance(MatchState::Skipped);
            info!("No candidates share a skill with JD {}", jd.jd_id);
            return Ok(MatchRun::skipped());
        }

        let outcomes = self.score_in_batches(jd, &matching).await;
        run.advance(MatchState::Scored);

        let pairs = match self.persist(user_id, &[(jd, outcomes)], &matching).await {
            Ok(pairs) => pairs,
            Err(e) => return Err(run.fail(e)),
        };
        run.advance(MatchState::Persisted);

        Ok(MatchRun {
            state: MatchState::Persisted,
            pairs,
        })
    }

    /// Recomputes total and breakdown for every stored result of a JD from the
    /// stored raw scores and the user's current weights. No scorer calls.
    pub async fn rescore_job_description(
        &self,
        user_id: &str,
        jd_id: Uuid,
    ) -> Result<Vec<CandidateScoreRecord>, AppError> {
        let config = WeightStore::new(self.store).get_all(user_id).await?;
        let stored = self.store.scores_for_job(user_id, jd_id).await?;

        let mut rescored = Vec::with_capacity(stored.len());
        for row in stored {
            let mut record = row.record;
            let result = compute_total(&record.category_scores(), record.profile_type, &config)?;
            record.apply(result);
            self.store.upsert_score(user_id, &record).await?;
            rescored.push(record);
        }

        rescored.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        info!("Rescored {} candidates for JD {jd_id}", rescored.len());
        Ok(rescored)
    }

    /// Calls the scorer in chunks of `batch_size`, bounding each call by the
    /// scoring timeout. Always yields one outcome per candidate.
    async fn score_in_batches(
        &self,
        jd: &JobDescriptionRecord,
        candidates: &[CandidateRecord],
    ) -> Vec<ScoringOutcome> {
        let mut outcomes = Vec::with_capacity(candidates.len());

        for batch in candidates.chunks(self.batch_size) {
            let result =
                tokio::time::timeout(self.scoring_timeout, self.scorer.score_batch(jd, batch)).await;
            let batch_outcomes = match result {
                Ok(raw) => attribute_outcomes(batch, raw),
                Err(_) => {
                    warn!(
                        "Scoring {} candidates for JD {} timed out",
                        batch.len(),
                        jd.jd_id
                    );
                    ScoringOutcome::fail_all(
                        batch,
                        ScoringFailure::ScoringTimeout(self.scoring_timeout.as_secs()),
                    )
                }
            };
            outcomes.extend(batch_outcomes);
        }

        outcomes
    }

    async fn persist(
        &self,
        user_id: &str,
        scored: &[(&JobDescriptionRecord, Vec<ScoringOutcome>)],
        candidates: &[CandidateRecord],
    ) -> Result<Vec<PairResult>, AppError> {
        // Weights are read once the scores are in, so a concurrent update made
        // during the scorer call is honoured.
        let config = WeightStore::new(self.store).get_all(user_id).await?;

        let mut pairs = Vec::new();
        for (jd, outcomes) in scored {
            for outcome in outcomes {
                let Some(candidate) = candidates
                    .iter()
                    .find(|c| c.candidate_id == outcome.candidate_id())
                else {
                    continue;
                };
                pairs.push(self.persist_pair(user_id, jd, candidate, outcome, &config).await?);
            }
        }

        let failures = pairs.iter().filter(|p| p.is_failure()).count();
        info!(
            "Persisted {} ranked results ({} scoring failures) for user {user_id}",
            pairs.len() - failures,
            failures
        );
        Ok(pairs)
    }

    async fn persist_pair(
        &self,
        user_id: &str,
        jd: &JobDescriptionRecord,
        candidate: &CandidateRecord,
        outcome: &ScoringOutcome,
        config: &UserWeightConfig,
    ) -> Result<PairResult, AppError> {
        let evaluation = match outcome {
            ScoringOutcome::Scored { evaluation, .. } => evaluation,
            ScoringOutcome::Failed { error, .. } => {
                return Ok(PairResult {
                    jd_id: jd.jd_id,
                    candidate_id: candidate.candidate_id,
                    status: PairStatus::Failed {
                        error: error.to_string(),
                        failure: error.clone(),
                        sample: input_sample(candidate),
                    },
                });
            }
        };

        let profile_type = resolve_profile(
            evaluation.profile_type.as_deref(),
            candidate.profile.experience,
        );
        let scores = evaluation.category_scores();
        let result = compute_total(&scores, profile_type, config)?;

        let record = CandidateScoreRecord {
            jd_id: jd.jd_id,
            candidate_id: candidate.candidate_id,
            name: candidate.profile.name.clone(),
            email: candidate.profile.email.clone(),
            resume_url: candidate.resume_url.clone(),
            profile_type,
            skills_score: scores.skills,
            experience_score: scores.experience,
            education_score: scores.education,
            certifications_score: scores.certifications,
            explanations: evaluation.explanations(),
            skills_matched: evaluation.skills_matched.clone(),
            key_achievements: evaluation.key_achievements.clone(),
            total_score: result.total_score,
            breakdown: result.breakdown,
        };

        let total_score = record.total_score;
        let status = match self.store.upsert_score(user_id, &record).await? {
            UpsertOutcome::Inserted => PairStatus::Inserted { total_score },
            UpsertOutcome::Updated => PairStatus::Updated { total_score },
        };

        Ok(PairResult {
            jd_id: jd.jd_id,
            candidate_id: candidate.candidate_id,
            status,
        })
    }
}

fn input_sample(candidate: &CandidateRecord) -> Value {
    json!({
        "candidate_id": candidate.candidate_id,
        "name": candidate.profile.name,
        "designation": candidate.profile.designation,
        "technical_skills": candidate.profile.technical_skills.iter().take(10).collect::<Vec<_>>(),
    })
}
