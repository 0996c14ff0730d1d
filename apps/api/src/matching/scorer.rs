//! Candidate Scorer: the LLM-facing collaborator that produces per-category scores.
//!
//! One call evaluates a JD against a batch of candidates and yields exactly one
//! tagged outcome per candidate: either an evaluation or an error entry. A
//! failing candidate never takes its siblings down with it.
//!
//! `AppState` holds an `Arc<dyn CandidateScorer>`; `LlmCandidateScorer` is the
//! production backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::llm_client::LlmClient;
use crate::matching::prompts::{SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM};
use crate::models::candidate::CandidateRecord;
use crate::models::job_description::JobDescriptionRecord;
use crate::models::score::CategoryExplanations;
use crate::scoring::aggregator::CategoryScores;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// What the scoring model returns for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateEvaluation {
    /// Free-text tier label; parsed leniently downstream.
    pub profile_type: Option<String>,
    pub skills_score: f64,
    pub skills_explanation: String,
    pub experience_score: f64,
    pub experience_explanation: String,
    pub education_score: f64,
    pub education_explanation: String,
    pub certifications_score: f64,
    pub certifications_explanation: String,
    pub skills_matched: Vec<String>,
    pub key_achievements: Vec<String>,
}

impl CandidateEvaluation {
    /// Raw scores clamped into [0, 100].
    pub fn category_scores(&self) -> CategoryScores {
        CategoryScores {
            skills: self.skills_score,
            experience: self.experience_score,
            education: self.education_score,
            certifications: self.certifications_score,
        }
        .clamped()
    }

    pub fn explanations(&self) -> CategoryExplanations {
        CategoryExplanations {
            skills: self.skills_explanation.clone(),
            experience: self.experience_explanation.clone(),
            education: self.education_explanation.clone(),
            certifications: self.certifications_explanation.clone(),
        }
    }
}

/// Why a single candidate could not be scored.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ScoringFailure {
    #[error("{0}")]
    ScoringError(String),

    #[error("Scoring timed out after {0}s")]
    ScoringTimeout(u64),
}

/// Tagged per-candidate result of a scoring call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringOutcome {
    Scored {
        candidate_id: Uuid,
        evaluation: CandidateEvaluation,
    },
    Failed {
        candidate_id: Uuid,
        error: ScoringFailure,
    },
}

impl ScoringOutcome {
    pub fn candidate_id(&self) -> Uuid {
        match self {
            ScoringOutcome::Scored { candidate_id, .. } | ScoringOutcome::Failed { candidate_id, .. } => {
                *candidate_id
            }
        }
    }

    /// Marks every candidate in a batch as failed with the same cause.
    pub fn fail_all(candidates: &[CandidateRecord], error: ScoringFailure) -> Vec<ScoringOutcome> {
        candidates
            .iter()
            .map(|c| ScoringOutcome::Failed {
                candidate_id: c.candidate_id,
                error: error.clone(),
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CandidateScorer: Send + Sync {
    /// Scores every candidate against the JD. Implementations should return one
    /// outcome per candidate; `attribute_outcomes` repairs anything they miss.
    async fn score_batch(
        &self,
        jd: &JobDescriptionRecord,
        candidates: &[CandidateRecord],
    ) -> Vec<ScoringOutcome>;
}

/// Aligns scorer output with the requested batch: one outcome per candidate, in
/// input order. Duplicate and unknown ids are dropped; omitted candidates get a
/// `ScoringError`.
pub fn attribute_outcomes(
    candidates: &[CandidateRecord],
    outcomes: Vec<ScoringOutcome>,
) -> Vec<ScoringOutcome> {
    let mut by_id: HashMap<Uuid, ScoringOutcome> = HashMap::with_capacity(outcomes.len());
    for outcome in outcomes {
        let id = outcome.candidate_id();
        if !candidates.iter().any(|c| c.candidate_id == id) {
            warn!("Scorer returned a result for unknown candidate {id}; ignoring");
            continue;
        }
        by_id.entry(id).or_insert(outcome);
    }

    candidates
        .iter()
        .map(|c| {
            by_id.remove(&c.candidate_id).unwrap_or_else(|| ScoringOutcome::Failed {
                candidate_id: c.candidate_id,
                error: ScoringFailure::ScoringError(
                    "Scorer returned no evaluation for this candidate".to_string(),
                ),
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// LlmCandidateScorer
// ────────────────────────────────────────────────────────────────────────────

/// Scores a batch with a single LLM call.
pub struct LlmCandidateScorer(pub LlmClient);

#[async_trait]
impl CandidateScorer for LlmCandidateScorer {
    async fn score_batch(
        &self,
        jd: &JobDescriptionRecord,
        candidates: &[CandidateRecord],
    ) -> Vec<ScoringOutcome> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let prompt = match build_scoring_prompt(jd, candidates) {
            Ok(prompt) => prompt,
            Err(e) => {
                return ScoringOutcome::fail_all(
                    candidates,
                    ScoringFailure::ScoringError(format!("Failed to build scoring prompt: {e}")),
                )
            }
        };

        match self.0.call_json::<Value>(&prompt, SCORING_SYSTEM).await {
            Ok(response) => {
                debug!(
                    "Scoring call for JD {} returned, {} candidates requested",
                    jd.jd_id,
                    candidates.len()
                );
                parse_evaluations(response)
            }
            Err(e) => {
                warn!("Scoring call for JD {} failed: {e}", jd.jd_id);
                ScoringOutcome::fail_all(candidates, ScoringFailure::ScoringError(e.to_string()))
            }
        }
    }
}

fn build_scoring_prompt(
    jd: &JobDescriptionRecord,
    candidates: &[CandidateRecord],
) -> Result<String, serde_json::Error> {
    let jd_json = serde_json::to_string_pretty(&jd.fields)?;
    let candidates_json = serde_json::to_string_pretty(candidates)?;
    Ok(SCORING_PROMPT_TEMPLATE
        .replace("{jd_json}", &jd_json)
        .replace("{candidates_json}", &candidates_json))
}

/// Turns the model's JSON (a bare array, or an object with an `evaluations`
/// array) into per-candidate outcomes. Items without a usable `candidate_id`
/// cannot be attributed and are dropped here.
fn parse_evaluations(response: Value) -> Vec<ScoringOutcome> {
    let items = match response {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("evaluations") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Scoring response object has no 'evaluations' array");
                Vec::new()
            }
        },
        _ => Vec::new(),
    };

    items.into_iter().filter_map(parse_evaluation).collect()
}

fn parse_evaluation(mut item: Value) -> Option<ScoringOutcome> {
    let candidate_id = item
        .get("candidate_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s.trim()).ok());
    let Some(candidate_id) = candidate_id else {
        warn!("Dropping evaluation without a valid candidate_id");
        return None;
    };

    if let Some(message) = item.get("error").and_then(Value::as_str) {
        return Some(ScoringOutcome::Failed {
            candidate_id,
            error: ScoringFailure::ScoringError(message.to_string()),
        });
    }

    strip_nulls(&mut item);
    match serde_json::from_value::<CandidateEvaluation>(item) {
        Ok(evaluation) => Some(ScoringOutcome::Scored {
            candidate_id,
            evaluation,
        }),
        Err(e) => Some(ScoringOutcome::Failed {
            candidate_id,
            error: ScoringFailure::ScoringError(format!("Malformed evaluation: {e}")),
        }),
    }
}

/// Removes null-valued keys, recursively, so that `#[serde(default)]` fills them in.
pub(crate) fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
