//! Axum route handlers for resume and job description documents.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::ingest::extraction::extract_text;
use crate::matching::orchestrator::{MatchRun, MatchState, PairResult};
use crate::models::candidate::CandidateRecord;
use crate::models::job_description::JobDescriptionRecord;
use crate::scoring::weight_store::WeightStore;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// One file read out of a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// What the matching pipeline did for one uploaded document.
#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub state: MatchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub pairs: Vec<PairResult>,
}

impl MatchSummary {
    fn from_run(result: Result<MatchRun, AppError>, skipped_message: &str) -> Self {
        match result {
            Ok(run) => Self {
                message: (run.state == MatchState::Skipped).then(|| skipped_message.to_string()),
                state: run.state,
                pairs: run.pairs,
            },
            Err(e) => Self {
                state: MatchState::Failed,
                message: Some(e.to_string()),
                pairs: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileResult<T> {
    Parsed {
        filename: String,
        parsed_data: T,
        matching: MatchSummary,
    },
    Failed {
        filename: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct UploadResponse<T> {
    pub status: &'static str,
    pub uid: String,
    pub results: Vec<FileResult<T>>,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub status: &'static str,
    pub uid: String,
    pub candidates: Vec<CandidateRecord>,
}

#[derive(Debug, Serialize)]
pub struct JobDescriptionListResponse {
    pub status: &'static str,
    pub uid: String,
    pub job_descriptions: Vec<JobDescriptionRecord>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub resume_text: String,
    pub jd_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/candidate-resume
///
/// Multipart field `resumes`, one or more files. Each file is extracted,
/// stored and matched against the user's JDs on its own; a failure is
/// reported in that file's result and never stops the rest.
pub async fn handle_upload_resumes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse<CandidateRecord>>, AppError> {
    let files = read_files(&mut multipart, "resumes").await?;
    WeightStore::new(state.store.as_ref()).initialize(&user_id).await?;

    let orchestrator = state.orchestrator();
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        let filename = file.filename.clone();
        match ingest_resume(&state, &user_id, file).await {
            Ok(record) => {
                let run = orchestrator.on_candidate_added(&user_id, &record).await;
                results.push(FileResult::Parsed {
                    filename,
                    matching: MatchSummary::from_run(run, "No matching job descriptions found"),
                    parsed_data: record,
                });
            }
            Err(e) => {
                warn!("Resume {filename} failed: {e}");
                results.push(FileResult::Failed {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(Json(UploadResponse {
        status: "completed",
        uid: user_id,
        results,
    }))
}

/// GET /api/candidate-resumes
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CandidateListResponse>, AppError> {
    let candidates = state.store.candidates(&user_id).await?;
    Ok(Json(CandidateListResponse {
        status: "success",
        uid: user_id,
        candidates,
    }))
}

/// DELETE /api/candidate-resume/:candidate_id
///
/// Removes the stored file, the candidate and its ranked results.
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let candidate = state
        .store
        .candidate(&user_id, candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate not found".to_string()))?;

    delete_blob(&state, &candidate.resume_url).await?;
    state.store.delete_candidate(&user_id, candidate_id).await?;
    info!("Deleted candidate {candidate_id} for user {user_id}");

    Ok(Json(DeleteResponse {
        status: "success",
        message: format!("Candidate {candidate_id} and resume deleted successfully"),
    }))
}

/// POST /api/upload-jd
///
/// Multipart field `jd_files`. Same per-file isolation as resume upload;
/// each JD is matched against all of the user's candidates.
pub async fn handle_upload_job_descriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse<JobDescriptionRecord>>, AppError> {
    let files = read_files(&mut multipart, "jd_files").await?;
    WeightStore::new(state.store.as_ref()).initialize(&user_id).await?;

    let orchestrator = state.orchestrator();
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        let filename = file.filename.clone();
        match ingest_job_description(&state, &user_id, file).await {
            Ok(record) => {
                let run = orchestrator.on_job_description_added(&user_id, &record).await;
                results.push(FileResult::Parsed {
                    filename,
                    matching: MatchSummary::from_run(run, "No matching candidates found"),
                    parsed_data: record,
                });
            }
            Err(e) => {
                warn!("Job description {filename} failed: {e}");
                results.push(FileResult::Failed {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(Json(UploadResponse {
        status: "completed",
        uid: user_id,
        results,
    }))
}

/// GET /api/job-descriptions
pub async fn handle_list_job_descriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<JobDescriptionListResponse>, AppError> {
    let job_descriptions = state.store.job_descriptions(&user_id).await?;
    Ok(Json(JobDescriptionListResponse {
        status: "success",
        uid: user_id,
        job_descriptions,
    }))
}

/// DELETE /api/job-description/:jd_id
pub async fn handle_delete_job_description(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(jd_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let jd = state
        .store
        .job_description(&user_id, jd_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job Description not found".to_string()))?;

    delete_blob(&state, &jd.jd_url).await?;
    state.store.delete_job_description(&user_id, jd_id).await?;
    info!("Deleted JD {jd_id} for user {user_id}");

    Ok(Json(DeleteResponse {
        status: "success",
        message: format!("Job Description {jd_id} and associated file deleted successfully"),
    }))
}

/// POST /api/analyze-resume-jd
///
/// Multipart fields `resume` and `jd`. Returns both extracted texts; nothing is stored.
pub async fn handle_analyze(
    AuthUser(_user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut resume = None;
    let mut jd = None;

    while let Some((name, file)) = next_file(&mut multipart).await? {
        match name.as_str() {
            "resume" => resume = Some(file),
            "jd" => jd = Some(file),
            _ => {}
        }
    }

    let resume = resume.ok_or_else(|| AppError::Validation("Missing 'resume' file".to_string()))?;
    let jd = jd.ok_or_else(|| AppError::Validation("Missing 'jd' file".to_string()))?;

    let resume_text = extract_text(resume.bytes, &resume.filename, resume.content_type.as_deref()).await?;
    let jd_text = extract_text(jd.bytes, &jd.filename, jd.content_type.as_deref()).await?;

    Ok(Json(AnalyzeResponse {
        resume_text,
        jd_text,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Per-file pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Text extraction and field extraction run before the upload, so a file that
/// cannot be parsed leaves nothing behind in blob storage.
async fn ingest_resume(
    state: &AppState,
    user_id: &str,
    file: UploadedFile,
) -> Result<CandidateRecord, AppError> {
    let text = extract_text(file.bytes.clone(), &file.filename, file.content_type.as_deref()).await?;
    let profile = state.extractor.candidate_profile(&text).await?;

    let candidate_id = Uuid::new_v4();
    let resume_url = state
        .blobs
        .put(
            user_id,
            candidate_id,
            &file.filename,
            file.bytes.clone(),
            file.content_type_or_default(),
        )
        .await?;

    let record = CandidateRecord {
        candidate_id,
        user_id: user_id.to_string(),
        resume_url,
        profile,
        created_at: Utc::now(),
    };
    if let Err(e) = state.store.insert_candidate(&record).await {
        discard_blob(state, &record.resume_url).await;
        return Err(e);
    }
    info!("Stored candidate {candidate_id} from {}", file.filename);
    Ok(record)
}

async fn ingest_job_description(
    state: &AppState,
    user_id: &str,
    file: UploadedFile,
) -> Result<JobDescriptionRecord, AppError> {
    let text = extract_text(file.bytes.clone(), &file.filename, file.content_type.as_deref()).await?;
    let fields = state.extractor.job_description(&text).await?;

    let jd_id = Uuid::new_v4();
    let jd_url = state
        .blobs
        .put(
            user_id,
            jd_id,
            &file.filename,
            file.bytes.clone(),
            file.content_type_or_default(),
        )
        .await?;

    let record = JobDescriptionRecord {
        jd_id,
        user_id: user_id.to_string(),
        jd_url,
        fields,
        created_at: Utc::now(),
    };
    if let Err(e) = state.store.insert_job_description(&record).await {
        discard_blob(state, &record.jd_url).await;
        return Err(e);
    }
    info!("Stored JD {jd_id} from {}", file.filename);
    Ok(record)
}

/// Best-effort removal of an upload whose record could not be stored.
async fn discard_blob(state: &AppState, url: &str) {
    if let Err(e) = state.blobs.delete(url).await {
        warn!("Could not remove orphaned upload {url}: {e}");
    }
}

/// A blob that is already gone does not block deleting its record.
async fn delete_blob(state: &AppState, url: &str) -> Result<(), AppError> {
    if url.is_empty() {
        return Ok(());
    }
    match state.blobs.delete(url).await {
        Ok(()) => Ok(()),
        Err(AppError::NotFound(msg)) => {
            warn!("{msg}; deleting record anyway");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart helpers
// ────────────────────────────────────────────────────────────────────────────

async fn next_file(multipart: &mut Multipart) -> Result<Option<(String, UploadedFile)>, AppError> {
    let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    else {
        return Ok(None);
    };

    let name = field.name().unwrap_or_default().to_string();
    let filename = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(String::from);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{filename}': {e}")))?;

    Ok(Some((
        name,
        UploadedFile {
            filename,
            content_type,
            bytes,
        },
    )))
}

/// Collects every file sent under `field_name`. At least one is required.
async fn read_files(multipart: &mut Multipart, field_name: &str) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some((name, file)) = next_file(multipart).await? {
        if name == field_name {
            files.push(file);
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation(format!(
            "No files uploaded under '{field_name}'"
        )));
    }
    Ok(files)
}
