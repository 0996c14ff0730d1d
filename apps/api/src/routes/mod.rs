pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::ingest::handlers as ingest;
use crate::matching::handlers as matching;
use crate::scoring::handlers as scoring;
use crate::state::AppState;

/// Multi-file uploads routinely exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route("/api/candidate-resume", post(ingest::handle_upload_resumes))
        .route("/api/candidate-resumes", get(ingest::handle_list_candidates))
        .route(
            "/api/candidate-resume/:candidate_id",
            delete(ingest::handle_delete_candidate),
        )
        // Job descriptions
        .route("/api/upload-jd", post(ingest::handle_upload_job_descriptions))
        .route("/api/job-descriptions", get(ingest::handle_list_job_descriptions))
        .route(
            "/api/job-description/:jd_id",
            delete(ingest::handle_delete_job_description),
        )
        .route("/api/analyze-resume-jd", post(ingest::handle_analyze))
        // Weights
        .route("/api/user-weights", get(scoring::handle_get_weights))
        .route("/api/user-weights/:role", put(scoring::handle_update_weights))
        // Ranked results
        .route("/api/top-score/:jd_id", get(matching::handle_get_top_scores))
        .route("/api/top-score/:jd_id/rescore", post(matching::handle_rescore))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use bytes::Bytes;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::Authenticator;
    use crate::config::Config;
    use crate::errors::AppError;
    use crate::ingest::blob::BlobStore;
    use crate::ingest::parser::FieldExtractor;
    use crate::matching::scorer::{CandidateEvaluation, CandidateScorer, ScoringOutcome};
    use crate::models::candidate::{CandidateProfile, CandidateRecord};
    use crate::models::job_description::{JobDescriptionFields, JobDescriptionRecord};
    use crate::store::memory::InMemoryStore;

    const TOKEN: &str = "valid-token";
    const USER: &str = "user-1";
    const BOUNDARY: &str = "XBOUNDARYX";

    struct StubAuth;

    #[async_trait]
    impl Authenticator for StubAuth {
        async fn verify(&self, token: &str) -> Result<String, AppError> {
            if token == TOKEN {
                Ok(USER.to_string())
            } else {
                Err(AppError::Unauthorized("Invalid Firebase token".to_string()))
            }
        }
    }

    #[derive(Default)]
    struct StubBlobs {
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for StubBlobs {
        async fn put(
            &self,
            user_id: &str,
            item_id: Uuid,
            filename: &str,
            _bytes: Bytes,
            _content_type: &str,
        ) -> Result<String, AppError> {
            Ok(format!("https://blobs.test/{user_id}/{item_id}/{filename}"))
        }

        async fn delete(&self, url: &str) -> Result<(), AppError> {
            self.deleted.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    /// Reads documents shaped `name\nskill, skill, ...`.
    struct StubExtractor;

    fn split_document(text: &str) -> (String, Vec<String>) {
        let mut lines = text.lines();
        let name = lines.next().unwrap_or_default().trim().to_string();
        let skills = lines
            .next()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        (name, skills)
    }

    #[async_trait]
    impl FieldExtractor for StubExtractor {
        async fn candidate_profile(&self, text: &str) -> Result<CandidateProfile, AppError> {
            let (name, technical_skills) = split_document(text);
            Ok(CandidateProfile {
                email: format!("{name}@example.com"),
                name,
                experience: 1.0,
                technical_skills,
                ..Default::default()
            })
        }

        async fn job_description(&self, text: &str) -> Result<JobDescriptionFields, AppError> {
            let (jobtitle, required_skills) = split_document(text);
            Ok(JobDescriptionFields {
                jobtitle,
                required_skills,
                ..Default::default()
            })
        }
    }

    struct StubScorer;

    #[async_trait]
    impl CandidateScorer for StubScorer {
        async fn score_batch(
            &self,
            _jd: &JobDescriptionRecord,
            candidates: &[CandidateRecord],
        ) -> Vec<ScoringOutcome> {
            candidates
                .iter()
                .map(|c| ScoringOutcome::Scored {
                    candidate_id: c.candidate_id,
                    evaluation: CandidateEvaluation {
                        profile_type: Some("fresher".to_string()),
                        skills_score: 50.0,
                        experience_score: 50.0,
                        education_score: 50.0,
                        certifications_score: 50.0,
                        ..Default::default()
                    },
                })
                .collect()
        }
    }

    struct Harness {
        app: Router,
        blobs: Arc<StubBlobs>,
    }

    fn harness() -> Harness {
        harness_with(InMemoryStore::new())
    }

    fn harness_with(store: InMemoryStore) -> Harness {
        let blobs = Arc::new(StubBlobs::default());
        let state = AppState {
            store: Arc::new(store),
            blobs: blobs.clone(),
            auth: Arc::new(StubAuth),
            extractor: Arc::new(StubExtractor),
            scorer: Arc::new(StubScorer),
            config: Config {
                database_url: String::new(),
                s3_bucket: "test".to_string(),
                s3_endpoint: "http://localhost:9000".to_string(),
                aws_access_key_id: String::new(),
                aws_secret_access_key: String::new(),
                anthropic_api_key: String::new(),
                firebase_api_key: String::new(),
                port: 0,
                rust_log: "info".to_string(),
                scoring_timeout: Duration::from_secs(5),
                scoring_batch_size: 10,
                allowed_origins: Vec::new(),
            },
        };
        Harness {
            app: build_router(state),
            blobs,
        }
    }

    fn multipart(files: &[(&str, &str, &str)]) -> Body {
        let mut body = String::new();
        for (field, filename, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn upload(uri: &str, files: &[(&str, &str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart(files))
            .unwrap()
    }

    fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let h = harness();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "topscore-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let h = harness();
        let request = Request::builder()
            .uri("/api/user-weights")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_invalid_token_is_401() {
        let h = harness();
        let request = Request::builder()
            .uri("/api/job-descriptions")
            .header(header::AUTHORIZATION, "Bearer forged")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_resume_then_jd_upload_produces_ranking() {
        let h = harness();

        let (status, body) = send(
            &h.app,
            upload(
                "/api/candidate-resume",
                &[
                    ("resumes", "ada.txt", "ada\nPython, Java"),
                    ("resumes", "matz.txt", "matz\nRuby"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][0]["matching"]["state"], "skipped");

        let (status, body) = send(
            &h.app,
            upload("/api/upload-jd", &[("jd_files", "backend.txt", "backend\nPython, AWS")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result = &body["results"][0];
        assert_eq!(result["matching"]["state"], "persisted");
        assert_eq!(result["matching"]["pairs"].as_array().unwrap().len(), 1);
        assert_eq!(result["matching"]["pairs"][0]["status"], "inserted");
        let jd_id = result["parsed_data"]["jd_id"].as_str().unwrap().to_string();

        let (status, body) = send(&h.app, authed("GET", &format!("/api/top-score/{jd_id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let ranked = body["top_score_candidates"].as_array().unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0]["name"], "ada");
        assert_eq!(ranked[0]["total_score"], 50.0);

        let (_, body) = send(&h.app, authed("GET", "/api/user-weights", None)).await;
        assert_eq!(body["weights"].as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_bad_file_does_not_abort_batch() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            upload(
                "/api/candidate-resume",
                &[
                    ("resumes", "cv.docx", "binary"),
                    ("resumes", "ada.txt", "ada\nPython"),
                ],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["filename"], "cv.docx");
        assert!(results[0]["error"].as_str().unwrap().contains("DOCX"));
        assert_eq!(results[1]["parsed_data"]["name"], "ada");

        let (_, body) = send(&h.app, authed("GET", "/api/candidate-resumes", None)).await;
        assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_uploaded_blob() {
        let h = harness_with(InMemoryStore::rejecting_inserts());

        let (status, body) = send(
            &h.app,
            upload("/api/candidate-resume", &[("resumes", "ada.txt", "ada\nPython")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["results"][0]["error"].is_string());

        let (_, body) = send(
            &h.app,
            upload("/api/upload-jd", &[("jd_files", "backend.txt", "backend\nPython")]),
        )
        .await;
        assert!(body["results"][0]["error"].is_string());

        let deleted = h.blobs.deleted.lock().unwrap().clone();
        assert_eq!(deleted.len(), 2);
        assert!(deleted[0].ends_with("/ada.txt"));
        assert!(deleted[1].ends_with("/backend.txt"));
    }

    #[tokio::test]
    async fn test_upload_without_files_is_400() {
        let h = harness();
        let (status, body) = send(&h.app, upload("/api/upload-jd", &[("other", "a.txt", "x")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_weight_update_validation() {
        let h = harness();
        // Seed defaults through an upload.
        send(&h.app, upload("/api/upload-jd", &[("jd_files", "jd.txt", "jd\nGo")])).await;

        let bad_sum = json!({"weights": {"skills": 40, "experience": 40, "education": 10, "certifications": 9}});
        let (status, _) = send(&h.app, authed("PUT", "/api/user-weights/fresher", Some(bad_sum))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&h.app, authed("GET", "/api/user-weights", None)).await;
        assert_eq!(body["weights"]["fresher"]["skills"], 40);
        assert_eq!(body["weights"]["fresher"]["experience"], 10);

        let good = json!({"weights": {"skills": 25, "experience": 25, "education": 25, "certifications": 25}});
        let (status, body) = send(&h.app, authed("PUT", "/api/user-weights/fresher", Some(good.clone()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Updated weights for role 'fresher'");

        let (status, _) = send(&h.app, authed("PUT", "/api/user-weights/intern", Some(good))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_weight_update_before_seeding_is_404() {
        let h = harness();
        let good = json!({"weights": {"skills": 25, "experience": 25, "education": 25, "certifications": 25}});
        let (status, _) = send(&h.app, authed("PUT", "/api/user-weights/fresher", Some(good))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_top_score_for_unscored_jd_is_404() {
        let h = harness();
        let uri = format!("/api/top-score/{}", Uuid::new_v4());
        let (status, body) = send(&h.app, authed("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "No top score candidates found.");
    }

    #[tokio::test]
    async fn test_rescore_applies_new_weights() {
        let h = harness();
        send(&h.app, upload("/api/candidate-resume", &[("resumes", "ada.txt", "ada\nPython")])).await;
        let (_, body) = send(&h.app, upload("/api/upload-jd", &[("jd_files", "jd.txt", "jd\nPython")])).await;
        let jd_id = body["results"][0]["parsed_data"]["jd_id"].as_str().unwrap().to_string();

        let weights = json!({"weights": {"skills": 100}});
        let (status, _) = send(&h.app, authed("PUT", "/api/user-weights/fresher", Some(weights))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&h.app, authed("POST", &format!("/api/top-score/{jd_id}/rescore"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let ranked = &body["top_score_candidates"][0];
        assert_eq!(ranked["total_score"], 50.0);
        assert_eq!(ranked["breakdown"]["skills"]["weight"], 1.0);
        assert_eq!(ranked["breakdown"]["experience"]["weight"], 0.0);
    }

    #[tokio::test]
    async fn test_rescore_unknown_jd_is_404() {
        let h = harness();
        let uri = format!("/api/top-score/{}/rescore", Uuid::new_v4());
        let (status, _) = send(&h.app, authed("POST", &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleting_candidate_removes_blob_and_rankings() {
        let h = harness();
        let (_, body) = send(&h.app, upload("/api/upload-jd", &[("jd_files", "jd.txt", "jd\nPython")])).await;
        let jd_id = body["results"][0]["parsed_data"]["jd_id"].as_str().unwrap().to_string();
        let (_, body) = send(&h.app, upload("/api/candidate-resume", &[("resumes", "ada.txt", "ada\nPython")])).await;
        let candidate = &body["results"][0]["parsed_data"];
        let candidate_id = candidate["candidate_id"].as_str().unwrap().to_string();
        let resume_url = candidate["resume_url"].as_str().unwrap().to_string();

        let (status, _) = send(&h.app, authed("GET", &format!("/api/top-score/{jd_id}"), None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &h.app,
            authed("DELETE", &format!("/api/candidate-resume/{candidate_id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(*h.blobs.deleted.lock().unwrap(), vec![resume_url]);

        let (status, _) = send(&h.app, authed("GET", &format!("/api/top-score/{jd_id}"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &h.app,
            authed("DELETE", &format!("/api/candidate-resume/{candidate_id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analyze_returns_both_texts() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            upload(
                "/api/analyze-resume-jd",
                &[("resume", "cv.txt", "Rust engineer"), ("jd", "jd.txt", "Hiring Rust")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume_text"], "Rust engineer");
        assert_eq!(body["jd_text"], "Hiring Rust");
    }
}
