//! Request authentication: resolves a bearer token to an opaque user id.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::state::AppState;

const FIREBASE_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Carried in `AppState` as `Arc<dyn Authenticator>`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the user id for a valid token, or `AppError::Unauthorized`.
    async fn verify(&self, token: &str) -> Result<String, AppError>;
}

/// Verifies Firebase ID tokens through the Identity Toolkit REST API.
pub struct FirebaseAuthenticator {
    client: Client,
    api_key: String,
}

impl FirebaseAuthenticator {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[async_trait]
impl Authenticator for FirebaseAuthenticator {
    async fn verify(&self, token: &str) -> Result<String, AppError> {
        let response = self
            .client
            .post(FIREBASE_LOOKUP_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token lookup failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            debug!("Token rejected by identity provider: {body}");
            let reason = if body.contains("TOKEN_EXPIRED") {
                "Expired Firebase token"
            } else {
                "Invalid Firebase token"
            };
            return Err(AppError::Unauthorized(reason.to_string()));
        }
        if !status.is_success() {
            warn!("Identity provider returned {status}");
            return Err(AppError::Internal(anyhow::anyhow!(
                "Identity provider returned {status}"
            )));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Malformed lookup response: {e}")))?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|u| u.local_id)
            .ok_or_else(|| AppError::Unauthorized("Invalid Firebase token".to_string()))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid Authorization header".to_string()))
}

/// The authenticated caller. Add as a handler argument to require auth.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = bearer_token(header)?;
        let user_id = state.auth.verify(token).await?;
        Ok(AuthUser(user_id))
    }
}
