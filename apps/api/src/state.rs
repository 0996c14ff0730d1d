use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::ingest::blob::BlobStore;
use crate::ingest::parser::FieldExtractor;
use crate::matching::orchestrator::MatchOrchestrator;
use crate::matching::scorer::CandidateScorer;
use crate::store::MatchStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator is built once in `main` and shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MatchStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<dyn Authenticator>,
    pub extractor: Arc<dyn FieldExtractor>,
    pub scorer: Arc<dyn CandidateScorer>,
    pub config: Config,
}

impl AppState {
    pub fn orchestrator(&self) -> MatchOrchestrator<'_> {
        MatchOrchestrator::new(
            self.store.as_ref(),
            self.scorer.as_ref(),
            self.config.scoring_timeout,
            self.config.scoring_batch_size,
        )
    }
}
