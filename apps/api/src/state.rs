use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::ingest::ResumeParser;
use crate::reconcile::IdGenerator;
use crate::review::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis-backed review sessions.
    pub sessions: SessionStore,
    pub s3: S3Client,
    /// Pluggable resume parser. Default: LlmResumeParser.
    pub parser: Arc<dyn ResumeParser>,
    pub ids: Arc<dyn IdGenerator>,
    pub config: Config,
}
