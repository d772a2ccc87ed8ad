use std::future::Future;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::ingest::parser::{assign_ids, ResumeParser, ResumeUpload};
use crate::ingest::storage::upload_resume;
use crate::models::portfolio::PortfolioDocument;
use crate::portfolio::store::load_current_or_default;
use crate::reconcile::IdGenerator;
use crate::review::session::{ReviewSession, SessionView};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/resume/import
///
/// Parses the uploaded resume, merges it into the stored portfolio and opens a
/// review session. Nothing is persisted to Postgres until the session commits.
pub async fn handle_import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;

    let draft = parse_then_store(state.parser.as_ref(), state.ids.as_ref(), &upload, || {
        upload_resume(
            &state.s3,
            &state.config.s3_bucket,
            &state.config.s3_endpoint,
            &upload,
        )
    })
    .await?;

    let existing = load_current_or_default(&state.db, &state.config.document_key).await?;
    let session = ReviewSession::open(&upload.file_name, existing, &draft, state.ids.as_ref());
    state.sessions.save(&session).await?;

    info!(
        "Opened review session {} for '{}'",
        session.id, upload.file_name
    );
    Ok((StatusCode::CREATED, Json(SessionView::from(&session))))
}

/// Parses the upload and only then hands it to `store`, so a resume that
/// fails to parse never reaches blob storage. The stored URL becomes the
/// draft's resume link.
async fn parse_then_store<S, Fut>(
    parser: &dyn ResumeParser,
    ids: &dyn IdGenerator,
    upload: &ResumeUpload,
    store: S,
) -> Result<PortfolioDocument, AppError>
where
    S: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, AppError>>,
{
    let mut draft = parser.parse(upload).await?;
    assign_ids(&mut draft, ids);
    draft.personal_info.resume = Some(store().await?);
    Ok(draft)
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<ResumeUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }
        if bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "uploaded file exceeds {max_bytes} bytes"
            )));
        }
        return Ok(ResumeUpload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}
