use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, Record, SectionId};
use crate::portfolio::store::{load_current_or_default, save_document};
use crate::portfolio::validation::validate_document;
use crate::reconcile::changes::summarize_changes;
use crate::reconcile::resolver::{conflict_groups, pick_fields, resolve, FieldChoice};
use crate::reconcile::tree::parse_path;
use crate::reconcile::Node;
use crate::review::session::{ReviewSession, SessionView};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PathRequest {
    pub path: String,
}

#[derive(Deserialize)]
pub struct EditRequest {
    pub path: String,
    pub value: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub item_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub section: String,
    pub group_id: String,
}

/// Either a finished record, or per-field picks between the two versions of
/// the group being merged.
#[derive(Deserialize)]
pub struct ResolveRequest {
    pub section: String,
    #[serde(default)]
    pub record: Option<Record>,
    #[serde(default)]
    pub choices: Option<BTreeMap<String, FieldChoice>>,
}

#[derive(Serialize)]
pub struct ChangesResponse {
    pub changes: Vec<String>,
    pub document: PortfolioDocument,
}

/// Loads a session, applies `f`, and writes the session back.
async fn update_session<F>(
    state: &AppState,
    session_id: Uuid,
    f: F,
) -> Result<Json<SessionView>, AppError>
where
    F: FnOnce(&mut ReviewSession, &AppState) -> Result<(), AppError>,
{
    let mut session = state.sessions.load(session_id).await?;
    f(&mut session, state)?;
    state.sessions.save(&session).await?;
    Ok(Json(SessionView::from(&session)))
}

/// GET /api/v1/review/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.load(session_id).await?;
    Ok(Json(SessionView::from(&session)))
}

/// POST /api/v1/review/:session_id/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<PathRequest>,
) -> Result<Json<SessionView>, AppError> {
    update_session(&state, session_id, |session, _| {
        session.state = session.state.toggle(&parse_path(&req.path))?;
        Ok(())
    })
    .await
}

/// POST /api/v1/review/:session_id/edit
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<EditRequest>,
) -> Result<Json<SessionView>, AppError> {
    update_session(&state, session_id, |session, _| {
        let path = parse_path(&req.path);
        if session.state.get(&path).is_none() {
            return Err(AppError::Validation(format!("no such path '{}'", req.path)));
        }
        session.state = session.state.set(&path, Node::from_value(req.value))?;
        Ok(())
    })
    .await
}

/// POST /api/v1/review/:session_id/select
pub async fn handle_select(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<SessionView>, AppError> {
    update_session(&state, session_id, |session, _| {
        session.selection.select(&req.item_id)?;
        Ok(())
    })
    .await
}

/// POST /api/v1/review/:session_id/deselect
pub async fn handle_deselect(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<SessionView>, AppError> {
    update_session(&state, session_id, |session, _| {
        session.selection.deselect(&req.item_id);
        Ok(())
    })
    .await
}

/// POST /api/v1/review/:session_id/merge
pub async fn handle_begin_merge(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<SessionView>, AppError> {
    let section: SectionId = req.section.parse()?;
    update_session(&state, session_id, |session, _| {
        let known = conflict_groups(&session.state, section)
            .iter()
            .any(|pair| pair.group_id == req.group_id);
        if !known {
            return Err(AppError::NotFound(format!(
                "conflict group '{}' not found in '{section}'",
                req.group_id
            )));
        }
        session.selection.begin_merge(&req.group_id)?;
        Ok(())
    })
    .await
}

/// POST /api/v1/review/:session_id/resolve
pub async fn handle_resolve(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<SessionView>, AppError> {
    let section: SectionId = req.section.parse()?;
    update_session(&state, session_id, |session, state| {
        let merged = match (req.record, req.choices) {
            (Some(record), None) => record,
            (None, Some(choices)) => {
                let group = session.selection.target_group().ok_or_else(|| {
                    AppError::Conflict("start a merge before choosing fields".to_string())
                })?;
                let pair = conflict_groups(&session.state, section)
                    .into_iter()
                    .find(|pair| pair.group_id == group)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("conflict group '{group}' not found"))
                    })?;
                pick_fields(&pair.current, &pair.incoming, &choices)
            }
            _ => {
                return Err(AppError::Validation(
                    "provide exactly one of 'record' or 'choices'".to_string(),
                ))
            }
        };
        session.state = resolve(
            &session.state,
            section,
            &mut session.selection,
            merged,
            state.ids.as_ref(),
        )?;
        Ok(())
    })
    .await
}

/// GET /api/v1/review/:session_id/changes
pub async fn handle_changes(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ChangesResponse>, AppError> {
    let session = state.sessions.load(session_id).await?;
    let stored = load_current_or_default(&state.db, &state.config.document_key).await?;
    let document = session.projected();
    Ok(Json(ChangesResponse {
        changes: summarize_changes(&stored, &document),
        document,
    }))
}

/// POST /api/v1/review/:session_id/commit
///
/// Refused with 409 while conflict pairs are pending. A failed write leaves
/// the session in place so the commit can be retried.
pub async fn handle_commit(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ChangesResponse>, AppError> {
    let key = &state.config.document_key;
    let session = state.sessions.load(session_id).await?;
    let stored = load_current_or_default(&state.db, key).await?;

    let raw = serde_json::to_value(session.commit_document()?)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("projection serialization failed: {e}")))?;
    let document = validate_document(raw)?;
    let changes = summarize_changes(&stored, &document);

    save_document(&state.db, key, &document).await?;
    state.sessions.delete(session_id).await?;
    info!(
        "Committed review session {session_id} ({} changed sections)",
        changes.len()
    );
    Ok(Json(ChangesResponse { changes, document }))
}

/// DELETE /api/v1/review/:session_id
pub async fn handle_discard(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.delete(session_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "review session {session_id} not found"
        )))
    }
}
