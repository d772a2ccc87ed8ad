use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, SectionId};
use crate::portfolio::canvas::{absorb_canvas, to_canvas, CanvasBlock};
use crate::portfolio::store::{
    delete_item, delete_section, load_current_or_default, save_document,
};
use crate::portfolio::validation::{check_unique_ids, validate_document};
use crate::state::AppState;

/// GET /api/v1/portfolio
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
) -> Result<Json<PortfolioDocument>, AppError> {
    let doc = load_current_or_default(&state.db, &state.config.document_key).await?;
    Ok(Json(doc))
}

/// PUT /api/v1/portfolio
pub async fn handle_put_portfolio(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<PortfolioDocument>, AppError> {
    let doc = validate_document(raw)?;
    save_document(&state.db, &state.config.document_key, &doc).await?;
    Ok(Json(doc))
}

/// GET /api/v1/portfolio/canvas
pub async fn handle_get_canvas(
    State(state): State<AppState>,
) -> Result<Json<Vec<CanvasBlock>>, AppError> {
    let doc = load_current_or_default(&state.db, &state.config.document_key).await?;
    Ok(Json(to_canvas(&doc)))
}

/// PUT /api/v1/portfolio/canvas
pub async fn handle_put_canvas(
    State(state): State<AppState>,
    Json(blocks): Json<Vec<CanvasBlock>>,
) -> Result<Json<Vec<CanvasBlock>>, AppError> {
    let key = &state.config.document_key;
    let current = load_current_or_default(&state.db, key).await?;
    let next = absorb_canvas(&current, &blocks)?;
    check_unique_ids(&next)?;
    save_document(&state.db, key, &next).await?;
    Ok(Json(to_canvas(&next)))
}

/// DELETE /api/v1/portfolio/sections/:section
pub async fn handle_delete_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<PortfolioDocument>, AppError> {
    let section: SectionId = section.parse()?;
    let doc = delete_section(&state.db, &state.config.document_key, section).await?;
    Ok(Json(doc))
}

/// DELETE /api/v1/portfolio/sections/:section/items/:item_id
pub async fn handle_delete_item(
    State(state): State<AppState>,
    Path((section, item_id)): Path<(String, String)>,
) -> Result<Json<PortfolioDocument>, AppError> {
    let section: SectionId = section.parse()?;
    let doc = delete_item(&state.db, &state.config.document_key, section, &item_id).await?;
    Ok(Json(doc))
}
