use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, PortfolioRow, SectionId};
use crate::portfolio::edit::{remove_item, remove_section};

pub async fn load_document(pool: &PgPool, key: &str) -> Result<Option<PortfolioDocument>, AppError> {
    let row: Option<PortfolioRow> =
        sqlx::query_as("SELECT id, data, updated_at FROM portfolio_documents WHERE id = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|row| {
        debug!("Loaded portfolio document '{}' (updated {})", row.id, row.updated_at);
        row.data.0
    }))
}

/// The stored document, or an empty placeholder when nothing was saved yet.
pub async fn load_current_or_default(
    pool: &PgPool,
    key: &str,
) -> Result<PortfolioDocument, AppError> {
    Ok(load_document(pool, key)
        .await?
        .unwrap_or_else(PortfolioDocument::placeholder))
}

/// Upserts the whole document.
pub async fn save_document(
    pool: &PgPool,
    key: &str,
    doc: &PortfolioDocument,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO portfolio_documents (id, data, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (id) DO UPDATE
            SET data = EXCLUDED.data, updated_at = now()
        "#,
    )
    .bind(key)
    .bind(Json(doc))
    .execute(pool)
    .await?;

    info!("Saved portfolio document '{key}'");
    Ok(())
}

/// Deletes one item and persists the result.
pub async fn delete_item(
    pool: &PgPool,
    key: &str,
    section: SectionId,
    item_id: &str,
) -> Result<PortfolioDocument, AppError> {
    let mut doc = load_document(pool, key)
        .await?
        .ok_or_else(|| AppError::NotFound("no portfolio has been saved yet".to_string()))?;
    remove_item(&mut doc, section, item_id)?;
    save_document(pool, key, &doc).await?;
    info!("Deleted item '{item_id}' from {section}");
    Ok(doc)
}

/// Empties a section, drops it from the display settings and persists.
pub async fn delete_section(
    pool: &PgPool,
    key: &str,
    section: SectionId,
) -> Result<PortfolioDocument, AppError> {
    let mut doc = load_document(pool, key)
        .await?
        .ok_or_else(|| AppError::NotFound("no portfolio has been saved yet".to_string()))?;
    remove_section(&mut doc, section);
    save_document(pool, key, &doc).await?;
    info!("Deleted section {section}");
    Ok(doc)
}
