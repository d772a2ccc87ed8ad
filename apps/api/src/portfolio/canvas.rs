//! Editor canvas adapter.
//!
//! The visual editor works on an ordered list of `{sectionId, props}` blocks.
//! Block order is `section_order`; props carry the title override, the hidden
//! flag and the section's own content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, Record, SectionContent, SectionId, SectionRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasBlock {
    pub section_id: String,
    pub props: CanvasProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub items: Value,
}

/// Blocks for every known section in `section_order`. Unknown ids are skipped.
pub fn to_canvas(doc: &PortfolioDocument) -> Vec<CanvasBlock> {
    doc.section_order
        .iter()
        .filter_map(|key| {
            let id: SectionId = key.parse().ok()?;
            Some(CanvasBlock {
                section_id: key.clone(),
                props: CanvasProps {
                    title: doc.section_titles.get(key).cloned(),
                    hidden: !doc.section_visibility.get(key).copied().unwrap_or(true),
                    items: doc.section_content(id).to_value(),
                },
            })
        })
        .collect()
}

/// Folds canvas blocks back into `doc`.
///
/// Block order becomes `section_order`. A block's title, hidden flag and
/// items replace the section's; sections without a block keep their content
/// but drop out of the order.
pub fn absorb_canvas(
    doc: &PortfolioDocument,
    blocks: &[CanvasBlock],
) -> Result<PortfolioDocument, AppError> {
    let mut next = doc.clone();
    next.section_order.clear();

    for block in blocks {
        let id: SectionId = block.section_id.parse()?;
        let key = id.key().to_string();
        if next.section_order.contains(&key) {
            return Err(AppError::Validation(format!(
                "section '{key}' appears more than once"
            )));
        }

        let content = match doc.section(id) {
            SectionRef::Strings(_) => SectionContent::Strings(decode_items(id, &block.props.items)?),
            SectionRef::Records(_) => {
                SectionContent::Records(decode_items::<Record>(id, &block.props.items)?)
            }
        };
        next.set_section(id, content);

        match block.props.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => {
                next.section_titles.insert(key.clone(), title.to_string());
            }
            _ => {
                next.section_titles.remove(&key);
            }
        }
        if block.props.hidden {
            next.section_visibility.insert(key.clone(), false);
        } else {
            next.section_visibility.remove(&key);
        }
        next.section_order.push(key);
    }

    Ok(next)
}

fn decode_items<T: serde::de::DeserializeOwned>(
    id: SectionId,
    items: &Value,
) -> Result<Vec<T>, AppError> {
    if items.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(items.clone())
        .map_err(|e| AppError::Validation(format!("invalid items for section '{id}': {e}")))
}
